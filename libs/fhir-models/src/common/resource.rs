//! Resource trait and the metadata shared by every resource
//!
//! Each concrete model holds a [`ResourceBase`] flattened into its JSON
//! object, and implements [`Resource`] so decoded values can be handled
//! without knowing their concrete type up front.

use super::complex::{Extension, Meta, Narrative};
use super::error::Result;
use super::temporal::FhirInstant;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Fields common to all resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBase {
    /// Discriminator, matches the registered type name
    pub resource_type: String,

    /// Logical id, assigned by the server on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Contained resources, kept untyped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contained: Option<Vec<Value>>,
}

impl ResourceBase {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }
}

/// A decoded FHIR resource of any registered type
pub trait Resource: fmt::Debug + Send + Sync + 'static {
    fn base(&self) -> &ResourceBase;

    fn base_mut(&mut self) -> &mut ResourceBase;

    fn to_value(&self) -> Result<Value>;

    fn to_json(&self) -> Result<Vec<u8>>;

    fn clone_box(&self) -> Box<dyn Resource>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn resource_type(&self) -> &str {
        &self.base().resource_type
    }

    fn id(&self) -> Option<&str> {
        self.base().id.as_deref()
    }

    fn version_id(&self) -> Option<&str> {
        self.base().meta.as_ref()?.version_id.as_deref()
    }

    fn last_updated(&self) -> Option<FhirInstant> {
        self.base().meta.as_ref()?.last_updated
    }
}

/// A resource model with a fixed type name, usable for registration and typed reads
pub trait TypedResource: Resource + Serialize + DeserializeOwned + Clone + Default {
    const TYPE_NAME: &'static str;
}

impl dyn Resource {
    pub fn is<T: Resource>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Resource>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Implement [`Resource`] and [`TypedResource`] for a model with a `base: ResourceBase` field.
#[macro_export]
macro_rules! impl_resource {
    ($ty:ty, $name:literal) => {
        impl $crate::common::resource::Resource for $ty {
            fn base(&self) -> &$crate::common::resource::ResourceBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::common::resource::ResourceBase {
                &mut self.base
            }

            fn to_value(&self) -> $crate::common::error::Result<$crate::__private::serde_json::Value> {
                Ok($crate::__private::serde_json::to_value(self)?)
            }

            fn to_json(&self) -> $crate::common::error::Result<Vec<u8>> {
                Ok($crate::__private::serde_json::to_vec(self)?)
            }

            fn clone_box(&self) -> Box<dyn $crate::common::resource::Resource> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }
        }

        impl $crate::common::resource::TypedResource for $ty {
            const TYPE_NAME: &'static str = $name;
        }
    };
}
