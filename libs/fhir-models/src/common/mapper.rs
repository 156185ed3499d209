//! Discriminator-based resource decoding
//!
//! A [`ResourceMapper`] owns a registry from `resourceType` strings to
//! decoders. Decoding first reads only the discriminator, picks the decoder
//! registered for it, then performs the full typed decode.
//!
//! The registry is filled at construction time and by explicit `register*`
//! calls, which need `&mut self`. Share a populated mapper behind an `Arc`
//! once concurrent use begins.

use super::bundle::{Bundle, BundleEntry};
use super::capability::CapabilityStatement;
use super::error::{Error, Result};
use super::outcome::OperationOutcome;
use super::patient::Patient;
use super::resource::{Resource, TypedResource};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoder for one resource type: JSON bytes to a boxed resource
pub type ResourceFactory =
    dyn Fn(&[u8]) -> serde_json::Result<Box<dyn Resource>> + Send + Sync + 'static;

#[derive(Deserialize)]
struct Discriminator<'a> {
    #[serde(rename = "resourceType", borrow)]
    resource_type: Cow<'a, str>,
}

/// Read only the `resourceType` of a JSON payload.
///
/// Fails with [`Error::MalformedPayload`] if the payload is not a JSON object
/// or the discriminator is absent or not a string.
pub fn peek_resource_type(data: &[u8]) -> Result<String> {
    let discriminator: Discriminator<'_> =
        serde_json::from_slice(data).map_err(Error::MalformedPayload)?;
    Ok(discriminator.resource_type.into_owned())
}

/// Registry-backed decoder and encoder for FHIR resources
#[derive(Clone)]
pub struct ResourceMapper {
    registry: HashMap<String, Arc<ResourceFactory>>,
}

impl ResourceMapper {
    /// Mapper with the built-in resource types registered
    pub fn new() -> Self {
        let mut mapper = Self::empty();
        mapper
            .register::<Patient>()
            .register::<Bundle>()
            .register::<OperationOutcome>()
            .register::<CapabilityStatement>();
        mapper
    }

    /// Mapper with nothing registered
    pub fn empty() -> Self {
        Self {
            registry: HashMap::new(),
        }
    }

    /// Register `T` under its own type name
    pub fn register<T: TypedResource>(&mut self) -> &mut Self {
        self.register_as::<T>(T::TYPE_NAME)
    }

    /// Register `T` under an explicit type name
    pub fn register_as<T: TypedResource>(&mut self, resource_type: impl Into<String>) -> &mut Self {
        self.register_factory(resource_type, |data| {
            let resource: T = serde_json::from_slice(data)?;
            Ok(Box::new(resource) as Box<dyn Resource>)
        })
    }

    /// Register a custom decoder. The last registration for a name wins.
    pub fn register_factory<F>(&mut self, resource_type: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&[u8]) -> serde_json::Result<Box<dyn Resource>> + Send + Sync + 'static,
    {
        let resource_type = resource_type.into();
        let replaced = self
            .registry
            .insert(resource_type.clone(), Arc::new(factory))
            .is_some();
        tracing::debug!(resource_type = %resource_type, replaced, "Registered resource type");
        self
    }

    pub fn is_registered(&self, resource_type: &str) -> bool {
        self.registry.contains_key(resource_type)
    }

    /// Registered type names, sorted
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Decode a payload into the resource type its discriminator names
    pub fn decode(&self, data: &[u8]) -> Result<Box<dyn Resource>> {
        let resource_type = peek_resource_type(data)?;
        let Some(factory) = self.registry.get(&resource_type) else {
            return Err(Error::UnsupportedType(resource_type));
        };
        factory(data).map_err(|source| Error::FieldDecode {
            resource_type,
            source,
        })
    }

    pub fn decode_str(&self, data: &str) -> Result<Box<dyn Resource>> {
        self.decode(data.as_bytes())
    }

    /// Decode and require the result to be a `T`
    pub fn decode_as<T: TypedResource>(&self, data: &[u8]) -> Result<T> {
        let resource = self.decode(data)?;
        let actual = resource.resource_type().to_string();
        resource
            .downcast::<T>()
            .map(|resource| *resource)
            .ok_or_else(|| Error::UnexpectedResourceType {
                expected: T::TYPE_NAME.to_string(),
                actual,
            })
    }

    /// Encode any resource to JSON bytes
    pub fn encode(&self, resource: &dyn Resource) -> Result<Vec<u8>> {
        resource.to_json()
    }

    /// Decode a Bundle envelope, leaving entry payloads undecoded.
    ///
    /// Works whether or not `Bundle` is registered with this mapper.
    pub fn decode_bundle(&self, data: &[u8]) -> Result<Bundle> {
        let resource_type = peek_resource_type(data)?;
        if resource_type != "Bundle" {
            return Err(Error::UnexpectedResourceType {
                expected: "Bundle".to_string(),
                actual: resource_type,
            });
        }
        Bundle::from_slice(data).map_err(|err| match err {
            Error::Serialization(source) => Error::FieldDecode {
                resource_type,
                source,
            },
            other => other,
        })
    }

    /// Decode one bundle entry's payload.
    ///
    /// An absent payload (e.g. a deleted-resource history entry) yields
    /// `Ok(None)`. Every call decodes afresh.
    pub fn resolve_entry(&self, entry: &BundleEntry) -> Result<Option<Box<dyn Resource>>> {
        match entry.resource_json() {
            Some(raw) => self.decode(raw.as_bytes()).map(Some),
            None => Ok(None),
        }
    }

    /// Decode every present entry payload, in order.
    ///
    /// Entries without a payload are skipped; the first failing entry aborts
    /// with its index.
    pub fn resolve_entries(&self, bundle: &Bundle) -> Result<Vec<Box<dyn Resource>>> {
        let mut resources = Vec::with_capacity(bundle.entry_count());
        for (index, entry) in bundle.entries().iter().enumerate() {
            match self.resolve_entry(entry) {
                Ok(Some(resource)) => resources.push(resource),
                Ok(None) => continue,
                Err(err) => {
                    return Err(Error::BundleEntry {
                        index,
                        source: Box::new(err),
                    })
                }
            }
        }
        Ok(resources)
    }
}

impl Default for ResourceMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMapper")
            .field("registered", &self.registered_types())
            .finish()
    }
}
