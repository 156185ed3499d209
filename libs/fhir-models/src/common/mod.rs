//! Version-agnostic FHIR models
//!
//! The fields modelled here are shared by FHIR R4 and R5.

pub mod bundle;
pub mod capability;
pub mod complex;
pub mod error;
pub mod mapper;
pub mod outcome;
pub mod patient;
pub mod resource;
pub mod temporal;

// Re-export commonly used types
pub use bundle::*;
pub use capability::*;
pub use complex::*;
pub use error::{Error, Result};
pub use mapper::{peek_resource_type, ResourceFactory, ResourceMapper};
pub use outcome::*;
pub use patient::*;
pub use resource::{Resource, ResourceBase, TypedResource};
pub use temporal::*;
