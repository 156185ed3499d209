//! FHIR data models
//!
//! Strongly-typed Rust structures for FHIR resources, plus a
//! [`ResourceMapper`] that decodes JSON into the right model by reading the
//! `resourceType` discriminator first.
//!
//! # Design
//!
//! - **Typed core**: fields shared across R4 and R5 are modelled directly
//! - **Lossless**: content without a typed field is kept in `additional`
//! - **Open registry**: further resource types are added with
//!   [`ResourceMapper::register`] and the [`impl_resource!`] macro
//! - **Temporal grammars**: dates and instants are parsed by the grammar their
//!   field declares, never by sniffing the string
//!
//! # Example
//!
//! ```rust
//! use ferrum_models::{AdministrativeGender, FhirDate, Patient, Resource, ResourceMapper};
//!
//! let mapper = ResourceMapper::new();
//! let resource = mapper
//!     .decode(br#"{"resourceType": "Patient", "id": "123", "gender": "male", "birthDate": "2000-01-01"}"#)
//!     .unwrap();
//!
//! assert_eq!(resource.resource_type(), "Patient");
//! let patient = resource.downcast_ref::<Patient>().unwrap();
//! assert_eq!(patient.gender, Some(AdministrativeGender::Male));
//! assert_eq!(patient.birth_date, FhirDate::from_ymd(2000, 1, 1));
//! ```

pub mod common;

// Re-export commonly used types
pub use common::*;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
