//! FHIR REST client
//!
//! Async client for FHIR R4/R5 servers. Response bodies are decoded through a
//! [`ResourceMapper`](ferrum_models::ResourceMapper), so reads return typed
//! resources and searches return Bundles whose entries resolve on demand.
//!
//! # Examples
//!
//! ## Read a patient
//!
//! ```rust,no_run
//! use ferrum_client::FhirClient;
//! use ferrum_models::Patient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FhirClient::new("https://hapi.fhir.org/baseR4")?;
//! let patient: Patient = client.read_as("example").await?;
//! println!("{:?}", patient.primary_name());
//! # Ok(())
//! # }
//! ```
//!
//! ## Search and resolve entries
//!
//! ```rust,no_run
//! use ferrum_client::{FhirClient, SearchParams};
//! use ferrum_models::Resource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FhirClient::new("https://hapi.fhir.org/baseR4")?;
//! let params = SearchParams::new().add("family", "Doe").count(10);
//! let bundle = client.search("Patient", &params).await?;
//! for resource in client.mapper().resolve_entries(&bundle)? {
//!     println!("{}/{}", resource.resource_type(), resource.id().unwrap_or("-"));
//! }
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod operations;
pub mod search;
pub mod version;

pub use crate::config::ClientConfig;
pub use error::{Error, Result};
pub use operations::{classify_response, FhirClient, FhirClientBuilder, FHIR_JSON, JSON_PATCH};
pub use search::{Comparator, Modifier, SearchParams, SummaryMode, TotalMode};
pub use version::{FhirVersion, VersionInfo};
