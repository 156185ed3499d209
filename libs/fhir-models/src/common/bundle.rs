//! FHIR Bundle model
//!
//! The envelope (type, total, links, entries) is decoded eagerly. Each entry's
//! resource is kept as the raw JSON span it arrived as, since a bundle may mix
//! resource types the caller has no model for. Entries are resolved to typed
//! resources on demand through [`ResourceMapper`](super::mapper::ResourceMapper).

use super::error::Result;
use super::mapper::{self, ResourceMapper};
use super::resource::{Resource, ResourceBase};
use super::temporal::FhirInstant;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::HashMap;

/// FHIR Bundle resource
///
/// A container for a collection of resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(flatten)]
    pub base: ResourceBase,

    /// Indicates the purpose of this bundle - how it was intended to be used
    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    /// When the bundle was assembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<FhirInstant>,

    /// If search, the total number of matches (not necessarily the number of entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    /// Links related to this Bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<BundleLink>>,

    /// Entry in the bundle - will have a resource or information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<BundleEntry>>,

    /// Digital Signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Value>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

crate::impl_resource!(Bundle, "Bundle");

/// Type of Bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    /// Document Bundle - A set of resources composing a single coherent document
    Document,
    /// Message Bundle - A message (application/response or application/request)
    Message,
    /// Transaction Bundle - A transaction - intended to be processed atomically
    Transaction,
    /// Transaction Response Bundle - Response to a transaction
    TransactionResponse,
    /// Batch Bundle - A set of resources collected for a specific purpose
    Batch,
    /// Batch Response Bundle - Response to a batch
    BatchResponse,
    /// History Bundle - A list of resources with history
    History,
    /// Search Results Bundle - Results of a search operation
    Searchset,
    /// Collection Bundle - A set of resources collected for a specific purpose
    Collection,
}

/// Links related to this Bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleLink {
    /// See http://www.iana.org/assignments/link-relations/link-relations.xhtml#link-relations-1
    pub relation: String,

    /// Reference details for the link
    pub url: String,
}

/// Entry in the bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Full URL for the entry (relative to the base URL, or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    /// The resource payload, undecoded. Absent for deleted-resource history entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Box<RawValue>>,

    /// Search-related information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<BundleEntrySearch>,

    /// Additional execution information (transaction/batch/history)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,

    /// Results of execution (transaction/batch/history)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleEntryResponse>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

/// Request details for a Bundle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntryRequest {
    /// HTTP verb for the entry (GET | POST | PUT | PATCH | DELETE)
    pub method: String,

    /// URL for HTTP equivalent of this entry
    pub url: String,

    /// For managing cache validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_none_match: Option<String>,

    /// For managing cache validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_modified_since: Option<FhirInstant>,

    /// For managing update contention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_match: Option<String>,

    /// For conditional creates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_none_exist: Option<String>,
}

/// Response details for a Bundle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntryResponse {
    /// Status response code (text)
    pub status: String,

    /// The location (if the operation returns a location)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// The Etag for the resource (if relevant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Server's date time modified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<FhirInstant>,

    /// OperationOutcome with hints and warnings (for batch/transaction)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Value>,
}

/// Search-related information for a Bundle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntrySearch {
    /// Why this entry is in the result set - whether it's included as a match or because of an _include requirement
    #[serde(rename = "mode", skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<BundleEntrySearchMode>,

    /// Search ranking (between 0 and 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Why an entry is in the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleEntrySearchMode {
    /// This resource matched the search specification
    Match,
    /// This resource is returned because it is referred to from another resource in the search set
    Include,
    /// An OperationOutcome providing additional information about the processing of a search entry
    Outcome,
}

impl Bundle {
    /// Create a new Bundle with minimal required fields
    pub fn new(bundle_type: BundleType) -> Self {
        Self {
            base: ResourceBase::new("Bundle"),
            bundle_type,
            timestamp: None,
            total: None,
            link: None,
            entry: None,
            signature: None,
            additional: HashMap::new(),
        }
    }

    /// Parse the envelope from JSON bytes; entry resources stay undecoded
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Check if this is a transaction bundle
    pub fn is_transaction(&self) -> bool {
        matches!(self.bundle_type, BundleType::Transaction)
    }

    /// Check if this is a batch bundle
    pub fn is_batch(&self) -> bool {
        matches!(self.bundle_type, BundleType::Batch)
    }

    /// Check if this is a search result bundle
    pub fn is_searchset(&self) -> bool {
        matches!(self.bundle_type, BundleType::Searchset)
    }

    /// Get the number of entries in the bundle
    pub fn entry_count(&self) -> usize {
        self.entry.as_ref().map(|e| e.len()).unwrap_or(0)
    }

    /// Get entries as a slice
    pub fn entries(&self) -> &[BundleEntry] {
        self.entry.as_deref().unwrap_or(&[])
    }

    /// Add an entry to the bundle
    pub fn add_entry(&mut self, entry: BundleEntry) {
        self.entry.get_or_insert_with(Vec::new).push(entry);
    }

    /// Add a link to the bundle
    pub fn add_link(&mut self, relation: impl Into<String>, url: impl Into<String>) {
        self.link.get_or_insert_with(Vec::new).push(BundleLink {
            relation: relation.into(),
            url: url.into(),
        });
    }

    /// URL of the first link with the given relation
    pub fn link_url(&self, relation: &str) -> Option<&str> {
        self.link
            .as_ref()?
            .iter()
            .find(|link| link.relation == relation)
            .map(|link| link.url.as_str())
    }

    /// URL of the next page of a paged search or history
    pub fn next_link(&self) -> Option<&str> {
        self.link_url("next")
    }

    /// Entries whose payload declares the given resource type, without decoding them
    pub fn entries_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a BundleEntry> + 'a {
        self.entries()
            .iter()
            .filter(move |entry| entry.resource_type().as_deref() == Some(resource_type))
    }
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new(BundleType::Collection)
    }
}

impl BundleEntry {
    /// Entry wrapping an encoded resource
    pub fn with_resource(resource: &dyn Resource) -> Result<Self> {
        let raw = serde_json::value::to_raw_value(&resource.to_value()?)?;
        Ok(Self {
            resource: Some(raw),
            ..Default::default()
        })
    }

    pub fn with_full_url(mut self, full_url: impl Into<String>) -> Self {
        self.full_url = Some(full_url.into());
        self
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Raw JSON text of the payload
    pub fn resource_json(&self) -> Option<&str> {
        self.resource.as_deref().map(RawValue::get)
    }

    /// The payload's `resourceType`, read without a full decode.
    ///
    /// `None` when the payload is absent or carries no usable discriminator.
    pub fn resource_type(&self) -> Option<String> {
        let raw = self.resource_json()?;
        mapper::peek_resource_type(raw.as_bytes()).ok()
    }

    /// Decode the payload through `mapper`; an absent payload yields `Ok(None)`.
    pub fn resolve(&self, mapper: &ResourceMapper) -> Result<Option<Box<dyn Resource>>> {
        mapper.resolve_entry(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::patient::Patient;
    use serde_json::json;

    fn searchset_json() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "resourceType": "Bundle",
            "id": "example-bundle",
            "type": "searchset",
            "total": 5,
            "link": [
                {"relation": "self", "url": "http://example.org/fhir/Patient?name=Doe"},
                {"relation": "next", "url": "http://example.org/fhir/Patient?name=Doe&page=2"}
            ],
            "entry": [
                {
                    "fullUrl": "http://example.org/fhir/Patient/123",
                    "resource": {
                        "resourceType": "Patient",
                        "id": "123"
                    },
                    "search": {
                        "mode": "match",
                        "score": 1.0
                    }
                },
                {
                    "fullUrl": "http://example.org/fhir/Observation/obs-1",
                    "resource": {
                        "resourceType": "Observation",
                        "id": "obs-1",
                        "status": "final"
                    },
                    "search": {"mode": "include"}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_bundle() {
        let bundle = Bundle::from_slice(&searchset_json()).unwrap();
        assert_eq!(bundle.base.id, Some("example-bundle".to_string()));
        assert_eq!(bundle.bundle_type, BundleType::Searchset);
        assert_eq!(bundle.total, Some(5));
        assert_eq!(bundle.entry_count(), 2);

        let first = &bundle.entries()[0];
        assert_eq!(
            first.full_url.as_deref(),
            Some("http://example.org/fhir/Patient/123")
        );
        assert_eq!(
            first.search.as_ref().unwrap().search_mode,
            Some(BundleEntrySearchMode::Match)
        );
    }

    #[test]
    fn test_entries_stay_raw() {
        let bundle = Bundle::from_slice(&searchset_json()).unwrap();
        let raw = bundle.entries()[1].resource_json().unwrap();
        let value: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value["status"], "final");
        assert_eq!(bundle.entries()[1].resource_type().as_deref(), Some("Observation"));
    }

    #[test]
    fn test_entries_of_type() {
        let bundle = Bundle::from_slice(&searchset_json()).unwrap();
        let patients: Vec<_> = bundle.entries_of_type("Patient").collect();
        assert_eq!(patients.len(), 1);
        assert_eq!(bundle.entries_of_type("Encounter").count(), 0);
    }

    #[test]
    fn test_navigation_links() {
        let bundle = Bundle::from_slice(&searchset_json()).unwrap();
        assert_eq!(
            bundle.next_link(),
            Some("http://example.org/fhir/Patient?name=Doe&page=2")
        );
        assert_eq!(bundle.link_url("previous"), None);
    }

    #[test]
    fn test_null_resource_is_absent() {
        let data = br#"{
            "resourceType": "Bundle",
            "type": "history",
            "entry": [
                {"request": {"method": "DELETE", "url": "Patient/123"}, "resource": null},
                {"request": {"method": "DELETE", "url": "Patient/456"}}
            ]
        }"#;
        let bundle = Bundle::from_slice(data).unwrap();
        assert!(bundle.entries().iter().all(|entry| !entry.has_resource()));
        assert_eq!(bundle.entries()[0].resource_type(), None);
    }

    #[test]
    fn test_serialize_bundle() {
        let bundle = Bundle::new(BundleType::Transaction);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["type"], "transaction");
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn test_bundle_type_kebab_case() {
        let json = serde_json::to_value(BundleType::TransactionResponse).unwrap();
        assert_eq!(json, "transaction-response");
        let parsed: BundleType = serde_json::from_value(json!("batch-response")).unwrap();
        assert_eq!(parsed, BundleType::BatchResponse);
    }

    #[test]
    fn test_is_transaction() {
        let bundle = Bundle::new(BundleType::Transaction);
        assert!(bundle.is_transaction());
        assert!(!bundle.is_batch());
        assert!(!bundle.is_searchset());
    }

    #[test]
    fn test_add_entry_with_resource() {
        let mut bundle = Bundle::new(BundleType::Collection);
        let patient = Patient::new().with_id("123");
        let entry = BundleEntry::with_resource(&patient)
            .unwrap()
            .with_full_url("http://example.org/fhir/Patient/123");

        bundle.add_entry(entry);
        assert_eq!(bundle.entry_count(), 1);

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["entry"][0]["resource"]["resourceType"], "Patient");
        assert_eq!(json["entry"][0]["resource"]["id"], "123");
    }

    #[test]
    fn test_add_link() {
        let mut bundle = Bundle::new(BundleType::Searchset);
        bundle.add_link("self", "http://example.org/fhir/Patient?_id=123");
        assert_eq!(bundle.link.as_ref().unwrap().len(), 1);
        assert_eq!(bundle.link_url("self"), Some("http://example.org/fhir/Patient?_id=123"));
    }

    #[test]
    fn test_bundle_entry_request() {
        let request = BundleEntryRequest {
            method: "POST".to_string(),
            url: "Patient".to_string(),
            if_none_match: None,
            if_modified_since: None,
            if_match: None,
            if_none_exist: Some("identifier=urn:mrn|42".to_string()),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["url"], "Patient");
        assert_eq!(json["ifNoneExist"], "identifier=urn:mrn|42");
    }

    #[test]
    fn test_bundle_entry_response() {
        let response: BundleEntryResponse = serde_json::from_value(json!({
            "status": "201 Created",
            "location": "Patient/123/_history/1",
            "etag": "W/\"1\"",
            "lastModified": "2023-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(response.status, "201 Created");
        assert_eq!(response.location.as_deref(), Some("Patient/123/_history/1"));
        assert_eq!(
            response.last_modified.unwrap().to_string(),
            "2023-01-01T00:00:00Z"
        );
    }
}
