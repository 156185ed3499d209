//! FHIR CapabilityStatement model (simplified)
//!
//! Only what a client needs to discover supported resources and interactions;
//! everything else is kept in `additional`.

use super::resource::ResourceBase;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR CapabilityStatement resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    #[serde(flatten)]
    pub base: ResourceBase,

    /// draft | active | retired | unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// instance | capability | requirements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fhir_version: Option<String>,

    #[serde(default)]
    pub format: Vec<String>,

    #[serde(default)]
    pub rest: Vec<CapabilityRest>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

crate::impl_resource!(CapabilityStatement, "CapabilityStatement");

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityRest {
    /// client | server
    pub mode: String,

    #[serde(default)]
    pub resource: Vec<CapabilityResource>,
}

/// Resource served on the REST interface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub interaction: Vec<CapabilityInteraction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityInteraction {
    /// read | vread | update | patch | delete | history-instance | history-type | create | search-type
    pub code: String,
}

impl CapabilityStatement {
    pub fn new() -> Self {
        Self {
            base: ResourceBase::new("CapabilityStatement"),
            status: None,
            date: None,
            kind: None,
            fhir_version: None,
            format: Vec::new(),
            rest: Vec::new(),
            additional: HashMap::new(),
        }
    }

    /// Server-mode declaration for a resource type, if any
    pub fn resource(&self, resource_type: &str) -> Option<&CapabilityResource> {
        self.rest
            .iter()
            .filter(|rest| rest.mode == "server")
            .flat_map(|rest| rest.resource.iter())
            .find(|resource| resource.resource_type == resource_type)
    }

    /// Whether the server declares `interaction` for `resource_type`
    pub fn supports(&self, resource_type: &str, interaction: &str) -> bool {
        self.resource(resource_type).is_some_and(|resource| {
            resource
                .interaction
                .iter()
                .any(|candidate| candidate.code == interaction)
        })
    }
}

impl Default for CapabilityStatement {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supports_interaction() {
        let cs: CapabilityStatement = serde_json::from_value(json!({
            "resourceType": "CapabilityStatement",
            "status": "active",
            "kind": "instance",
            "fhirVersion": "4.0.1",
            "format": ["json"],
            "rest": [{
                "mode": "server",
                "resource": [{
                    "type": "Patient",
                    "interaction": [{"code": "read"}, {"code": "search-type"}]
                }]
            }]
        }))
        .unwrap();

        assert_eq!(cs.fhir_version.as_deref(), Some("4.0.1"));
        assert!(cs.supports("Patient", "read"));
        assert!(!cs.supports("Patient", "delete"));
        assert!(!cs.supports("Observation", "read"));
    }
}
