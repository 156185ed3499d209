//! Shared helpers for client integration tests

#![allow(dead_code)]

use ferrum_client::FhirClient;
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

/// Mock server plus a client pointed at its `/fhir` base
pub async fn start() -> anyhow::Result<(MockServer, FhirClient)> {
    let server = MockServer::start().await;
    let client = FhirClient::new(format!("{}/fhir", server.uri()))?;
    Ok((server, client))
}

/// Response with a FHIR JSON body
pub fn fhir_response(status: u16, body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/fhir+json")
}

pub fn patient_json(id: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "meta": {"versionId": "1", "lastUpdated": "2024-03-01T10:15:00Z"},
        "name": [{"family": "Doe", "given": ["John"]}],
        "gender": "male",
        "birthDate": "2000-01-01"
    })
}

pub fn not_found_outcome(diagnostics: &str) -> Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": "error",
            "code": "not-found",
            "diagnostics": diagnostics
        }]
    })
}

/// Searchset with the given entry resources
pub fn searchset(total: u32, resources: Vec<Value>) -> Value {
    let entry: Vec<Value> = resources
        .into_iter()
        .map(|resource| json!({"resource": resource, "search": {"mode": "match"}}))
        .collect();
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": total,
        "entry": entry
    })
}
