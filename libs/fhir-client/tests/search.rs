//! Search, history and transaction interactions against a mock server

mod support;

use ferrum_client::SearchParams;
use ferrum_models::{
    Bundle, BundleEntry, BundleType, FhirInstant, Patient, Resource, ResourceMapper,
};
use serde_json::json;
use support::{fhir_response, patient_json, searchset, start};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::Mock;

#[tokio::test]
async fn search_encodes_parameters() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("family", "Doe"))
        .and(query_param("birthdate", "ge2000-01-01"))
        .and(query_param("name:contains", "Jo"))
        .and(query_param("_count", "10"))
        .respond_with(fhir_response(200, &searchset(1, vec![patient_json("123")])))
        .expect(1)
        .mount(&server)
        .await;

    let params = SearchParams::new()
        .add("family", "Doe")
        .greater_or_equal("birthdate", "2000-01-01")
        .contains("name", "Jo")
        .count(10);
    let bundle = client.search("Patient", &params).await?;

    assert!(bundle.is_searchset());
    assert_eq!(bundle.total, Some(1));

    let resources = client.mapper().resolve_entries(&bundle)?;
    assert_eq!(resources.len(), 1);
    assert!(resources[0].is::<Patient>());
    assert_eq!(resources[0].id(), Some("123"));

    Ok(())
}

#[tokio::test]
async fn mixed_bundle_resolves_known_entries() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .respond_with(fhir_response(
            200,
            &searchset(
                1,
                vec![
                    patient_json("123"),
                    json!({"resourceType": "Observation", "id": "obs-1", "status": "final"}),
                ],
            ),
        ))
        .mount(&server)
        .await;

    let bundle = client.search("Patient", &SearchParams::new()).await?;
    assert_eq!(bundle.entry_count(), 2);

    // The envelope decodes even though one entry has no registered model
    let err = client.mapper().resolve_entries(&bundle).unwrap_err();
    assert!(matches!(err, ferrum_models::Error::BundleEntry { index: 1, .. }));
    assert!(err.is_unsupported_type());

    let patients: Vec<Box<dyn Resource>> = bundle
        .entries_of_type("Patient")
        .filter_map(|entry| entry.resolve(client.mapper()).transpose())
        .collect::<Result<_, _>>()?;
    assert_eq!(patients.len(), 1);

    Ok(())
}

#[tokio::test]
async fn history_keeps_deleted_entries() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("GET"))
        .and(path("/fhir/Patient/123/_history"))
        .respond_with(fhir_response(
            200,
            &json!({
                "resourceType": "Bundle",
                "type": "history",
                "total": 2,
                "entry": [
                    {
                        "request": {"method": "DELETE", "url": "Patient/123"},
                        "response": {"status": "204 No Content", "lastModified": "2024-03-02T08:00:00Z"}
                    },
                    {
                        "resource": patient_json("123"),
                        "request": {"method": "POST", "url": "Patient"},
                        "response": {"status": "201 Created", "etag": "W/\"1\""}
                    }
                ]
            }),
        ))
        .mount(&server)
        .await;

    let bundle = client.history("Patient", "123", &SearchParams::new()).await?;
    assert_eq!(bundle.bundle_type, BundleType::History);

    let deleted = &bundle.entries()[0];
    assert!(!deleted.has_resource());
    assert!(deleted.resolve(client.mapper())?.is_none());

    let created = bundle.entries()[1]
        .resolve(client.mapper())?
        .expect("second entry carries a payload");
    assert_eq!(created.id(), Some("123"));

    // Absent payloads are skipped, not errors
    assert_eq!(client.mapper().resolve_entries(&bundle)?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn type_history_with_since() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("GET"))
        .and(path("/fhir/Patient/_history"))
        .and(query_param("_since", "2024-01-01T00:00:00Z"))
        .respond_with(fhir_response(
            200,
            &json!({"resourceType": "Bundle", "type": "history", "total": 0}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let since = FhirInstant::parse("2024-01-01T00:00:00Z")?;
    let bundle = client
        .type_history("Patient", &SearchParams::new().since(since))
        .await?;
    assert_eq!(bundle.entry_count(), 0);

    Ok(())
}

#[tokio::test]
async fn next_page_follows_link() -> anyhow::Result<()> {
    let (server, client) = start().await?;
    let next_url = format!("{}/fhir/Patient?family=Doe&page=2", server.uri());

    let mut first_page = searchset(2, vec![patient_json("1")]);
    first_page["link"] = json!([
        {"relation": "self", "url": format!("{}/fhir/Patient?family=Doe", server.uri())},
        {"relation": "next", "url": next_url}
    ]);

    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("page", "2"))
        .respond_with(fhir_response(200, &searchset(2, vec![patient_json("2")])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .respond_with(fhir_response(200, &first_page))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .search("Patient", &SearchParams::new().add("family", "Doe"))
        .await?;
    assert!(page.next_link().is_some());

    let second = client.next_page(&page).await?.expect("a second page");
    assert_eq!(second.entries()[0].resource_type().as_deref(), Some("Patient"));
    assert!(client.next_page(&second).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn search_all_hits_base() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("GET"))
        .and(path("/fhir"))
        .and(query_param("_tag", "http://example.org/tags|urgent"))
        .respond_with(fhir_response(200, &searchset(0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let params = SearchParams::new().tag("http://example.org/tags", "urgent");
    let bundle = client.search_all(&params).await?;
    assert_eq!(bundle.total, Some(0));

    Ok(())
}

#[tokio::test]
async fn transaction_posts_bundle_to_base() -> anyhow::Result<()> {
    let (server, client) = start().await?;

    Mock::given(method("POST"))
        .and(path("/fhir"))
        .and(body_partial_json(json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [{"resource": {"resourceType": "Patient", "id": "tx-1"}}]
        })))
        .respond_with(fhir_response(
            200,
            &json!({
                "resourceType": "Bundle",
                "type": "transaction-response",
                "entry": [{"response": {"status": "201 Created", "location": "Patient/tx-1/_history/1"}}]
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut bundle = Bundle::new(BundleType::Transaction);
    bundle.add_entry(BundleEntry::with_resource(&Patient::new().with_id("tx-1"))?);

    let response = client.transaction(&bundle).await?;
    assert_eq!(response.bundle_type, BundleType::TransactionResponse);
    let location = response.entries()[0]
        .response
        .as_ref()
        .and_then(|r| r.location.as_deref());
    assert_eq!(location, Some("Patient/tx-1/_history/1"));

    Ok(())
}

#[tokio::test]
async fn custom_mapper_decodes_extra_types() -> anyhow::Result<()> {
    let (server, _) = start().await?;

    let mut mapper = ResourceMapper::new();
    mapper.register_as::<Patient>("Person");
    let client = ferrum_client::FhirClient::builder()
        .base_url(format!("{}/fhir", server.uri()))
        .mapper(std::sync::Arc::new(mapper))
        .build()?;

    Mock::given(method("GET"))
        .and(path("/fhir/Person/7"))
        .respond_with(fhir_response(200, &json!({"resourceType": "Person", "id": "7"})))
        .mount(&server)
        .await;

    let person = client.read("Person", "7").await?;
    assert!(person.is::<Patient>());
    assert_eq!(person.resource_type(), "Person");

    Ok(())
}
