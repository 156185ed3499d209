//! FHIR REST operations
//!
//! Each call is a single attempt: build the request, send it, classify the
//! status, decode the body. Status codes in 200..300 are successes; anything
//! else becomes [`Error::RemoteOperationFailed`] carrying the raw body. There
//! is no retry or backoff.
//!
//! Cancellation is dropping the returned future. A deadline can be applied
//! with `tokio::time::timeout` or through [`ClientConfig::timeout_secs`].

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::search::SearchParams;
use crate::version::FhirVersion;
use ferrum_models::{Bundle, CapabilityStatement, Resource, ResourceMapper, TypedResource};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Instant;

/// Media type for FHIR JSON bodies
pub const FHIR_JSON: &str = "application/fhir+json";

/// Media type for JSON Patch bodies
pub const JSON_PATCH: &str = "application/json-patch+json";

/// Check a response status, turning anything outside 200..300 into
/// [`Error::RemoteOperationFailed`].
pub fn classify_response(status: u16, body: &[u8]) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(Error::RemoteOperationFailed {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

/// Async client for a FHIR REST server.
///
/// Cloning is cheap; clones share the connection pool and the resource mapper.
#[derive(Debug, Clone)]
pub struct FhirClient {
    http: Client,
    base_url: String,
    fhir_version: FhirVersion,
    headers: HeaderMap,
    mapper: Arc<ResourceMapper>,
}

impl FhirClient {
    /// Client for `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        FhirClientBuilder::from_config(config).build()
    }

    pub fn builder() -> FhirClientBuilder {
        FhirClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fhir_version(&self) -> FhirVersion {
        self.fhir_version
    }

    pub fn mapper(&self) -> &ResourceMapper {
        &self.mapper
    }

    /// Set a header sent with every subsequent request
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// `GET [base]/[type]/[id]`
    pub async fn read(&self, resource_type: &str, id: &str) -> Result<Box<dyn Resource>> {
        let url = self.build_url(&[resource_type, id]);
        let body = self.execute(Method::GET, url, None).await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// `GET [base]/[type]/[id]/_history/[vid]`
    pub async fn vread(
        &self,
        resource_type: &str,
        id: &str,
        version_id: &str,
    ) -> Result<Box<dyn Resource>> {
        let url = self.build_url(&[resource_type, id, "_history", version_id]);
        let body = self.execute(Method::GET, url, None).await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// `POST [base]/[type]`, returning the resource as stored by the server
    pub async fn create(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        let url = self.build_url(&[resource.resource_type()]);
        let payload = self.mapper.encode(resource)?;
        let body = self
            .execute(Method::POST, url, Some((payload, FHIR_JSON)))
            .await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// `PUT [base]/[type]/[id]`
    pub async fn update(&self, id: &str, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        let url = self.build_url(&[resource.resource_type(), id]);
        let payload = self.mapper.encode(resource)?;
        let body = self
            .execute(Method::PUT, url, Some((payload, FHIR_JSON)))
            .await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// `PATCH [base]/[type]/[id]` with a JSON Patch document
    pub async fn patch(
        &self,
        resource_type: &str,
        id: &str,
        patch: &serde_json::Value,
    ) -> Result<Box<dyn Resource>> {
        let url = self.build_url(&[resource_type, id]);
        let payload = serde_json::to_vec(patch).map_err(ferrum_models::Error::from)?;
        let body = self
            .execute(Method::PATCH, url, Some((payload, JSON_PATCH)))
            .await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// `DELETE [base]/[type]/[id]`; any response body is ignored
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<()> {
        let url = self.build_url(&[resource_type, id]);
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// `GET [base]/[type]?params`
    pub async fn search(&self, resource_type: &str, params: &SearchParams) -> Result<Bundle> {
        let url = with_query(self.build_url(&[resource_type]), params);
        self.fetch_bundle(url).await
    }

    /// `GET [base]?params`, searching across all resource types
    pub async fn search_all(&self, params: &SearchParams) -> Result<Bundle> {
        let url = with_query(self.build_url(&[]), params);
        self.fetch_bundle(url).await
    }

    /// `GET [base]/[type]/[id]/_history?params`
    pub async fn history(
        &self,
        resource_type: &str,
        id: &str,
        params: &SearchParams,
    ) -> Result<Bundle> {
        let url = with_query(self.build_url(&[resource_type, id, "_history"]), params);
        self.fetch_bundle(url).await
    }

    /// `GET [base]/[type]/_history?params`
    pub async fn type_history(&self, resource_type: &str, params: &SearchParams) -> Result<Bundle> {
        let url = with_query(self.build_url(&[resource_type, "_history"]), params);
        self.fetch_bundle(url).await
    }

    /// Follow the `next` link of a search or history page
    pub async fn next_page(&self, bundle: &Bundle) -> Result<Option<Bundle>> {
        match bundle.next_link() {
            Some(url) => self.fetch_bundle(url.to_string()).await.map(Some),
            None => Ok(None),
        }
    }

    /// `POST [base]` with a transaction or batch Bundle
    pub async fn transaction(&self, bundle: &Bundle) -> Result<Bundle> {
        let url = self.build_url(&[]);
        let payload = self.mapper.encode(bundle)?;
        let body = self
            .execute(Method::POST, url, Some((payload, FHIR_JSON)))
            .await?;
        Ok(self.mapper.decode_bundle(&body)?)
    }

    /// `GET [base]/metadata`
    pub async fn capabilities(&self) -> Result<CapabilityStatement> {
        let url = self.build_url(&[self.fhir_version.info().conformance]);
        let body = self.execute(Method::GET, url, None).await?;
        let statement = self.mapper.decode_as::<CapabilityStatement>(&body)?;

        if let Some(reported) = statement.fhir_version.as_deref() {
            if !self.fhir_version.matches(reported) {
                tracing::warn!(
                    configured = %self.fhir_version,
                    reported,
                    "Server reports a different FHIR version"
                );
            }
        }

        Ok(statement)
    }

    /// `POST [base]/$[name]` with an optional input body (usually Parameters)
    pub async fn operation(
        &self,
        name: &str,
        input: Option<&serde_json::Value>,
    ) -> Result<Box<dyn Resource>> {
        let operation = format!("${name}");
        let url = self.build_url(&[operation.as_str()]);
        let payload = input
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ferrum_models::Error::from)?
            .map(|bytes| (bytes, FHIR_JSON));
        let body = self.execute(Method::POST, url, payload).await?;
        Ok(self.mapper.decode(&body)?)
    }

    /// Read and require a `T`
    pub async fn read_as<T: TypedResource>(&self, id: &str) -> Result<T> {
        let url = self.build_url(&[T::TYPE_NAME, id]);
        let body = self.execute(Method::GET, url, None).await?;
        Ok(self.mapper.decode_as::<T>(&body)?)
    }

    /// Create and require the server to answer with a `T`
    pub async fn create_typed<T: TypedResource>(&self, resource: &T) -> Result<T> {
        let url = self.build_url(&[T::TYPE_NAME]);
        let payload = self.mapper.encode(resource)?;
        let body = self
            .execute(Method::POST, url, Some((payload, FHIR_JSON)))
            .await?;
        Ok(self.mapper.decode_as::<T>(&body)?)
    }

    /// Update and require the server to answer with a `T`
    pub async fn update_typed<T: TypedResource>(&self, id: &str, resource: &T) -> Result<T> {
        let url = self.build_url(&[T::TYPE_NAME, id]);
        let payload = self.mapper.encode(resource)?;
        let body = self
            .execute(Method::PUT, url, Some((payload, FHIR_JSON)))
            .await?;
        Ok(self.mapper.decode_as::<T>(&body)?)
    }

    async fn fetch_bundle(&self, url: String) -> Result<Bundle> {
        let body = self.execute(Method::GET, url, None).await?;
        Ok(self.mapper.decode_bundle(&body)?)
    }

    /// Join path segments onto the base URL, skipping empty ones
    fn build_url(&self, parts: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for part in parts.iter().filter(|part| !part.is_empty()) {
            url.push('/');
            url.push_str(part);
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        url: String,
        body: Option<(Vec<u8>, &'static str)>,
    ) -> Result<Vec<u8>> {
        tracing::debug!(method = %method, url = %url, "Sending FHIR request");
        let started = Instant::now();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, FHIR_JSON);
        if let Some((payload, content_type)) = body {
            request = request.header(CONTENT_TYPE, content_type).body(payload);
        }
        let request = request.headers(self.headers.clone());

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(
            method = %method,
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received FHIR response"
        );

        if let Err(err) = classify_response(status, &body) {
            tracing::warn!(method = %method, url = %url, status, "FHIR request failed");
            return Err(err);
        }

        Ok(body.to_vec())
    }
}

fn with_query(mut url: String, params: &SearchParams) -> String {
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.encode());
    }
    url
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let invalid = |reason: String| Error::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok((header_name, header_value))
}

/// Builder for [`FhirClient`]
#[derive(Debug, Default)]
pub struct FhirClientBuilder {
    config: ClientConfig,
    mapper: Option<Arc<ResourceMapper>>,
    http: Option<Client>,
}

impl FhirClientBuilder {
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.config.fhir_version = fhir_version;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    /// Decode responses with a mapper that has extra registrations
    pub fn mapper(mut self, mapper: Arc<ResourceMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Use a preconfigured HTTP client. Its own timeout and user agent apply;
    /// the builder's are ignored.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<FhirClient> {
        let config = self.config;
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = Client::builder().user_agent(config.user_agent.as_str());
                if let Some(timeout) = config.timeout() {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!(
            base_url = %base_url,
            fhir_version = %config.fhir_version,
            "Created FHIR client"
        );

        Ok(FhirClient {
            http,
            base_url,
            fhir_version: config.fhir_version,
            headers,
            mapper: self.mapper.unwrap_or_default(),
        })
    }
}
