//! Command implementations

use anyhow::{bail, Context};
use ferrum_client::{FhirClient, SearchParams};
use ferrum_models::{Bundle, FhirInstant, Resource, ResourceMapper};
use std::io::Read;
use std::path::Path;

pub async fn read(
    client: &FhirClient,
    resource_type: &str,
    id: &str,
    version: Option<&str>,
) -> anyhow::Result<()> {
    let resource = match version {
        Some(version_id) => client.vread(resource_type, id, version_id).await?,
        None => client.read(resource_type, id).await?,
    };
    print_resource(resource.as_ref())
}

pub async fn search(
    client: &FhirClient,
    resource_type: &str,
    params: &SearchParams,
    raw: bool,
) -> anyhow::Result<()> {
    tracing::debug!(resource_type, query = %params.to_raw_query(), "Searching");
    let bundle = client.search(resource_type, params).await?;
    if raw {
        print_resource(&bundle)
    } else {
        print_bundle_summary(&bundle);
        Ok(())
    }
}

pub async fn history(
    client: &FhirClient,
    resource_type: &str,
    id: Option<&str>,
    since: Option<&str>,
) -> anyhow::Result<()> {
    let mut params = SearchParams::new();
    if let Some(since) = since {
        let instant = FhirInstant::parse(since).context("--since must be an RFC 3339 instant")?;
        params = params.since(instant);
    }

    let bundle = match id {
        Some(id) => client.history(resource_type, id, &params).await?,
        None => client.type_history(resource_type, &params).await?,
    };
    print_bundle_summary(&bundle);
    Ok(())
}

/// Decode a payload offline, then print the re-encoded resource
pub fn decode(file: Option<&Path>) -> anyhow::Result<()> {
    let data = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let mapper = ResourceMapper::new();
    let resource = mapper.decode(&data)?;

    if let Some(bundle) = resource.downcast_ref::<Bundle>() {
        for (index, entry) in bundle.entries().iter().enumerate() {
            match entry.resolve(&mapper) {
                Ok(Some(resolved)) => eprintln!("entry {index}: {}", describe(resolved.as_ref())),
                Ok(None) => eprintln!("entry {index}: (no resource)"),
                Err(err) => eprintln!("entry {index}: {err}"),
            }
        }
    }

    print_resource(resource.as_ref())
}

/// Parse `name=value` arguments into search parameters
pub fn parse_search_params(args: &[String], count: Option<u32>) -> anyhow::Result<SearchParams> {
    let mut params = SearchParams::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("search parameter {arg:?} is not of the form name=value");
        };
        if name.is_empty() {
            bail!("search parameter {arg:?} has an empty name");
        }
        params = params.add(name, value);
    }
    if let Some(count) = count {
        params = params.count(count);
    }
    Ok(params)
}

/// Parse a `Name: value` header argument
pub fn parse_header(arg: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = arg.split_once(':') else {
        bail!("header {arg:?} is not of the form 'Name: value'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header {arg:?} has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn describe(resource: &dyn Resource) -> String {
    let mut line = format!("{}/{}", resource.resource_type(), resource.id().unwrap_or("-"));
    if let Some(version_id) = resource.version_id() {
        line.push_str(&format!(" (version {version_id})"));
    }
    line
}

fn print_resource(resource: &dyn Resource) -> anyhow::Result<()> {
    let value = resource.to_value()?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_bundle_summary(bundle: &Bundle) {
    match bundle.total {
        Some(total) => println!("{} of {total} entries", bundle.entry_count()),
        None => println!("{} entries", bundle.entry_count()),
    }
    for entry in bundle.entries() {
        let target = entry
            .resource_type()
            .unwrap_or_else(|| "(no resource)".to_string());
        let location = entry
            .full_url
            .as_deref()
            .or_else(|| entry.request.as_ref().map(|r| r.url.as_str()))
            .unwrap_or("");
        println!("  {target:<24} {location}");
    }
    if let Some(next) = bundle.next_link() {
        println!("next: {next}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_params() {
        let args = vec!["family=Doe".to_string(), "birthdate=ge2000-01-01".to_string()];
        let params = parse_search_params(&args, Some(5)).unwrap();
        assert_eq!(
            params.to_raw_query(),
            "_count=5&birthdate=ge2000-01-01&family=Doe"
        );
    }

    #[test]
    fn test_parse_search_params_rejects_bad_pairs() {
        assert!(parse_search_params(&["family".to_string()], None).is_err());
        assert!(parse_search_params(&["=Doe".to_string()], None).is_err());
        // Only the first '=' separates name and value
        let params = parse_search_params(&["_filter=name eq a=b".to_string()], None).unwrap();
        assert_eq!(params.get("_filter").unwrap(), &["name eq a=b"]);
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer abc").unwrap(),
            ("Authorization".to_string(), "Bearer abc".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_describe() {
        let mapper = ResourceMapper::new();
        let resource = mapper
            .decode(br#"{"resourceType":"Patient","id":"1","meta":{"versionId":"2"}}"#)
            .unwrap();
        assert_eq!(describe(resource.as_ref()), "Patient/1 (version 2)");
    }
}
