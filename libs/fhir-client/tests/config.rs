//! Environment overlay for client configuration
//!
//! Kept as the only test in this binary: it mutates process environment.

use ferrum_client::{ClientConfig, FhirVersion};
use std::time::Duration;

const VARS: [(&str, &str); 4] = [
    ("FHIR_CLIENT_BASE_URL", "https://fhir.example.org/R5"),
    ("FHIR_CLIENT_FHIR_VERSION", "R5"),
    ("FHIR_CLIENT_TIMEOUT_SECS", "30"),
    ("FHIR_CLIENT_USER_AGENT", "ferrum-tests/1.0"),
];

#[test]
fn from_env_overlays_defaults() -> anyhow::Result<()> {
    for (name, value) in VARS {
        std::env::set_var(name, value);
    }
    let loaded = ClientConfig::from_env();
    for (name, _) in VARS {
        std::env::remove_var(name);
    }

    let config = loaded?;
    assert_eq!(config.base_url, "https://fhir.example.org/R5");
    assert_eq!(config.fhir_version, FhirVersion::R5);
    assert_eq!(config.timeout_secs, Some(30));
    assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.user_agent, "ferrum-tests/1.0");
    assert!(config.headers.is_empty());

    // Unset variables fall back to defaults
    let defaults = ClientConfig::from_env()?;
    assert_eq!(defaults, ClientConfig::default());

    // An invalid overlay is rejected by validation
    std::env::set_var("FHIR_CLIENT_BASE_URL", "ftp://fhir.example.org");
    let rejected = ClientConfig::from_env();
    std::env::remove_var("FHIR_CLIENT_BASE_URL");
    assert!(rejected.is_err());

    Ok(())
}
