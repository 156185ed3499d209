//! FHIR version descriptors
//!
//! The client talks to R4 and R5 servers. Each release has a canonical API
//! version string and a conventional base path. Resource mapping between
//! releases is not provided.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FHIR release spoken by a server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirVersion {
    #[default]
    R4,
    R5,
}

/// Static metadata about a FHIR release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: FhirVersion,
    /// Published version number, as reported in `CapabilityStatement.fhirVersion`
    pub api_version: &'static str,
    /// Conventional base path on public test servers
    pub base_path: &'static str,
    /// Path of the conformance (capabilities) endpoint
    pub conformance: &'static str,
}

const R4_INFO: VersionInfo = VersionInfo {
    version: FhirVersion::R4,
    api_version: "4.0.1",
    base_path: "/baseR4",
    conformance: "metadata",
};

const R5_INFO: VersionInfo = VersionInfo {
    version: FhirVersion::R5,
    api_version: "5.0.0",
    base_path: "/R5",
    conformance: "metadata",
};

impl FhirVersion {
    pub fn info(&self) -> &'static VersionInfo {
        match self {
            FhirVersion::R4 => &R4_INFO,
            FhirVersion::R5 => &R5_INFO,
        }
    }

    pub fn api_version(&self) -> &'static str {
        self.info().api_version
    }

    /// Whether a reported `fhirVersion` (e.g. `4.0.1`) belongs to this release
    pub fn matches(&self, fhir_version: &str) -> bool {
        let major = match self {
            FhirVersion::R4 => "4.0",
            FhirVersion::R5 => "5.0",
        };
        fhir_version == major || fhir_version.starts_with(&format!("{major}."))
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirVersion::R4 => write!(f, "R4"),
            FhirVersion::R5 => write!(f, "R5"),
        }
    }
}

impl FromStr for FhirVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "R4" | "r4" | "4.0.1" => Ok(FhirVersion::R4),
            "R5" | "r5" | "5.0.0" => Ok(FhirVersion::R5),
            _ => Err(Error::UnsupportedVersion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let r4 = FhirVersion::R4.info();
        assert_eq!(r4.api_version, "4.0.1");
        assert_eq!(r4.base_path, "/baseR4");
        assert_eq!(r4.conformance, "metadata");

        let r5 = FhirVersion::R5.info();
        assert_eq!(r5.api_version, "5.0.0");
        assert_eq!(r5.base_path, "/R5");
        assert_eq!(FhirVersion::default(), FhirVersion::R4);
    }

    #[test]
    fn test_parse_version() {
        assert_eq!("R5".parse::<FhirVersion>().unwrap(), FhirVersion::R5);
        assert_eq!("4.0.1".parse::<FhirVersion>().unwrap(), FhirVersion::R4);
        assert_eq!(FhirVersion::R4.to_string(), "R4");

        let err = "R3".parse::<FhirVersion>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(ref v) if v == "R3"));
    }

    #[test]
    fn test_matches_reported_version() {
        assert!(FhirVersion::R4.matches("4.0.1"));
        assert!(FhirVersion::R4.matches("4.0"));
        assert!(!FhirVersion::R4.matches("4.3.0"));
        assert!(FhirVersion::R5.matches("5.0.0"));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&FhirVersion::R5).unwrap(), "\"R5\"");
        let parsed: FhirVersion = serde_json::from_str("\"R4\"").unwrap();
        assert_eq!(parsed, FhirVersion::R4);
    }
}
