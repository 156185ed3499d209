//! FHIR Patient model

use super::complex::*;
use super::resource::ResourceBase;
use super::temporal::{FhirDate, FhirInstant};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR Patient resource
///
/// Demographics and other administrative information about an individual
/// receiving care.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(flatten)]
    pub base: ResourceBase,

    /// Whether this patient's record is in active use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanName>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    /// Date of birth, day precision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<FhirDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_date_time: Option<FhirInstant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<Address>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_birth_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_birth_integer: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<Attachment>>,

    /// A contact party (e.g. guardian, partner, friend) for the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<PatientContact>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication: Option<Vec<PatientCommunication>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_practitioner: Option<Vec<Reference>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,

    /// Link to other Patient resources concerning the same person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<PatientLink>>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

crate::impl_resource!(Patient, "Patient");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

/// Either side of the `deceased[x]` choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deceased {
    Boolean(bool),
    DateTime(FhirInstant),
}

/// A contact party for the patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// A language which may be used to communicate with the patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCommunication {
    pub language: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
}

/// Link to another patient resource that concerns the same actual person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientLink {
    pub other: Reference,

    #[serde(rename = "type")]
    pub link_type: LinkType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    ReplacedBy,
    Replaces,
    Refer,
    #[serde(rename = "seealso")]
    SeeAlso,
}

impl Patient {
    /// Create an empty Patient
    pub fn new() -> Self {
        Self {
            base: ResourceBase::new("Patient"),
            active: None,
            name: None,
            telecom: None,
            gender: None,
            birth_date: None,
            deceased_boolean: None,
            deceased_date_time: None,
            address: None,
            marital_status: None,
            multiple_birth_boolean: None,
            multiple_birth_integer: None,
            photo: None,
            contact: None,
            communication: None,
            general_practitioner: None,
            managing_organization: None,
            link: None,
            additional: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: HumanName) -> Self {
        self.name.get_or_insert_with(Vec::new).push(name);
        self
    }

    pub fn with_gender(mut self, gender: AdministrativeGender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_birth_date(mut self, birth_date: FhirDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    /// First name in the list, usually the official one
    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.as_ref()?.first()
    }

    /// The deceased state, preferring the timestamp when both are present.
    pub fn deceased(&self) -> Option<Deceased> {
        self.deceased_date_time
            .map(Deceased::DateTime)
            .or(self.deceased_boolean.map(Deceased::Boolean))
    }

    /// Set one side of `deceased[x]`, clearing the other.
    pub fn set_deceased(&mut self, deceased: Option<Deceased>) {
        self.deceased_boolean = None;
        self.deceased_date_time = None;
        match deceased {
            Some(Deceased::Boolean(flag)) => self.deceased_boolean = Some(flag),
            Some(Deceased::DateTime(at)) => self.deceased_date_time = Some(at),
            None => {}
        }
    }
}

impl Default for Patient {
    fn default() -> Self {
        Self::new()
    }
}
