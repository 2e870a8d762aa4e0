use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::ScanError;

/// Confidence at or above which an extraction is presented as reliable.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Identity, // Cédula de identidad
    Vehicle,  // Certificado de circulación / título
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocumentKind::Identity => write!(f, "identity"),
            DocumentKind::Vehicle => write!(f, "vehicle"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "id" | "cedula" => Ok(DocumentKind::Identity),
            "vehicle" | "car" | "vehiculo" => Ok(DocumentKind::Vehicle),
            other => Err(ScanError::Config(format!("Unknown document kind: {}", other))),
        }
    }
}

/// Raw output of one recognition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    pub confidence: f32,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 100.0) };
        RecognitionResult {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityFields {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub confidence: f32,
}

impl IdentityFields {
    /// Parses `date_of_birth` (`DD-MM-YYYY` or `DD/MM/YYYY`).
    pub fn birth_date(&self) -> Option<NaiveDate> {
        let normalized = self.date_of_birth.trim().replace('/', "-");
        NaiveDate::parse_from_str(&normalized, "%d-%m-%Y").ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFields {
    pub plate: String,
    pub serial_number: String,
    pub year: String,
    pub model: String,
    pub color: String,
    pub confidence: f32,
}

/// Fields pulled out of a recognized document, one struct per document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedFields {
    Identity(IdentityFields),
    Vehicle(VehicleFields),
}

impl ExtractedFields {
    pub fn kind(&self) -> DocumentKind {
        match self {
            ExtractedFields::Identity(_) => DocumentKind::Identity,
            ExtractedFields::Vehicle(_) => DocumentKind::Vehicle,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            ExtractedFields::Identity(fields) => fields.confidence,
            ExtractedFields::Vehicle(fields) => fields.confidence,
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.meets_confidence(HIGH_CONFIDENCE_THRESHOLD)
    }

    pub fn meets_confidence(&self, threshold: f32) -> bool {
        self.confidence() >= threshold
    }

    /// Name and current value of the field that must be filled before confirming.
    pub fn primary_field(&self) -> (&'static str, &str) {
        match self {
            ExtractedFields::Identity(fields) => ("documentNumber", &fields.document_number),
            ExtractedFields::Vehicle(fields) => ("plate", &fields.plate),
        }
    }

    /// All editable fields in display order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        match self {
            ExtractedFields::Identity(f) => vec![
                ("documentNumber", f.document_number.as_str()),
                ("firstName", f.first_name.as_str()),
                ("lastName", f.last_name.as_str()),
                ("dateOfBirth", f.date_of_birth.as_str()),
            ],
            ExtractedFields::Vehicle(f) => vec![
                ("plate", f.plate.as_str()),
                ("serialNumber", f.serial_number.as_str()),
                ("year", f.year.as_str()),
                ("model", f.model.as_str()),
                ("color", f.color.as_str()),
            ],
        }
    }

    /// Overwrites one field by its output name (`documentNumber`, `plate`, ...).
    /// Snake case names are accepted too.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ScanError> {
        let key = name.trim().replace('_', "").to_ascii_lowercase();
        let slot = match self {
            ExtractedFields::Identity(f) => match key.as_str() {
                "documentnumber" => &mut f.document_number,
                "firstname" => &mut f.first_name,
                "lastname" => &mut f.last_name,
                "dateofbirth" => &mut f.date_of_birth,
                _ => return Err(ScanError::UnknownField(name.to_string())),
            },
            ExtractedFields::Vehicle(f) => match key.as_str() {
                "plate" => &mut f.plate,
                "serialnumber" => &mut f.serial_number,
                "year" => &mut f.year,
                "model" => &mut f.model,
                "color" => &mut f.color,
                _ => return Err(ScanError::UnknownField(name.to_string())),
            },
        };
        *slot = value.into();
        Ok(())
    }
}
