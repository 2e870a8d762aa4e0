// Field extraction from recognized document text.
// Every field has its own pattern and a miss is an empty string, never an error.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{DocumentKind, ExtractedFields, IdentityFields, RecognitionResult, VehicleFields};

lazy_static! {
    // Identity document (cédula): V/E prefix, optional separator, 6-8 digits
    static ref DOCUMENT_NUMBER_PATTERN: Regex =
        Regex::new(r"(?i)\b[VE][-\s]?(\d{6,8})\b").unwrap();

    static ref FIRST_NAME_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:NOMBRES?|FIRST[ \t]+NAMES?|GIVEN[ \t]+NAMES?)\b[ \t]*:?[ \t]*([A-ZÁÉÍÓÚÜÑ]+(?:[ \t]+[A-ZÁÉÍÓÚÜÑ]+)*)"
    ).unwrap();

    static ref LAST_NAME_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:APELLIDOS?|LAST[ \t]+NAMES?|SURNAMES?)\b[ \t]*:?[ \t]*([A-ZÁÉÍÓÚÜÑ]+(?:[ \t]+[A-ZÁÉÍÓÚÜÑ]+)*)"
    ).unwrap();

    static ref DATE_OF_BIRTH_PATTERN: Regex = Regex::new(
        r"(?i)(?:\bFECHA[ \t]+DE[ \t]+NACIMIENTO|\bF\.[ \t]*NAC\.?|\bDATE[ \t]+OF[ \t]+BIRTH\b)[\s:]*(\d{2}[-/]\d{2}[-/]\d{4})"
    ).unwrap();

    // Vehicle document (certificado de circulación)
    static ref PLATE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:PLACA|PLATE)\b(?:[ \t]+(?:N[°ºO]\.?|NUMBER|N[UÚ]MERO))?[ \t]*:?[ \t]*([A-Z0-9]{6,8})\b"
    ).unwrap();

    static ref SERIAL_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:SERIAL(?:[ \t]+(?:DE[ \t]+)?(?:CARROCER[IÍ]A|CHASIS))?|CARROCER[IÍ]A|BODY)\b(?:[ \t]+(?:N[°ºO]\.?|NUMBER|N[UÚ]MERO))?[ \t]*:?[ \t]*([A-Z0-9]{10,17})\b"
    ).unwrap();

    static ref YEAR_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:A[ÑN]O(?:[ \t]+MODELO)?|YEAR|MODELO)\b[\s:]*(\d{4})\b"
    ).unwrap();

    static ref MODEL_PATTERN: Regex = Regex::new(
        r"(?i)\bMODELO?\b[ \t]*:?[ \t]*([A-ZÁÉÍÓÚÜÑ][A-Z0-9ÁÉÍÓÚÜÑ\-]*(?:[ \t]+[A-Z0-9ÁÉÍÓÚÜÑ\-]+)*)"
    ).unwrap();

    static ref COLOR_PATTERN: Regex = Regex::new(
        r"(?i)\bCOLOR(?:ES)?\b[ \t]*:?[ \t]*([A-ZÁÉÍÓÚÜÑ]+(?:[ \t]+[A-ZÁÉÍÓÚÜÑ]+)*)"
    ).unwrap();
}

// Words that introduce a field. A free-text capture stops at the first of these
// so that a following label on the same line is not taken as part of the value.
const FIELD_LABELS: &[&str] = &[
    "NOMBRE", "NOMBRES", "APELLIDO", "APELLIDOS", "FIRST", "LAST", "GIVEN", "NAME", "NAMES",
    "SURNAME", "SURNAMES", "FECHA", "NACIMIENTO", "DATE", "CEDULA", "CÉDULA", "IDENTIDAD",
    "NACIONALIDAD", "SEXO", "ESTADO", "CIVIL", "PLACA", "PLATE", "SERIAL", "CARROCERIA",
    "CARROCERÍA", "MOTOR", "MARCA", "MODELO", "MODEL", "AÑO", "YEAR", "COLOR", "COLORES",
    "TIPO", "USO", "CLASE", "NO", "NUMBER", "NUMERO", "NÚMERO",
];

pub fn is_field_label(word: &str) -> bool {
    let upper = word.trim().to_uppercase();
    FIELD_LABELS.iter().any(|label| *label == upper)
}

/// Regex based extraction of named fields from recognized text.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Document number without its `V`/`E` nationality prefix.
    pub fn document_number(text: &str) -> String {
        Self::first_capture(&DOCUMENT_NUMBER_PATTERN, text)
    }

    pub fn first_name(text: &str) -> String {
        Self::first_free_text(&FIRST_NAME_PATTERN, text)
    }

    pub fn last_name(text: &str) -> String {
        Self::first_free_text(&LAST_NAME_PATTERN, text)
    }

    pub fn date_of_birth(text: &str) -> String {
        Self::first_capture(&DATE_OF_BIRTH_PATTERN, text)
    }

    pub fn plate(text: &str) -> String {
        Self::first_code(&PLATE_PATTERN, text)
    }

    pub fn serial_number(text: &str) -> String {
        Self::first_code(&SERIAL_PATTERN, text)
    }

    pub fn year(text: &str) -> String {
        Self::first_capture(&YEAR_PATTERN, text)
    }

    pub fn model(text: &str) -> String {
        Self::first_free_text(&MODEL_PATTERN, text)
    }

    pub fn color(text: &str) -> String {
        Self::first_free_text(&COLOR_PATTERN, text)
    }

    fn first_capture(pattern: &Regex, text: &str) -> String {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }

    /// First single-word capture that is not itself a field label, upper-cased.
    fn first_code(pattern: &Regex, text: &str) -> String {
        pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|m| m.as_str().trim())
            .find(|value| !value.is_empty() && !is_field_label(value))
            .map(|value| value.to_uppercase())
            .unwrap_or_default()
    }

    /// First capture that still holds a value once cut at the next field label.
    fn first_free_text(pattern: &Regex, text: &str) -> String {
        pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|m| Self::cut_at_label(m.as_str()))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    fn cut_at_label(value: &str) -> String {
        value
            .split_whitespace()
            .take_while(|word| !is_field_label(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn extract_identity(result: &RecognitionResult) -> IdentityFields {
    let text = result.text.as_str();
    let fields = IdentityFields {
        document_number: FieldExtractor::document_number(text),
        first_name: FieldExtractor::first_name(text),
        last_name: FieldExtractor::last_name(text),
        date_of_birth: FieldExtractor::date_of_birth(text),
        confidence: result.confidence,
    };
    debug!("Extracted identity fields: {:?}", fields);
    fields
}

pub fn extract_vehicle(result: &RecognitionResult) -> VehicleFields {
    let text = result.text.as_str();
    let fields = VehicleFields {
        plate: FieldExtractor::plate(text),
        serial_number: FieldExtractor::serial_number(text),
        year: FieldExtractor::year(text),
        model: FieldExtractor::model(text),
        color: FieldExtractor::color(text),
        confidence: result.confidence,
    };
    debug!("Extracted vehicle fields: {:?}", fields);
    fields
}

pub fn extract(kind: DocumentKind, result: &RecognitionResult) -> ExtractedFields {
    match kind {
        DocumentKind::Identity => ExtractedFields::Identity(extract_identity(result)),
        DocumentKind::Vehicle => ExtractedFields::Vehicle(extract_vehicle(result)),
    }
}
