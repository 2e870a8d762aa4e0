use log::info;

use crate::models::ExtractedFields;
use crate::utils::ScanError;

pub struct ConfirmationValidator;

impl ConfirmationValidator {
    /// The only check made before handing fields out: the primary document
    /// field must hold something other than whitespace.
    pub fn validate(fields: &ExtractedFields) -> Result<(), ScanError> {
        let (name, value) = fields.primary_field();
        if value.trim().is_empty() {
            return Err(ScanError::MissingPrimaryField(name));
        }
        Ok(())
    }
}

/// Hands a copy of the finalized fields to `on_confirm`. Nothing is persisted here.
pub fn confirm<F>(fields: &ExtractedFields, on_confirm: F) -> Result<(), ScanError>
where
    F: FnOnce(ExtractedFields),
{
    ConfirmationValidator::validate(fields)?;
    info!(
        "Confirmed {} fields (confidence {})",
        fields.kind(),
        fields.confidence()
    );
    on_confirm(fields.clone());
    Ok(())
}
