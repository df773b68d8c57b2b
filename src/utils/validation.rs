use crate::domain::model::FundingRecord;
use crate::utils::error::{FundingError, Result};
use url::Url;

/// Fields a funding entry must carry before it is sent to the store.
pub const REQUIRED_FIELDS: [&str; 3] = ["Name", "Technology", "Total Funding"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(FundingError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(FundingError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(FundingError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FundingError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FundingError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(FundingError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_allowed_values(field_name: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    for value in values {
        if !allowed.contains(&value.as_str()) {
            return Err(FundingError::InvalidConfigValue {
                field: field_name.to_string(),
                value: value.clone(),
                reason: format!("Unsupported value. Allowed values: {}", allowed.join(", ")),
            });
        }
    }
    Ok(())
}

/// A new entry must carry every required field with a non-blank value.
pub fn validate_new_record(record: &FundingRecord) -> Result<()> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !record.has_field(field))
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(FundingError::MissingRequiredFields { fields: missing });
    }

    if record.id().is_some() {
        return Err(FundingError::Validation {
            message: "New funding entries must not carry an id".to_string(),
        });
    }

    Ok(())
}

/// A partial update may omit required fields, but may not blank them out.
pub fn validate_patch(patch: &FundingRecord) -> Result<()> {
    if patch.data.is_empty() {
        return Err(FundingError::Validation {
            message: "Update contains no fields".to_string(),
        });
    }

    let blanked: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| patch.data.contains_key(**field) && !patch.has_field(field))
        .map(|field| field.to_string())
        .collect();

    if !blanked.is_empty() {
        return Err(FundingError::MissingRequiredFields { fields: blanked });
    }

    Ok(())
}
