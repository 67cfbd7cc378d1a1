//! AWS-specific type definitions

use std::sync::LazyLock;

use regex::Regex;
use strata_core::resource::Value;
use strata_core::schema::AttributeType;

/// Lowercase letters, digits, dots and hyphens; starts and ends alphanumeric
const BUCKET_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$";

static BUCKET_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(BUCKET_NAME_PATTERN).ok());

/// S3 bucket name (3-63 characters, DNS compatible)
pub fn s3_bucket_name() -> AttributeType {
    AttributeType::Custom {
        name: "BucketName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validate_bucket_name(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Validate an S3 bucket name
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.len() < 3 || name.len() > 63 {
        return Err(format!(
            "Invalid bucket name '{}': must be between 3 and 63 characters, got {}",
            name,
            name.len()
        ));
    }

    let re = BUCKET_NAME_RE
        .as_ref()
        .ok_or_else(|| "bucket name pattern failed to compile".to_string())?;
    if !re.is_match(name) {
        return Err(format!(
            "Invalid bucket name '{}': only lowercase letters, digits, '.' and '-' are allowed, \
             and it must start and end with a letter or digit",
            name
        ));
    }
    if name.contains("..") {
        return Err(format!(
            "Invalid bucket name '{}': must not contain consecutive periods",
            name
        ));
    }
    if name.split('.').count() == 4 && name.split('.').all(|p| p.parse::<u8>().is_ok()) {
        return Err(format!(
            "Invalid bucket name '{}': must not be formatted as an IP address",
            name
        ));
    }
    Ok(())
}

/// S3 bucket versioning status
/// - Enabled: Versioning is enabled
/// - Suspended: Versioning is suspended (previously enabled)
pub fn versioning_status() -> AttributeType {
    AttributeType::Enum(vec!["Enabled".to_string(), "Suspended".to_string()])
}

/// Server-side encryption algorithm
pub fn sse_algorithm() -> AttributeType {
    AttributeType::Enum(vec![
        "AES256".to_string(),
        "aws:kms".to_string(),
        "aws:kms:dsse".to_string(),
    ])
}
