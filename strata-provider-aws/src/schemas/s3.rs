//! S3 schema definitions

use strata_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types as core_types};

use super::types;

pub const BUCKET: &str = "aws.s3.bucket";
pub const BUCKET_VERSIONING: &str = "aws.s3.bucket_versioning";
pub const BUCKET_ENCRYPTION: &str = "aws.s3.bucket_server_side_encryption_configuration";

/// Returns the schema for S3 buckets
pub fn bucket_schema() -> ResourceSchema {
    ResourceSchema::new(BUCKET)
        .with_description("An S3 bucket for object storage")
        .attribute(
            AttributeSchema::new("bucket", types::s3_bucket_name())
                .with_description("Bucket name (generated from the resource name if not specified)"),
        )
        .attribute(
            AttributeSchema::new("tags", core_types::string_map())
                .with_description("Tags assigned to the bucket"),
        )
}

/// Returns the schema for bucket versioning configuration
pub fn bucket_versioning_schema() -> ResourceSchema {
    ResourceSchema::new(BUCKET_VERSIONING)
        .with_description("Versioning state of an S3 bucket")
        .attribute(
            AttributeSchema::new("bucket", AttributeType::String)
                .required()
                .with_description("Name of the bucket"),
        )
        .attribute(
            AttributeSchema::new(
                "versioning_configuration",
                AttributeType::Struct {
                    name: "VersioningConfiguration".to_string(),
                    fields: vec![AttributeSchema::new("status", types::versioning_status()).required()],
                },
            )
            .required(),
        )
}

/// Returns the schema for bucket server-side encryption configuration
pub fn bucket_encryption_schema() -> ResourceSchema {
    let by_default = AttributeType::Struct {
        name: "ApplyServerSideEncryptionByDefault".to_string(),
        fields: vec![
            AttributeSchema::new("sse_algorithm", types::sse_algorithm()).required(),
            AttributeSchema::new("kms_master_key_id", AttributeType::String),
        ],
    };
    let rule = AttributeType::Struct {
        name: "ServerSideEncryptionRule".to_string(),
        fields: vec![
            AttributeSchema::new("apply_server_side_encryption_by_default", by_default),
            AttributeSchema::new("bucket_key_enabled", AttributeType::Bool),
        ],
    };

    ResourceSchema::new(BUCKET_ENCRYPTION)
        .with_description("Default server-side encryption of an S3 bucket")
        .attribute(
            AttributeSchema::new("bucket", AttributeType::String)
                .required()
                .with_description("Name of the bucket"),
        )
        .attribute(AttributeSchema::new("rules", AttributeType::List(Box::new(rule))).required())
}

/// Returns all S3-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        bucket_schema(),
        bucket_versioning_schema(),
        bucket_encryption_schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use strata_core::resource::{ResourceId, Value};

    fn bucket_ref() -> Value {
        Value::resource_ref(ResourceId::new(BUCKET, "logs"), "id")
    }

    #[test]
    fn name_is_optional() {
        let schema = bucket_schema();
        assert!(schema.validate(&HashMap::new()).is_ok());
    }

    #[test]
    fn invalid_bucket_name() {
        let schema = bucket_schema();
        let mut attrs = HashMap::new();
        attrs.insert("bucket".to_string(), Value::String("ab".to_string())); // too short

        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn tags_must_be_strings() {
        let schema = bucket_schema();
        let attrs = HashMap::from([(
            "tags".to_string(),
            Value::Map(HashMap::from([("cost".to_string(), Value::Int(3))])),
        )]);
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn versioning_with_reference() {
        let schema = bucket_versioning_schema();
        let attrs = HashMap::from([
            ("bucket".to_string(), bucket_ref()),
            (
                "versioning_configuration".to_string(),
                Value::Map(HashMap::from([(
                    "status".to_string(),
                    Value::string("Enabled"),
                )])),
            ),
        ]);
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn versioning_requires_configuration() {
        let schema = bucket_versioning_schema();
        let attrs = HashMap::from([("bucket".to_string(), bucket_ref())]);
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn encryption_rule_algorithm_is_checked() {
        let schema = bucket_encryption_schema();
        let rules = |algorithm: &str| {
            Value::List(vec![Value::Map(HashMap::from([(
                "apply_server_side_encryption_by_default".to_string(),
                Value::Map(HashMap::from([(
                    "sse_algorithm".to_string(),
                    Value::string(algorithm),
                )])),
            )]))])
        };

        let ok = HashMap::from([
            ("bucket".to_string(), bucket_ref()),
            ("rules".to_string(), rules("AES256")),
        ]);
        assert!(schema.validate(&ok).is_ok());

        let bad = HashMap::from([
            ("bucket".to_string(), bucket_ref()),
            ("rules".to_string(), rules("DES")),
        ]);
        assert!(schema.validate(&bad).is_err());
    }
}
