//! SecureBucket - An S3 bucket with versioning and encryption on by default
//!
//! The component registers itself, a primary `aws.s3.bucket` and, unless the
//! caller turns them off, a versioning configuration and a default
//! server-side encryption configuration. Both sub-resources point at the
//! bucket through a reference to its `id`, so they are ordered after it.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use strata_core::context::{Context, ContextResult, ResourceOptions};
use strata_core::host::{Component, ComponentSchema};
use strata_core::output::Output;
use strata_core::resource::{ResourceId, Value};
use strata_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types as core_types};

use crate::schemas::s3::{BUCKET, BUCKET_ENCRYPTION, BUCKET_VERSIONING};
use crate::schemas::types;

/// Tag every SecureBucket carries unless the caller overrides it
pub const MANAGED_BY_TAG: (&str, &str) = ("ManagedBy", "Pulumi");

/// Optional boolean flag
///
/// `Unset` and `Enabled` both turn the feature on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<bool>")]
pub enum Toggle {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl Toggle {
    pub fn is_enabled(self) -> bool {
        self != Toggle::Disabled
    }
}

impl From<Option<bool>> for Toggle {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Toggle::Unset,
            Some(true) => Toggle::Enabled,
            Some(false) => Toggle::Disabled,
        }
    }
}

/// Configuration of a SecureBucket
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureBucketArgs {
    /// Explicit bucket name; generated by the provider when absent
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub versioning: Toggle,
    #[serde(default)]
    pub encryption: Toggle,
    pub tags: Option<BTreeMap<String, String>>,
}

impl SecureBucketArgs {
    /// Default tags overlaid with the caller's; the caller wins on collision
    pub fn effective_tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::from([(MANAGED_BY_TAG.0.to_string(), MANAGED_BY_TAG.1.to_string())]);
        if let Some(extra) = &self.tags {
            tags.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        tags
    }
}

/// A registered SecureBucket
#[derive(Debug, Clone)]
pub struct SecureBucket {
    id: ResourceId,
    bucket: ResourceId,
    /// Identifier of the primary bucket, known once it is created
    pub bucket_name: Output,
}

impl SecureBucket {
    pub fn new(
        ctx: &mut Context,
        name: &str,
        args: SecureBucketArgs,
        options: &ResourceOptions,
    ) -> ContextResult<Self> {
        let id = ctx.register_component(Self::TYPE, name, options)?;
        let child = options.for_child(&id);

        let tags: HashMap<String, Value> = args
            .effective_tags()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let mut attributes = HashMap::from([("tags".to_string(), Value::Map(tags))]);
        if let Some(bucket_name) = &args.bucket_name {
            attributes.insert("bucket".to_string(), Value::string(bucket_name));
        }
        let bucket = ctx.register_resource(BUCKET, name, attributes, &child)?;

        if args.versioning.is_enabled() {
            let attributes = HashMap::from([
                ("bucket".to_string(), Value::resource_ref(bucket.clone(), "id")),
                (
                    "versioning_configuration".to_string(),
                    Value::Map(HashMap::from([(
                        "status".to_string(),
                        Value::string("Enabled"),
                    )])),
                ),
            ]);
            ctx.register_resource(
                BUCKET_VERSIONING,
                &format!("{}-versioning", name),
                attributes,
                &child,
            )?;
        }

        if args.encryption.is_enabled() {
            let by_default = Value::Map(HashMap::from([(
                "sse_algorithm".to_string(),
                Value::string("AES256"),
            )]));
            let rule = Value::Map(HashMap::from([(
                "apply_server_side_encryption_by_default".to_string(),
                by_default,
            )]));
            let attributes = HashMap::from([
                ("bucket".to_string(), Value::resource_ref(bucket.clone(), "id")),
                ("rules".to_string(), Value::List(vec![rule])),
            ]);
            ctx.register_resource(
                BUCKET_ENCRYPTION,
                &format!("{}-encryption", name),
                attributes,
                &child,
            )?;
        }

        let bucket_name = Output::pending(bucket.clone(), "id");
        ctx.register_outputs(
            &id,
            BTreeMap::from([("bucketName".to_string(), bucket_name.clone())]),
        )?;

        tracing::debug!(
            component = %id,
            versioning = args.versioning.is_enabled(),
            encryption = args.encryption.is_enabled(),
            "secure bucket registered"
        );

        Ok(Self {
            id,
            bucket,
            bucket_name,
        })
    }

    /// The primary bucket
    pub fn bucket(&self) -> &ResourceId {
        &self.bucket
    }
}

impl Component for SecureBucket {
    const TYPE: &'static str = "custom:module:SecureBucket";
    type Args = SecureBucketArgs;

    fn schema() -> ComponentSchema {
        let inputs = ResourceSchema::new(Self::TYPE)
            .with_description("An S3 bucket with versioning and AES256 encryption enabled by default")
            .attribute(
                AttributeSchema::new("bucketName", types::s3_bucket_name())
                    .with_description("Bucket name; generated when omitted"),
            )
            .attribute(
                AttributeSchema::new("versioning", AttributeType::Bool)
                    .with_default(Value::Bool(true))
                    .with_description("Enable object versioning"),
            )
            .attribute(
                AttributeSchema::new("encryption", AttributeType::Bool)
                    .with_default(Value::Bool(true))
                    .with_description("Enable AES256 server-side encryption"),
            )
            .attribute(
                AttributeSchema::new("tags", core_types::string_map())
                    .with_description("Extra tags, merged over ManagedBy=Pulumi"),
            )
            .strict();

        ComponentSchema::new(inputs).output(
            AttributeSchema::new("bucketName", AttributeType::String)
                .with_description("Name of the created bucket"),
        )
    }

    fn construct(
        ctx: &mut Context,
        name: &str,
        args: SecureBucketArgs,
        options: &ResourceOptions,
    ) -> ContextResult<Self> {
        Self::new(ctx, name, args, options)
    }

    fn id(&self) -> &ResourceId {
        &self.id
    }
}
