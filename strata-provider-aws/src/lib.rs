//! Strata AWS Provider
//!
//! S3 resource schemas and the SecureBucket component

pub mod schemas;
pub mod secure_bucket;

use strata_core::host::{ComponentF, ComponentProvider, HostError, ProviderBuilder};

pub use secure_bucket::{SecureBucket, SecureBucketArgs, Toggle};

/// Namespace the components are published under
pub const NAMESPACE: &str = "example-org";

/// Build the component provider serving SecureBucket
pub fn component_provider() -> Result<ComponentProvider, HostError> {
    ProviderBuilder::new()
        .with_namespace(NAMESPACE)
        .with_component(ComponentF::<SecureBucket>::new())
        .with_resource_schemas(schemas::all_schemas())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::host::protocol::{ConstructRequest, WireOptions};
    use strata_core::host::{Component, PackageInfo};

    fn construct(name: &str, inputs: serde_json::Value) -> ConstructRequest {
        ConstructRequest {
            type_token: SecureBucket::TYPE.to_string(),
            name: name.to_string(),
            inputs: inputs.as_object().cloned().unwrap(),
            options: WireOptions::default(),
        }
    }

    #[test]
    fn provider_serves_secure_bucket() {
        let provider = component_provider().unwrap();
        assert_eq!(provider.namespace(), NAMESPACE);
        assert_eq!(
            provider.component_types().collect::<Vec<_>>(),
            vec!["custom:module:SecureBucket"]
        );

        let schema = provider.schema(&PackageInfo::new("strata-components", "0.0.1"));
        assert_eq!(
            schema["resources"]["custom:module:SecureBucket"]["isComponent"],
            true
        );
    }

    #[test]
    fn construct_reports_pending_output() {
        let provider = component_provider().unwrap();
        let result = provider
            .construct(construct("logs", serde_json::json!({ "encryption": false })))
            .unwrap();

        assert_eq!(result.urn, "custom:module:SecureBucket::logs");
        assert_eq!(
            result.outputs["bucketName"],
            serde_json::json!({ "$unknown": { "resource": "aws.s3.bucket::logs", "attribute": "id" } })
        );
        assert_eq!(result.resources.len(), 3);
    }

    #[test]
    fn repeated_construct_registers_the_same_resources() {
        let provider = component_provider().unwrap();
        let inputs = serde_json::json!({ "versioning": false, "tags": { "team": "x" } });

        let first = provider.construct(construct("logs", inputs.clone())).unwrap();
        let second = provider.construct(construct("logs", inputs)).unwrap();

        assert_eq!(first.resources, second.resources);
        assert_eq!(first.outputs, second.outputs);
    }

    #[test]
    fn renamed_bucket_output_follows_the_bucket() {
        let provider = component_provider().unwrap();
        let before = provider
            .construct(construct("logs", serde_json::json!({ "bucketName": "aaa-logs" })))
            .unwrap();
        let after = provider
            .construct(construct("logs", serde_json::json!({ "bucketName": "bbb-logs" })))
            .unwrap();

        let bucket = |result: &strata_core::host::protocol::ConstructResult| {
            result
                .resources
                .iter()
                .find(|r| r.urn == "aws.s3.bucket::logs")
                .map(|r| r.inputs["bucket"].clone())
        };
        assert_eq!(bucket(&before), Some(serde_json::json!("aaa-logs")));
        assert_eq!(bucket(&after), Some(serde_json::json!("bbb-logs")));

        // The output never carries a name of its own; it points at the bucket's id
        let reference = serde_json::json!({
            "$unknown": { "resource": "aws.s3.bucket::logs", "attribute": "id" }
        });
        assert_eq!(before.outputs["bucketName"], reference);
        assert_eq!(after.outputs["bucketName"], reference);
    }

    #[test]
    fn construct_validates_child_schemas() {
        let provider = component_provider().unwrap();
        let err = provider
            .construct(construct("logs", serde_json::json!({ "bucketName": "x" })))
            .err()
            .unwrap();
        assert!(err.to_string().contains("between 3 and 63"));
    }
}
