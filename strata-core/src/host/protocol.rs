//! Wire types for the plugin protocol
//!
//! One JSON request per line on stdin, one JSON response per line on stdout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::ResourceOptions;
use crate::graph::DependencyGraph;
use crate::resource::{Resource, ResourceId};

/// Protocol version announced in the handshake
pub const PROTOCOL_VERSION: u32 = 1;

/// Prefix of the handshake line
pub const HANDSHAKE_PREFIX: &str = "STRATA_PROVIDER";

/// `STRATA_PROVIDER|<protocol>|<name>|<version>`
pub fn handshake(name: &str, version: &str) -> String {
    format!("{}|{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, name, version)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Request {
    GetSchema,
    Construct(ConstructRequest),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstructRequest {
    #[serde(rename = "type")]
    pub type_token: String,
    pub name: String,
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub options: WireOptions,
}

/// Resource options as sent by the host; resources are named `type::name`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOptions {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl WireOptions {
    pub fn into_options(self) -> Result<ResourceOptions, String> {
        let parse = |s: &str| {
            ResourceId::parse(s).ok_or_else(|| format!("invalid resource reference '{}'", s))
        };

        let mut options = ResourceOptions::new();
        if let Some(parent) = &self.parent {
            options = options.parent(parse(parent)?);
        }
        for dep in &self.depends_on {
            options = options.depends_on(parse(dep)?);
        }
        if let Some(provider) = self.provider {
            options = options.provider(provider);
        }
        Ok(options)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    Result(ResponseBody),
    Error(ErrorBody),
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(ErrorBody {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Schema { schema: serde_json::Value },
    Construct(ConstructResult),
    Cancelled { cancelled: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructResult {
    pub urn: String,
    pub outputs: BTreeMap<String, serde_json::Value>,
    pub resources: Vec<RegisteredResource>,
}

/// One registration reported back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResource {
    pub urn: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub parent: Option<String>,
    pub dependencies: Vec<String>,
    pub provider: Option<String>,
    pub component: bool,
    pub inputs: serde_json::Value,
}

impl RegisteredResource {
    pub fn new(resource: &Resource, graph: &DependencyGraph) -> Self {
        let mut dependencies: Vec<String> = graph
            .dependencies_of(&resource.id)
            .iter()
            .map(|d| d.target.to_string())
            .collect();
        dependencies.sort();
        dependencies.dedup();

        let mut keys: Vec<_> = resource.attributes.keys().collect();
        keys.sort();
        let inputs = keys
            .into_iter()
            .map(|k| (k.clone(), resource.attributes[k].to_json()))
            .collect::<serde_json::Map<_, _>>();

        Self {
            urn: resource.id.to_string(),
            resource_type: resource.id.resource_type.clone(),
            name: resource.id.name.clone(),
            parent: resource.parent.as_ref().map(ToString::to_string),
            dependencies,
            provider: resource.provider.clone(),
            component: resource.is_component(),
            inputs: serde_json::Value::Object(inputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_requests() {
        let req: Request = serde_json::from_str(r#"{"method":"getSchema"}"#).unwrap();
        assert_eq!(req, Request::GetSchema);

        let req: Request = serde_json::from_str(
            r#"{"method":"construct","type":"custom:module:SecureBucket","name":"logs",
                "inputs":{"versioning":false},
                "options":{"dependsOn":["aws.s3.bucket::shared"],"provider":"aws-west"}}"#,
        )
        .unwrap();
        let Request::Construct(construct) = req else {
            panic!("Expected construct");
        };
        assert_eq!(construct.type_token, "custom:module:SecureBucket");
        assert_eq!(construct.inputs["versioning"], false);

        let options = construct.options.into_options().unwrap();
        assert_eq!(
            options.depends_on,
            vec![ResourceId::new("aws.s3.bucket", "shared")]
        );
        assert_eq!(options.provider.as_deref(), Some("aws-west"));
    }

    #[test]
    fn construct_defaults_inputs_and_options() {
        let req: Request =
            serde_json::from_str(r#"{"method":"construct","type":"t:m:T","name":"x"}"#).unwrap();
        let Request::Construct(construct) = req else {
            panic!("Expected construct");
        };
        assert!(construct.inputs.is_empty());
        assert_eq!(construct.options, WireOptions::default());
    }

    #[test]
    fn rejects_invalid_parent_reference() {
        let options = WireOptions {
            parent: Some("not-a-reference".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.into_options().unwrap_err(),
            "invalid resource reference 'not-a-reference'"
        );
    }

    #[test]
    fn serializes_responses() {
        let ok = Response::Result(ResponseBody::Cancelled { cancelled: true });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "result": { "cancelled": true } })
        );
        assert_eq!(
            serde_json::to_value(Response::error("boom")).unwrap(),
            serde_json::json!({ "error": { "message": "boom" } })
        );
    }

    #[test]
    fn handshake_line() {
        assert_eq!(handshake("strata-components", "0.0.1"), "STRATA_PROVIDER|1|strata-components|0.0.1");
    }
}
