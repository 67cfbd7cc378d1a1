//! Output - Values that become known only after a resource is created
//!
//! A component hands its outputs back to the host before any resource exists.
//! An [`Output`] is therefore either already known or a forward reference to
//! an attribute of another resource, which the host resolves once that
//! resource has been created.

use crate::resource::ResourceId;

/// Reference to an attribute of a registered resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub resource: ResourceId,
    pub attribute: String,
}

/// String-valued output
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Known(String),
    Pending(OutputRef),
}

impl Output {
    pub fn known(value: impl Into<String>) -> Self {
        Output::Known(value.into())
    }

    pub fn pending(resource: ResourceId, attribute: impl Into<String>) -> Self {
        Output::Pending(OutputRef {
            resource,
            attribute: attribute.into(),
        })
    }

    /// Wire form: a plain string, or an `$unknown` marker naming what it waits on
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Output::Known(v) => serde_json::Value::String(v.clone()),
            Output::Pending(r) => serde_json::json!({
                "$unknown": {
                    "resource": r.resource.to_string(),
                    "attribute": r.attribute,
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form() {
        let id = ResourceId::new("aws.s3.bucket", "logs");
        assert_eq!(
            Output::pending(id, "id").to_json(),
            serde_json::json!({
                "$unknown": { "resource": "aws.s3.bucket::logs", "attribute": "id" }
            })
        );
        assert_eq!(Output::known("x").to_json(), serde_json::json!("x"));
    }
}
