//! Resource - Representing resources and their state

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "aws.s3.bucket", "custom:module:SecureBucket")
    pub resource_type: String,
    /// Logical name given by the caller
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Parse the `type::name` form produced by `Display`
    pub fn parse(s: &str) -> Option<Self> {
        let (resource_type, name) = s.rsplit_once("::")?;
        if resource_type.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(resource_type, name))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute, known only once that resource exists
    ResourceRef {
        target: ResourceId,
        attribute: String,
    },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn resource_ref(target: ResourceId, attribute: impl Into<String>) -> Self {
        Value::ResourceRef {
            target,
            attribute: attribute.into(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Collect every resource reference contained in this value
    pub fn references(&self) -> Vec<(&ResourceId, &str)> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<(&'a ResourceId, &'a str)>) {
        match self {
            Value::ResourceRef { target, attribute } => refs.push((target, attribute)),
            Value::List(items) => items.iter().for_each(|v| v.collect_references(refs)),
            Value::Map(map) => map.values().for_each(|v| v.collect_references(refs)),
            _ => {}
        }
    }

    /// Convert to the JSON form used on the wire.
    ///
    /// Unresolved references become `{"$ref": {"resource": ..., "attribute": ...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                serde_json::Value::Object(
                    keys.into_iter()
                        .map(|k| (k.clone(), map[k].to_json()))
                        .collect(),
                )
            }
            Value::ResourceRef { target, attribute } => serde_json::json!({
                "$ref": { "resource": target.to_string(), "attribute": attribute }
            }),
        }
    }

    /// Convert a JSON value received from the host.
    ///
    /// `null` has no counterpart and yields `Ok(None)`; callers treat it as absent.
    pub fn from_json(json: &serde_json::Value) -> Result<Option<Value>, String> {
        let value = match json {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => return Err(format!("unsupported number '{}'", n)),
            },
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = Value::from_json(item)? {
                        list.push(v);
                    }
                }
                Value::List(list)
            }
            serde_json::Value::Object(map) => {
                let mut out = HashMap::new();
                for (k, v) in map {
                    if let Some(v) = Value::from_json(v)? {
                        out.insert(k.clone(), v);
                    }
                }
                Value::Map(out)
            }
        };
        Ok(Some(value))
    }
}

/// Desired state of a single registration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// Component this resource was registered under
    pub parent: Option<ResourceId>,
    /// Explicit ordering dependencies (in addition to references in attributes)
    pub dependencies: Vec<ResourceId>,
    /// Provider binding inherited from resource options
    pub provider: Option<String>,
    /// Components are logical grouping nodes, not provider-managed resources
    pub component: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            parent: None,
            dependencies: Vec::new(),
            provider: None,
            component: false,
        }
    }

    /// Create a component (grouping) resource
    pub fn component(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component: true,
            ..Self::new(resource_type, name)
        }
    }

    pub fn with_dependency(mut self, dependency: ResourceId) -> Self {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Returns true if this is a component rather than a provider-managed resource
    pub fn is_component(&self) -> bool {
        self.component
    }

    /// Data dependencies as `(attribute using the reference, target, referenced attribute)`
    pub fn references(&self) -> Vec<(&str, &ResourceId, &str)> {
        let mut keys: Vec<_> = self.attributes.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|key| {
                self.attributes[key]
                    .references()
                    .into_iter()
                    .map(move |(target, attr)| (key.as_str(), target, attr))
            })
            .collect()
    }
}
