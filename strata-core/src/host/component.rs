//! Component factories
//!
//! A [`Component`] is a typed constructor: it takes decoded arguments and
//! registers its resources into a [`Context`]. [`ComponentF`] adapts it to the
//! untyped [`ComponentFactory`] the host dispatches to, validating the raw
//! inputs against the component's schema before decoding them.

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::context::{Context, ContextError, ContextResult, ResourceOptions};
use crate::resource::{ResourceId, Value};
use crate::schema::{AttributeSchema, ResourceSchema};

/// Inputs and outputs a component publishes to the host
#[derive(Debug, Clone)]
pub struct ComponentSchema {
    pub inputs: ResourceSchema,
    pub outputs: Vec<AttributeSchema>,
}

impl ComponentSchema {
    pub fn new(inputs: ResourceSchema) -> Self {
        Self {
            inputs,
            outputs: Vec::new(),
        }
    }

    pub fn output(mut self, output: AttributeSchema) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut required_inputs: Vec<&str> = self
            .inputs
            .attributes
            .values()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect();
        required_inputs.sort();

        let properties: serde_json::Map<String, serde_json::Value> = self
            .outputs
            .iter()
            .map(|o| (o.name.clone(), o.to_json()))
            .collect();
        let required: Vec<&str> = self.outputs.iter().map(|o| o.name.as_str()).collect();

        serde_json::json!({
            "isComponent": true,
            "description": self.inputs.description,
            "inputProperties": self.inputs.properties_json(),
            "requiredInputs": required_inputs,
            "properties": properties,
            "required": required,
        })
    }
}

/// Typed component constructor
pub trait Component: Sized {
    /// Type token the component registers under (e.g., "custom:module:SecureBucket")
    const TYPE: &'static str;

    /// Decoded configuration record
    type Args: DeserializeOwned;

    fn schema() -> ComponentSchema;

    fn construct(
        ctx: &mut Context,
        name: &str,
        args: Self::Args,
        options: &ResourceOptions,
    ) -> ContextResult<Self>;

    /// Identity of the registered component
    fn id(&self) -> &ResourceId;
}

/// Untyped factory the host dispatches construct requests to
pub trait ComponentFactory: Send + Sync {
    fn type_token(&self) -> &str;

    fn schema(&self) -> ComponentSchema;

    fn construct(
        &self,
        ctx: &mut Context,
        name: &str,
        inputs: &serde_json::Map<String, serde_json::Value>,
        options: &ResourceOptions,
    ) -> ContextResult<ResourceId>;
}

/// Adapts a [`Component`] into a [`ComponentFactory`]
pub struct ComponentF<C>(PhantomData<fn() -> C>);

impl<C: Component> ComponentF<C> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: Component> Default for ComponentF<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> ComponentFactory for ComponentF<C> {
    fn type_token(&self) -> &str {
        C::TYPE
    }

    fn schema(&self) -> ComponentSchema {
        C::schema()
    }

    fn construct(
        &self,
        ctx: &mut Context,
        name: &str,
        inputs: &serde_json::Map<String, serde_json::Value>,
        options: &ResourceOptions,
    ) -> ContextResult<ResourceId> {
        let id = ResourceId::new(C::TYPE, name);

        let mut attributes = HashMap::new();
        for (key, json) in inputs {
            let value = Value::from_json(json).map_err(|message| ContextError::InvalidInputs {
                id: id.clone(),
                message: format!("{}: {}", key, message),
            })?;
            if let Some(value) = value {
                attributes.insert(key.clone(), value);
            }
        }
        C::schema()
            .inputs
            .validate(&attributes)
            .map_err(|errors| ContextError::Schema {
                id: id.clone(),
                errors,
            })?;

        let args: C::Args = serde_json::from_value(serde_json::Value::Object(inputs.clone()))
            .map_err(|e| ContextError::InvalidInputs {
                id: id.clone(),
                message: e.to_string(),
            })?;

        let component = C::construct(ctx, name, args, options)?;
        Ok(component.id().clone())
    }
}
