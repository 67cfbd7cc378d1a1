//! Context - Records the registrations a component makes
//!
//! A component factory never talks to a cloud API. It describes the shape it
//! wants by registering resources into a [`Context`], which validates names and
//! attributes, records parent/child relationships and builds the dependency
//! graph the rest of the pipeline orders work by.

use std::collections::{BTreeMap, HashMap};

use crate::graph::{Dependency, DependencyGraph};
use crate::output::Output;
use crate::resource::{Resource, ResourceId, Value};
use crate::schema::{ResourceSchema, TypeError};

/// Relationship hints applied to a registration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceOptions {
    pub parent: Option<ResourceId>,
    pub depends_on: Vec<ResourceId>,
    pub provider: Option<String>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: ResourceId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn depends_on(mut self, dependency: ResourceId) -> Self {
        self.depends_on.push(dependency);
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Options for a child of `parent`: parent replaced, everything else inherited
    pub fn for_child(&self, parent: &ResourceId) -> Self {
        Self {
            parent: Some(parent.clone()),
            depends_on: self.depends_on.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// Errors raised while registering resources
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("Duplicate resource: {0} is already registered")]
    DuplicateResource(ResourceId),

    #[error("Invalid resource name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("{id}: {}", join_errors(.errors))]
    Schema { id: ResourceId, errors: Vec<TypeError> },

    #[error("{id}: invalid inputs: {message}")]
    InvalidInputs { id: ResourceId, message: String },

    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("Dependency cycle between: {}", join_ids(.0))]
    Cycle(Vec<ResourceId>),
}

fn join_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ContextResult<T> = Result<T, ContextError>;

/// Validate a logical resource name
pub fn validate_name(name: &str) -> ContextResult<()> {
    let invalid = |reason: &str| ContextError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.contains("::") {
        return Err(invalid("name must not contain '::'"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("name must not contain whitespace or control characters"));
    }
    Ok(())
}

/// Deployment context for one component construction
#[derive(Debug, Default)]
pub struct Context {
    schemas: HashMap<String, ResourceSchema>,
    resources: Vec<Resource>,
    index: HashMap<ResourceId, usize>,
    graph: DependencyGraph,
    outputs: HashMap<ResourceId, BTreeMap<String, Output>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that validates registrations against `schemas`
    pub fn with_schemas(schemas: impl IntoIterator<Item = ResourceSchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.resource_type.clone(), s))
                .collect(),
            ..Self::default()
        }
    }

    /// Register a component (grouping) resource
    pub fn register_component(
        &mut self,
        resource_type: &str,
        name: &str,
        options: &ResourceOptions,
    ) -> ContextResult<ResourceId> {
        let resource = Resource::component(resource_type, name);
        self.register(resource, options)
    }

    /// Register a provider-managed resource
    pub fn register_resource(
        &mut self,
        resource_type: &str,
        name: &str,
        attributes: HashMap<String, Value>,
        options: &ResourceOptions,
    ) -> ContextResult<ResourceId> {
        let mut resource = Resource::new(resource_type, name);
        resource.attributes = attributes;

        if let Some(schema) = self.schemas.get(resource_type)
            && let Err(errors) = schema.validate(&resource.attributes)
        {
            return Err(ContextError::Schema {
                id: resource.id,
                errors,
            });
        }

        self.register(resource, options)
    }

    fn register(&mut self, mut resource: Resource, options: &ResourceOptions) -> ContextResult<ResourceId> {
        validate_name(&resource.id.name)?;
        if self.index.contains_key(&resource.id) {
            return Err(ContextError::DuplicateResource(resource.id));
        }

        resource.parent = options.parent.clone();
        resource.provider = options.provider.clone();
        for dep in &options.depends_on {
            resource = resource.with_dependency(dep.clone());
        }

        let id = resource.id.clone();
        for (used_in, target, attribute) in resource.references() {
            self.graph
                .add_edge(id.clone(), Dependency::data(target.clone(), attribute, used_in));
        }
        for dep in &resource.dependencies {
            self.graph.add_edge(id.clone(), Dependency::ordering(dep.clone()));
        }

        tracing::debug!(
            resource = %id,
            parent = ?resource.parent.as_ref().map(ToString::to_string),
            component = resource.component,
            "registered resource"
        );

        self.index.insert(id.clone(), self.resources.len());
        self.resources.push(resource);
        Ok(id)
    }

    /// Record the outputs of a registered component
    pub fn register_outputs(
        &mut self,
        id: &ResourceId,
        outputs: BTreeMap<String, Output>,
    ) -> ContextResult<()> {
        if !self.index.contains_key(id) {
            return Err(ContextError::UnknownResource(id.clone()));
        }
        self.outputs.entry(id.clone()).or_default().extend(outputs);
        Ok(())
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    /// All registrations in registration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Registrations whose parent is `id`
    pub fn children_of(&self, id: &ResourceId) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.parent.as_ref() == Some(id))
            .collect()
    }

    pub fn outputs_of(&self, id: &ResourceId) -> Option<&BTreeMap<String, Output>> {
        self.outputs.get(id)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Registrations ordered so each comes after everything it depends on
    pub fn ordered_resources(&self) -> ContextResult<Vec<Resource>> {
        let ids: Vec<ResourceId> = self.resources.iter().map(|r| r.id.clone()).collect();
        let order = self
            .graph
            .topological_order(&ids)
            .map_err(ContextError::Cycle)?;
        Ok(order
            .iter()
            .filter_map(|id| self.get(id).cloned())
            .collect())
    }
}
