//! Graph - Dependency edges between registered resources
//!
//! Every data reference and every explicit `depends_on` becomes an edge here.
//! Execution order is derived from this graph, never from registration order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::resource::ResourceId;

/// Dependency between resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Target resource
    pub target: ResourceId,
    /// Referenced attribute (e.g., "id"); `None` for explicit ordering edges
    pub attribute: Option<String>,
    /// Where this reference is used (e.g., "bucket")
    pub used_in: Option<String>,
}

impl Dependency {
    /// Edge carried by a reference in an attribute
    pub fn data(target: ResourceId, attribute: impl Into<String>, used_in: impl Into<String>) -> Self {
        Self {
            target,
            attribute: Some(attribute.into()),
            used_in: Some(used_in.into()),
        }
    }

    /// Edge declared through `depends_on`
    pub fn ordering(target: ResourceId) -> Self {
        Self {
            target,
            attribute: None,
            used_in: None,
        }
    }
}

/// Dependency graph for the resources of one deployment
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Resource -> list of dependencies
    pub edges: HashMap<ResourceId, Vec<Dependency>>,
    /// Reverse edges: target -> list of resources that depend on it
    pub reverse_edges: HashMap<ResourceId, Vec<ResourceId>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency edge
    pub fn add_edge(&mut self, from: ResourceId, dependency: Dependency) {
        let target = dependency.target.clone();
        let deps = self.edges.entry(from.clone()).or_default();
        if deps.contains(&dependency) {
            return;
        }
        deps.push(dependency);
        let dependents = self.reverse_edges.entry(target).or_default();
        if !dependents.contains(&from) {
            dependents.push(from);
        }
    }

    /// Get direct dependencies of a resource
    pub fn dependencies_of(&self, resource: &ResourceId) -> &[Dependency] {
        self.edges.get(resource).map_or(&[], |v| v.as_slice())
    }

    /// Get resources that depend on this resource
    pub fn dependents_of(&self, resource: &ResourceId) -> &[ResourceId] {
        self.reverse_edges
            .get(resource)
            .map_or(&[], |v| v.as_slice())
    }

    /// Order `nodes` so that every node comes after the nodes it depends on.
    ///
    /// Edges to resources outside `nodes` are ignored. Among nodes that are
    /// ready at the same time the input order is kept. On a cycle, returns
    /// the nodes that could not be ordered.
    pub fn topological_order(&self, nodes: &[ResourceId]) -> Result<Vec<ResourceId>, Vec<ResourceId>> {
        let members: HashSet<&ResourceId> = nodes.iter().collect();
        let mut in_degree: HashMap<&ResourceId, usize> = nodes.iter().map(|n| (n, 0)).collect();

        for node in nodes {
            let targets: HashSet<&ResourceId> = self
                .dependencies_of(node)
                .iter()
                .map(|d| &d.target)
                .filter(|t| members.contains(t) && *t != node)
                .collect();
            if let Some(degree) = in_degree.get_mut(node) {
                *degree = targets.len();
            }
        }

        let mut ready: VecDeque<&ResourceId> =
            nodes.iter().filter(|n| in_degree[n] == 0).collect();
        let mut ordered = Vec::with_capacity(nodes.len());
        let mut done: HashSet<&ResourceId> = HashSet::new();

        while let Some(node) = ready.pop_front() {
            if !done.insert(node) {
                continue;
            }
            ordered.push(node.clone());

            // Release dependents in input order to keep the result stable
            for candidate in nodes {
                if done.contains(candidate) {
                    continue;
                }
                let depends = self
                    .dependencies_of(candidate)
                    .iter()
                    .any(|d| &d.target == node);
                if depends && let Some(degree) = in_degree.get_mut(candidate) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(candidate);
                    }
                }
            }
        }

        if ordered.len() == nodes.len() {
            Ok(ordered)
        } else {
            Err(nodes
                .iter()
                .filter(|n| !done.contains(n))
                .cloned()
                .collect())
        }
    }
}
