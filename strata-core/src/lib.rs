//! Strata Core
//!
//! Resource model and the component-provider host. Components describe the
//! resources they want by registering them into a [`context::Context`]; the
//! host reports those registrations back to the orchestration engine, which
//! owns planning and applying them.

pub mod context;
pub mod graph;
pub mod host;
pub mod output;
pub mod resource;
pub mod schema;
