//! AWS resource schema definitions

pub mod s3;
pub mod types;

use strata_core::schema::ResourceSchema;

/// Returns all AWS schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    s3::schemas()
}
