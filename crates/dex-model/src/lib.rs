#![deny(unsafe_code)]

pub mod error;
pub mod field;
pub mod groups;
pub mod ids;
pub mod tree;

pub use error::{ModelError, Result};
pub use field::{
    Constraints, FieldKind, FieldType, SchemaField, Transformation, TransformationSource,
    TransformationType,
};
pub use groups::{VisualGroup, assign_to_group, prune_groups};
pub use ids::{FieldId, GroupId, JobId, SchemaId};
pub use tree::{
    FlatLeaf, PathSegment, find_field, flatten, flatten_results, nest_results, remove_field,
    update_field,
};
