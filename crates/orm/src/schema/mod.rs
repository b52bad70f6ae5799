//! Schema registry and per-type table metadata

pub mod data_object;
pub mod inflection;
pub mod metadata;
pub mod registry;

pub use data_object::{Column, DataObject, EntityMapper, ID_COLUMN};
pub use inflection::pluralize;
pub use metadata::{ColumnMetadata, TableMetadata};
pub use registry::{Collection, CollectionId, SchemaRegistry};
