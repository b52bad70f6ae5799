//! Table metadata snapshots

use serde::Serialize;

use super::data_object::{DataObject, ID_COLUMN};
use super::inflection::pluralize;
use crate::types::WireType;

/// Column description shared with collaborators that never see the host type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub wire_type: WireType,
    pub nullable: bool,
}

/// Table name and ordered columns of a registered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    /// Pluralized table name
    pub name: String,
    /// Bare type name the table was derived from
    pub type_name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Snapshot the table layout of `T`
    pub fn of<T: DataObject>() -> Self {
        let columns = T::columns()
            .iter()
            .map(|column| ColumnMetadata {
                name: column.name().to_string(),
                wire_type: column.wire_type(),
                nullable: column.is_nullable(),
            })
            .collect();

        Self {
            name: pluralize(T::TYPE_NAME),
            type_name: T::TYPE_NAME.to_string(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_id_column(&self) -> bool {
        self.column(ID_COLUMN).is_some()
    }

    /// Every column except the identity, in declaration order
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| c.name != ID_COLUMN)
    }
}
