//! Row materialization
//!
//! Result columns are matched to data-object columns by exact name once per
//! result set. For every row a fresh instance comes from the mapper's factory;
//! NULL cells leave the factory value in place, every other cell is read with
//! the accessor of the target column's wire type.

use crate::backends::DatabaseRow;
use crate::error::{ModelError, ModelResult};
use crate::schema::{DataObject, EntityMapper};
use crate::types::{SqlType, Value};

/// Turn fetched rows into data objects
pub fn materialize<T: DataObject>(mapper: &EntityMapper<T>, rows: &[Box<dyn DatabaseRow>]) -> ModelResult<Vec<T>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    let column_names = first.column_names();
    let ordinals = mapper.ordinal_map(&column_names);

    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        let mut object = mapper.instantiate();
        for (ordinal, column) in &ordinals {
            if let Some(value) = row.read(*ordinal, column.wire_type())? {
                column.assign(&mut object, value).map_err(|e| match e {
                    ModelError::Decode(msg) => {
                        ModelError::Decode(format!("column '{}': {}", column.name(), msg))
                    }
                    other => other,
                })?;
            }
        }
        objects.push(object);
    }

    Ok(objects)
}

/// Decode the first cell of `row` as `S`
pub fn read_scalar<S: SqlType>(row: &dyn DatabaseRow) -> ModelResult<S> {
    if row.column_count() == 0 {
        return Err(ModelError::Query("scalar query returned no columns".to_string()));
    }

    match row.read(0, S::WIRE_TYPE)? {
        Some(value) => S::from_value(value),
        None if S::NULLABLE => S::from_value(Value::Null(S::WIRE_TYPE)),
        None => Err(ModelError::Decode(format!(
            "NULL cannot be read as a non-nullable {} value",
            S::WIRE_TYPE
        ))),
    }
}
