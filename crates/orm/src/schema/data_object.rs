//! Data object contract and per-type marshaling tables
//!
//! Instead of discovering properties at runtime, every mapped type describes
//! its columns once through [`DataObject::columns`]. Each [`Column`] carries
//! the column name, its wire type and a pair of typed accessors, so binding and
//! materialization never need to inspect the type dynamically.

use std::fmt;

use crate::error::ModelResult;
use crate::types::{SqlType, Value, WireType};

/// Name of the identity column every data object exposes
pub const ID_COLUMN: &str = "Id";

/// Contract for every mapped entity
///
/// Use [`data_object!`](crate::data_object) to implement it from a field
/// list. Columns must be listed in declaration order and must include the
/// identity column.
pub trait DataObject: Default + Send + Sync + 'static {
    /// Bare type name; the table name is its plural
    const TYPE_NAME: &'static str;

    /// Column marshaling table in declaration order
    fn columns() -> Vec<Column<Self>>;

    /// Current identity value
    fn id(&self) -> i64;

    /// Assign the identity returned by the database
    fn set_id(&mut self, id: i64);
}

type Reader<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, Value) -> ModelResult<()> + Send + Sync>;

/// A single column accessor of a data object
pub struct Column<T> {
    name: &'static str,
    wire_type: WireType,
    nullable: bool,
    read: Reader<T>,
    write: Writer<T>,
}

impl<T: 'static> Column<T> {
    /// Column backed by a field of type `F`
    pub fn new<F>(name: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: SqlType + 'static,
    {
        Self {
            name,
            wire_type: F::WIRE_TYPE,
            nullable: F::NULLABLE,
            read: Box::new(move |obj: &T| get(obj).to_value()),
            write: Box::new(move |obj: &mut T, value: Value| {
                *get_mut(obj) = F::from_value(value)?;
                Ok(())
            }),
        }
    }
}

impl<T> Column<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_id(&self) -> bool {
        self.name == ID_COLUMN
    }

    /// Current value of this column on `obj`
    pub fn read(&self, obj: &T) -> Value {
        (self.read)(obj)
    }

    /// Assign a decoded value to this column on `obj`
    pub fn assign(&self, obj: &mut T, value: Value) -> ModelResult<()> {
        (self.write)(obj, value)
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("wire_type", &self.wire_type)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Cached marshaling table plus the instance factory of one type
pub struct EntityMapper<T> {
    columns: Vec<Column<T>>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: DataObject> EntityMapper<T> {
    pub fn new() -> Self {
        Self::with_factory(T::default)
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            columns: T::columns(),
            factory: Box::new(factory),
        }
    }
}

impl<T: DataObject> Default for EntityMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityMapper<T> {
    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Fresh instance for materialization
    pub fn instantiate(&self) -> T {
        (self.factory)()
    }

    /// Map result-set ordinals onto columns by exact name. Unknown result
    /// columns are dropped; a repeated name maps to its first ordinal.
    pub fn ordinal_map<'a>(&'a self, column_names: &[String]) -> Vec<(usize, &'a Column<T>)> {
        let mut mapped: Vec<(usize, &'a Column<T>)> = Vec::new();
        for (ordinal, name) in column_names.iter().enumerate() {
            if let Some(column) = self.column(name) {
                if mapped.iter().all(|(_, c)| c.name != column.name) {
                    mapped.push((ordinal, column));
                }
            }
        }
        mapped
    }
}

/// Implement [`DataObject`] for a struct from its field list.
///
/// The field named in parentheses holds the `i64` identity and must be mapped
/// to the `Id` column.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Widget { id: i64, name: String, price: Option<f64> }
///
/// data_object! {
///     Widget(id) {
///         id => "Id",
///         name => "Name",
///         price => "Price",
///     }
/// }
/// ```
#[macro_export]
macro_rules! data_object {
    ($ty:ident ($id:ident) { $($field:ident => $column:literal),+ $(,)? }) => {
        impl $crate::DataObject for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn columns() -> ::std::vec::Vec<$crate::Column<Self>> {
                ::std::vec![
                    $($crate::Column::<$ty>::new($column, |obj| &obj.$field, |obj| &mut obj.$field)),+
                ]
            }

            fn id(&self) -> i64 {
                self.$id
            }

            fn set_id(&mut self, id: i64) {
                self.$id = id;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Gadget {
        id: i64,
        label: String,
        weight: Option<f64>,
    }

    crate::data_object! {
        Gadget(id) {
            id => "Id",
            label => "Label",
            weight => "Weight",
        }
    }

    #[test]
    fn test_columns_follow_declaration_order() {
        let names: Vec<&str> = Gadget::columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Id", "Label", "Weight"]);
        assert_eq!(Gadget::TYPE_NAME, "Gadget");
    }

    #[test]
    fn test_column_accessors() {
        let mapper = EntityMapper::<Gadget>::new();
        let mut gadget = Gadget {
            id: 3,
            label: "spring".into(),
            weight: None,
        };

        let weight = mapper.column("Weight").unwrap();
        assert_eq!(weight.wire_type(), WireType::Double);
        assert!(weight.is_nullable());
        assert_eq!(weight.read(&gadget), Value::Null(WireType::Double));

        weight.assign(&mut gadget, Value::Double(1.5)).unwrap();
        assert_eq!(gadget.weight, Some(1.5));

        let label = mapper.column("Label").unwrap();
        assert!(label.assign(&mut gadget, Value::Int32(1)).is_err());
        assert!(mapper.column("Id").unwrap().is_id());
    }

    #[test]
    fn test_ordinal_map_ignores_unknown_and_duplicate_columns() {
        let mapper = EntityMapper::<Gadget>::new();
        let names: Vec<String> = ["Extra", "Label", "Id", "Label"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let map: Vec<(usize, &str)> = mapper
            .ordinal_map(&names)
            .into_iter()
            .map(|(ordinal, column)| (ordinal, column.name()))
            .collect();
        assert_eq!(map, vec![(1, "Label"), (2, "Id")]);
    }

    #[test]
    fn test_custom_factory() {
        let mapper = EntityMapper::<Gadget>::with_factory(|| Gadget {
            label: "unnamed".into(),
            ..Default::default()
        });
        assert_eq!(mapper.instantiate().label, "unnamed");
        assert_eq!(EntityMapper::<Gadget>::new().instantiate(), Gadget::default());
    }

    #[test]
    fn test_identity_accessors() {
        let mut gadget = Gadget::default();
        gadget.set_id(42);
        assert_eq!(gadget.id(), 42);
    }
}
