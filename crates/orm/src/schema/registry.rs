//! Collection registry
//!
//! Bidirectional mapping between data-object types and compact collection
//! ids, plus the cached [`TableMetadata`] and [`EntityMapper`] of every
//! registered type. Registration happens through `&mut SchemaRegistry` during
//! start-up; afterwards the registry is shared behind an `Arc` and every lookup
//! is a plain read.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::data_object::{DataObject, EntityMapper};
use super::metadata::TableMetadata;
use crate::error::{ModelError, ModelResult};

/// Compact type tag, assigned sequentially from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CollectionId(u32);

impl CollectionId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registered type
pub struct Collection {
    id: CollectionId,
    type_id: TypeId,
    metadata: Arc<TableMetadata>,
    mapper: Arc<dyn Any + Send + Sync>,
}

impl Collection {
    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn metadata(&self) -> &Arc<TableMetadata> {
        &self.metadata
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("table", &self.metadata.name)
            .finish()
    }
}

/// Registry of every queryable type
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    collections: Vec<Collection>,
    by_type: HashMap<TypeId, CollectionId>,
    by_table: HashMap<String, CollectionId>,
    by_type_name: HashMap<String, CollectionId>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` with the default instance factory
    pub fn register<T: DataObject>(&mut self) -> ModelResult<CollectionId> {
        self.insert::<T>(EntityMapper::<T>::new())
    }

    /// Register `T` with a custom instance factory used during materialization
    pub fn register_with_factory<T, F>(&mut self, factory: F) -> ModelResult<CollectionId>
    where
        T: DataObject,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert::<T>(EntityMapper::with_factory(factory))
    }

    fn insert<T: DataObject>(&mut self, mapper: EntityMapper<T>) -> ModelResult<CollectionId> {
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            return Err(ModelError::DuplicateRegistration(format!(
                "type '{}' is already registered",
                T::TYPE_NAME
            )));
        }

        let metadata = TableMetadata::of::<T>();
        if !metadata.has_id_column() {
            return Err(ModelError::Lookup(format!(
                "type '{}' does not map an Id column",
                T::TYPE_NAME
            )));
        }
        if self.by_table.contains_key(&metadata.name) || self.by_type_name.contains_key(T::TYPE_NAME) {
            return Err(ModelError::DuplicateRegistration(format!(
                "table '{}' is already registered by another type",
                metadata.name
            )));
        }

        let index = u32::try_from(self.collections.len() + 1)
            .map_err(|_| ModelError::Lookup("collection id space exhausted".to_string()))?;
        let id = CollectionId(index);

        debug!(
            collection_id = id.get(),
            table = %metadata.name,
            columns = metadata.columns.len(),
            "Registered data type {}",
            T::TYPE_NAME
        );

        self.by_type.insert(type_id, id);
        self.by_table.insert(metadata.name.clone(), id);
        self.by_type_name.insert(T::TYPE_NAME.to_string(), id);
        self.collections.push(Collection {
            id,
            type_id,
            metadata: Arc::new(metadata),
            mapper: Arc::new(mapper),
        });

        Ok(id)
    }

    /// Collection id of a registered type
    pub fn collection_id<T: DataObject>(&self) -> ModelResult<CollectionId> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or_else(|| unregistered(T::TYPE_NAME))
    }

    /// Type registered under `id`
    pub fn collection_type(&self, id: CollectionId) -> ModelResult<TypeId> {
        self.collection(id).map(|c| c.type_id)
    }

    /// Table metadata registered under `id`
    pub fn collection_metadata(&self, id: CollectionId) -> ModelResult<Arc<TableMetadata>> {
        self.collection(id).map(|c| Arc::clone(&c.metadata))
    }

    pub fn collection(&self, id: CollectionId) -> ModelResult<&Collection> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.collections.get(index))
            .ok_or_else(|| ModelError::Lookup(format!("unknown collection id {}", id)))
    }

    /// Cached metadata of a registered type
    pub fn metadata<T: DataObject>(&self) -> ModelResult<Arc<TableMetadata>> {
        let id = self.collection_id::<T>()?;
        self.collection_metadata(id)
    }

    /// Reverse lookup by pluralized table name
    pub fn metadata_by_table(&self, table: &str) -> Option<Arc<TableMetadata>> {
        self.by_table
            .get(table)
            .and_then(|id| self.collection(*id).ok())
            .map(|c| Arc::clone(&c.metadata))
    }

    /// Resolve a `$-Name` token: either a bare type name or a table name
    pub fn resolve_table_token(&self, token: &str) -> ModelResult<Arc<TableMetadata>> {
        self.by_type_name
            .get(token)
            .and_then(|id| self.collection(*id).ok())
            .map(|c| Arc::clone(&c.metadata))
            .or_else(|| self.metadata_by_table(token))
            .ok_or_else(|| ModelError::Lookup(format!("no type or table registered as '{}'", token)))
    }

    /// Cached marshaling table of a registered type
    pub fn mapper<T: DataObject>(&self) -> ModelResult<Arc<EntityMapper<T>>> {
        let id = self.collection_id::<T>()?;
        let erased = Arc::clone(&self.collection(id)?.mapper);
        erased.downcast::<EntityMapper<T>>().map_err(|_| {
            ModelError::Lookup(format!("mapper for '{}' has an unexpected type", T::TYPE_NAME))
        })
    }

    pub fn is_registered<T: DataObject>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Registered collections in id order
    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }
}

fn unregistered(type_name: &str) -> ModelError {
    ModelError::Lookup(format!("type '{}' is not registered", type_name))
}
