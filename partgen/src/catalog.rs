//! The catalog collaborator: what the engine needs to know about the parent table and
//! the namespace it lives in.

use std::fmt::{Debug, Display};

use partgen_types::{
    DistributionPolicy, GeneratedTableDescriptor, KeyColumn, PartitionBy, PartitionKey,
    PartitionStrategy, Persistence, QualifiedName,
};

use crate::{Error, Result};

mod memory;
pub use memory::MemCatalog;

#[derive(Debug, Copy, Clone, Eq, PartialOrd, Ord, PartialEq, Hash)]
pub struct RelationId(u32);

impl From<u32> for RelationId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookups the expansion engine performs against the system catalog.
///
/// Expansion runs under whatever lock the caller holds on the parent; implementations
/// do not need to guard against concurrent DDL.
pub trait PartitionCatalog: Debug + Send + Sync {
    /// Describe a partitioned table about to receive children.
    fn parent_table(&self, id: RelationId) -> Result<ParentTable>;

    /// Whether a relation with this name already exists.
    fn relation_exists(&self, name: &QualifiedName) -> bool;
}

/// The partitioned table children are generated for.
#[derive(Debug, Clone)]
pub struct ParentTable {
    pub name: QualifiedName,
    pub owner: String,
    pub persistence: Persistence,
    pub distribution: DistributionPolicy,
    /// All columns of the table, with their type capabilities.
    pub columns: Vec<KeyColumn>,
    pub key: PartitionKey,
    /// Nesting level: 1 for a table without partitioned ancestors.
    pub level: usize,
}

impl ParentTable {
    /// Build a root partitioned table keyed on `key_columns`.
    pub fn new(
        name: QualifiedName,
        columns: Vec<KeyColumn>,
        strategy: PartitionStrategy,
        key_columns: &[&str],
    ) -> Result<Self> {
        let key = resolve_key(&columns, strategy, key_columns.iter().copied(), None)?;
        Ok(Self {
            name,
            owner: "postgres".to_string(),
            persistence: Persistence::default(),
            distribution: DistributionPolicy::default(),
            columns,
            key,
            level: 1,
        })
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionPolicy) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Describe a generated child as the parent of the next level, keyed by its
    /// `SUBPARTITION BY` clause.
    pub fn child(
        &self,
        child: &GeneratedTableDescriptor,
        partition_by: &PartitionBy,
    ) -> Result<Self> {
        let key = resolve_key(
            &self.columns,
            partition_by.strategy,
            partition_by.columns.iter().map(String::as_str),
            partition_by.location,
        )?;
        Ok(Self {
            name: child.name.clone(),
            owner: child.owner.clone(),
            persistence: child.persistence,
            distribution: child.distribution.clone(),
            columns: self.columns.clone(),
            key,
            level: self.level + 1,
        })
    }
}

fn resolve_key<'a>(
    columns: &[KeyColumn],
    strategy: PartitionStrategy,
    key_columns: impl Iterator<Item = &'a str>,
    location: Option<partgen_types::Location>,
) -> Result<PartitionKey> {
    let columns = key_columns
        .map(|name| {
            columns
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .ok_or_else(|| Error::ColumnNotFound {
                    column: name.to_string(),
                    location,
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PartitionKey::new(strategy, columns))
}
