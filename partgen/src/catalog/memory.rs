//! Implementation of the partition catalog that sits entirely in memory.

use std::collections::{BTreeMap, BTreeSet};

use partgen_types::QualifiedName;

use super::{ParentTable, PartitionCatalog, RelationId};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct MemCatalog {
    tables: BTreeMap<RelationId, ParentTable>,
    relations: BTreeSet<QualifiedName>,
    next_id: u32,
}

impl MemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partitioned table, returning the id it can be looked up by.
    pub fn add_table(&mut self, table: ParentTable) -> RelationId {
        let id = RelationId::from(self.next_id);
        self.next_id += 1;
        self.relations.insert(table.name.clone());
        self.tables.insert(id, table);
        id
    }

    /// Record that a relation of this name exists, without describing it.
    pub fn add_relation(&mut self, name: QualifiedName) {
        self.relations.insert(name);
    }
}

impl PartitionCatalog for MemCatalog {
    fn parent_table(&self, id: RelationId) -> Result<ParentTable> {
        self.tables
            .get(&id)
            .cloned()
            .ok_or(Error::RelationNotFound { id })
    }

    fn relation_exists(&self, name: &QualifiedName) -> bool {
        self.relations.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use partgen_types::{KeyColumn, PartitionStrategy};

    use super::*;
    use crate::builtin::IntType;

    #[test]
    fn tables_and_relations() {
        let mut catalog = MemCatalog::new();
        let name = QualifiedName::new("public", "sales");
        let table = ParentTable::new(
            name.clone(),
            vec![KeyColumn::new("id", Arc::new(IntType::int4()))],
            PartitionStrategy::Range,
            &["id"],
        )
        .unwrap();
        let id = catalog.add_table(table);
        catalog.add_relation(QualifiedName::new("public", "other"));

        assert_eq!(catalog.parent_table(id).unwrap().name, name);
        assert!(catalog.relation_exists(&name));
        assert!(catalog.relation_exists(&QualifiedName::new("public", "other")));
        assert!(!catalog.relation_exists(&QualifiedName::new("archive", "other")));
        assert!(matches!(
            catalog.parent_table(RelationId::from(42)),
            Err(Error::RelationNotFound { .. })
        ));
    }

    #[test]
    fn unknown_key_column() {
        let err = ParentTable::new(
            QualifiedName::new("public", "sales"),
            vec![KeyColumn::new("id", Arc::new(IntType::int4()))],
            PartitionStrategy::Range,
            &["region"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { column, .. } if column == "region"));
    }
}
