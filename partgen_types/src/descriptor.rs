use std::fmt::Display;

use crate::{ColumnEncoding, PartitionBoundSpec, PartitionBy, StorageOption};

/// A schema-qualified relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Persistence {
    #[default]
    Permanent,
    Unlogged,
    Temporary,
}

/// How rows of a table are placed across segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DistributionPolicy {
    Hashed(Vec<String>),
    #[default]
    Random,
    Replicated,
}

/// Everything needed to synthesize one child-table creation command.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTableDescriptor {
    pub name: QualifiedName,
    pub parent: QualifiedName,
    /// Position of this descriptor in the list returned for its level.
    pub ordinal: usize,
    /// Nesting level of the parent, 1 for a root partitioned table.
    pub level: usize,
    pub bound: PartitionBoundSpec,
    pub options: Vec<StorageOption>,
    pub tablespace: Option<String>,
    pub access_method: Option<String>,
    pub column_encodings: Vec<ColumnEncoding>,
    /// Sub-partitioning of this child, to be expanded at the next level.
    pub sub_partition: Option<PartitionBy>,
    pub owner: String,
    pub persistence: Persistence,
    pub distribution: DistributionPolicy,
}

impl Display for GeneratedTableDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CREATE TABLE {} PARTITION OF {} {}",
            self.name, self.parent, self.bound
        )?;
        if let Some(access_method) = &self.access_method {
            write!(f, " USING {access_method}")?;
        }
        if !self.options.is_empty() {
            let options = self
                .options
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            write!(f, " WITH ({})", options.join(", "))?;
        }
        if let Some(tablespace) = &self.tablespace {
            write!(f, " TABLESPACE {tablespace}")?;
        }
        Ok(())
    }
}
