//! The expansion orchestrator: turns one level of a partition definition into child
//! table descriptors.
//!
//! For each level the steps are:
//!
//! 1. drop the legacy `tablename` option from the options children inherit;
//! 2. move the DEFAULT partition to the front, so it takes the first partition number
//!    wherever it was declared;
//! 3. for each element, in that order, work out its options, access method and column
//!    encodings, attach its sub-partition definition and generate its descriptors (one
//!    per `EVERY` step for RANGE, one for LIST and DEFAULT);
//! 4. for RANGE levels, sort the descriptors and fill in their open sides.
//!
//! Descriptors are returned in processing order; sorting is only used to resolve
//! bounds.

use observability_deps::tracing::{debug, info};
use partgen_types::{
    BoundaryClause, ColumnEncoding, Datum, GeneratedTableDescriptor, OptionValue,
    PartitionBoundSpec, PartitionBy, PartitionDefinition, PartitionElement, PartitionStrategy,
    RangeBounds, RangeDatum, StorageOption,
};

use crate::{
    Error, ExpansionConfig, ExpansionError, Result,
    bound_iter::BoundIterator,
    bound_value::transform_bound_value,
    catalog::{ParentTable, PartitionCatalog, RelationId},
    encoding::merge_encodings,
    naming::{NameRegistry, PartitionNamer},
    sort::resolve_implicit_bounds,
};

/// Settings of the parent table that children inherit when their element does not set
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedSettings {
    pub options: Vec<StorageOption>,
    pub access_method: Option<String>,
    pub column_encodings: Vec<ColumnEncoding>,
}

impl InheritedSettings {
    fn from_descriptor(descriptor: &GeneratedTableDescriptor) -> Self {
        Self {
            options: descriptor.options.clone(),
            access_method: descriptor.access_method.clone(),
            column_encodings: descriptor.column_encodings.clone(),
        }
    }
}

/// A generated child and, if it is partitioned itself, its expanded children.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedPartition {
    pub descriptor: GeneratedTableDescriptor,
    pub children: Vec<ExpandedPartition>,
}

impl ExpandedPartition {
    /// Every descriptor of this subtree, parents before their children.
    pub fn descriptors(&self) -> Vec<&GeneratedTableDescriptor> {
        let mut out = vec![&self.descriptor];
        for child in &self.children {
            out.extend(child.descriptors());
        }
        out
    }
}

/// Entry point of partition expansion.
#[derive(Debug, Clone, Copy)]
pub struct PartitionExpander<'a> {
    catalog: &'a dyn PartitionCatalog,
    config: &'a ExpansionConfig,
}

impl<'a> PartitionExpander<'a> {
    pub fn new(catalog: &'a dyn PartitionCatalog, config: &'a ExpansionConfig) -> Self {
        Self { catalog, config }
    }

    /// Generate the direct children of `parent_id` declared by `definition`.
    ///
    /// `sub_partition` is the `SUBPARTITION BY` clause of the level below, which every
    /// child carries for its own expansion. `source_text` is the statement text, used to
    /// report error positions.
    pub fn generate_partitions(
        &self,
        parent_id: RelationId,
        definition: &PartitionDefinition,
        sub_partition: Option<&PartitionBy>,
        source_text: &str,
        inherited: &InheritedSettings,
    ) -> Result<Vec<GeneratedTableDescriptor>, ExpansionError> {
        let mut registry = NameRegistry::default();
        self.catalog
            .parent_table(parent_id)
            .and_then(|parent| {
                self.expand_level(&parent, definition, sub_partition, inherited, &mut registry)
            })
            .map_err(|e| ExpansionError::new(e, source_text))
    }

    /// Expand `partition_by`, the partitioning of `parent_id`, and every sub-partition
    /// level below it.
    ///
    /// Children of each generated partition are expanded with that partition as the
    /// parent, inheriting its options, access method and column encodings. Names are
    /// unique across the whole hierarchy.
    pub fn expand_hierarchy(
        &self,
        parent_id: RelationId,
        partition_by: &PartitionBy,
        source_text: &str,
        inherited: &InheritedSettings,
    ) -> Result<Vec<ExpandedPartition>, ExpansionError> {
        let mut registry = NameRegistry::default();
        self.catalog
            .parent_table(parent_id)
            .and_then(|parent| {
                let definition =
                    partition_by
                        .definition
                        .as_ref()
                        .ok_or(Error::MissingSubpartitionDefinition {
                            depth: parent.level,
                            location: partition_by.location,
                        })?;
                self.expand_tree(
                    &parent,
                    definition,
                    partition_by.sub_partition.as_deref(),
                    inherited,
                    &mut registry,
                )
            })
            .map_err(|e| ExpansionError::new(e, source_text))
    }

    fn expand_tree(
        &self,
        parent: &ParentTable,
        definition: &PartitionDefinition,
        sub_partition: Option<&PartitionBy>,
        inherited: &InheritedSettings,
        registry: &mut NameRegistry,
    ) -> Result<Vec<ExpandedPartition>> {
        let descriptors =
            self.expand_level(parent, definition, sub_partition, inherited, registry)?;

        let mut expanded = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let children = match &descriptor.sub_partition {
                Some(sub) => {
                    let child = parent.child(&descriptor, sub)?;
                    let definition =
                        sub.definition
                            .as_ref()
                            .ok_or(Error::MissingSubpartitionDefinition {
                                depth: child.level,
                                location: sub.location,
                            })?;
                    self.expand_tree(
                        &child,
                        definition,
                        sub.sub_partition.as_deref(),
                        &InheritedSettings::from_descriptor(&descriptor),
                        registry,
                    )?
                }
                None => vec![],
            };
            expanded.push(ExpandedPartition {
                descriptor,
                children,
            });
        }
        Ok(expanded)
    }

    fn expand_level(
        &self,
        parent: &ParentTable,
        definition: &PartitionDefinition,
        sub_partition: Option<&PartitionBy>,
        inherited: &InheritedSettings,
        registry: &mut NameRegistry,
    ) -> Result<Vec<GeneratedTableDescriptor>> {
        let strategy = parent.key.strategy;
        if !matches!(strategy, PartitionStrategy::Range | PartitionStrategy::List) {
            return Err(Error::UnsupportedStrategy { strategy });
        }

        let mut parent_options = inherited.options.clone();
        extract_tablename(&mut parent_options, &self.config.tablename_option)?;

        // the partition configuration acts as the more specific level here
        let level_encodings =
            merge_encodings(&definition.column_encodings, &inherited.column_encodings)?;

        let template =
            sub_partition.and_then(|sub| sub.definition.as_ref().filter(|d| d.is_template));
        let mut namer = PartitionNamer::new(parent, self.config.max_identifier_length);
        let mut descriptors = vec![];

        for element in default_first(&definition.elements)? {
            let sub_partition = match sub_partition {
                Some(sub) => {
                    let definition = template.or(element.sub_partition.as_ref()).ok_or(
                        Error::MissingSubpartitionDefinition {
                            depth: parent.level + 1,
                            location: sub.location,
                        },
                    )?;
                    Some(PartitionBy {
                        definition: Some(definition.clone()),
                        ..sub.clone()
                    })
                }
                None => None,
            };

            let mut options = element.options.clone();
            let tablename = extract_tablename(&mut options, &self.config.tablename_option)?;
            if options.is_empty() {
                options.clone_from(&parent_options);
            }
            let access_method = element
                .access_method
                .clone()
                .or_else(|| inherited.access_method.clone());
            let column_encodings = if self
                .config
                .merges_column_encodings(access_method.as_deref())
            {
                merge_encodings(&element.column_encodings, &level_encodings)?
            } else {
                element.column_encodings.clone()
            };

            let bounds = if element.is_default() {
                vec![(PartitionBoundSpec::Default, element.name.clone())]
            } else if strategy == PartitionStrategy::Range {
                range_bounds(parent, element, tablename.is_some())?
            } else {
                vec![(list_bound(parent, element)?, element.name.clone())]
            };

            for (bound, name) in bounds {
                let name = namer.next_name(
                    self.catalog,
                    registry,
                    tablename.as_deref(),
                    name.as_deref(),
                    element.location,
                )?;
                debug!(%name, %bound, ordinal = descriptors.len(), "generated partition");
                descriptors.push(GeneratedTableDescriptor {
                    name,
                    parent: parent.name.clone(),
                    ordinal: descriptors.len(),
                    level: parent.level,
                    bound,
                    options: options.clone(),
                    tablespace: element.tablespace.clone(),
                    access_method: access_method.clone(),
                    column_encodings: column_encodings.clone(),
                    sub_partition: sub_partition.clone(),
                    owner: parent.owner.clone(),
                    persistence: parent.persistence,
                    distribution: parent.distribution.clone(),
                });
            }
        }

        if strategy == PartitionStrategy::Range {
            resolve_implicit_bounds(&parent.key.columns, &mut descriptors)?;
        }

        info!(
            parent = %parent.name,
            level = parent.level,
            partitions = descriptors.len(),
            "expanded partition definition"
        );
        Ok(descriptors)
    }
}

/// The elements in processing order: the DEFAULT partition first, then the others as
/// declared.
fn default_first(elements: &[PartitionElement]) -> Result<Vec<&PartitionElement>> {
    let mut ordered = Vec::with_capacity(elements.len());
    let mut default = None;
    for element in elements {
        if !element.is_default() {
            ordered.push(element);
        } else if default.is_some() {
            return Err(Error::MultipleDefaultPartitions {
                location: element.location,
            });
        } else {
            default = Some(element);
        }
    }
    if let Some(default) = default {
        ordered.insert(0, default);
    }
    Ok(ordered)
}

/// Remove the legacy table name option from `options`, returning its value.
fn extract_tablename(
    options: &mut Vec<StorageOption>,
    option_name: &str,
) -> Result<Option<String>> {
    let Some(position) = options.iter().position(|o| o.name == option_name) else {
        return Ok(None);
    };
    match options.remove(position).value {
        Some(OptionValue::String(tablename)) => Ok(Some(tablename)),
        _ => Err(Error::InvalidTablenameOption),
    }
}

fn range_bounds(
    parent: &ParentTable,
    element: &PartitionElement,
    named_by_option: bool,
) -> Result<Vec<(PartitionBoundSpec, Option<String>)>> {
    let (start, end, end_inclusive, every) = match &element.boundary {
        Some(BoundaryClause::Range {
            start,
            end,
            end_inclusive,
            every,
        }) if start.is_some() || end.is_some() => (start, end, *end_inclusive, every),
        Some(BoundaryClause::Range { .. }) | None => {
            return Err(Error::MissingBoundarySpecification {
                name: element.name.clone(),
                strategy: PartitionStrategy::Range,
                location: element.location,
            });
        }
        Some(other) => {
            return Err(Error::BoundaryStrategyMismatch {
                strategy: PartitionStrategy::Range,
                found: other.kind(),
                location: element.location,
            });
        }
    };

    // legacy dumps named partitions through an option and kept EVERY around; the name
    // wins
    let every = if named_by_option { None } else { every.as_deref() };

    let iter = BoundIterator::new(
        &parent.key,
        start.as_deref(),
        end.as_deref(),
        end_inclusive,
        every,
        element.location,
    )?;

    let value = |datum: Datum| vec![RangeDatum::Value(datum)];
    let mut bounds = vec![];
    for (i, pair) in iter.enumerate() {
        let pair = pair?;
        let range = match (pair.lower, pair.upper) {
            (Some(lower), Some(upper)) => RangeBounds::Both {
                lower: value(lower),
                upper: value(upper),
            },
            (Some(lower), None) => RangeBounds::LowerOnly(value(lower)),
            (None, Some(upper)) => RangeBounds::UpperOnly(value(upper)),
            (None, None) => {
                return Err(Error::MissingBoundarySpecification {
                    name: element.name.clone(),
                    strategy: PartitionStrategy::Range,
                    location: element.location,
                });
            }
        };
        let name = match (&element.name, every) {
            (Some(name), Some(_)) => Some(format!("{name}_{}", i + 1)),
            (name, _) => name.clone(),
        };
        bounds.push((PartitionBoundSpec::Range(range), name));
    }
    Ok(bounds)
}

fn list_bound(parent: &ParentTable, element: &PartitionElement) -> Result<PartitionBoundSpec> {
    let values = match &element.boundary {
        Some(BoundaryClause::List { values }) => values,
        None => {
            return Err(Error::MissingBoundarySpecification {
                name: element.name.clone(),
                strategy: PartitionStrategy::List,
                location: element.location,
            });
        }
        Some(other) => {
            return Err(Error::BoundaryStrategyMismatch {
                strategy: PartitionStrategy::List,
                found: other.kind(),
                location: element.location,
            });
        }
    };

    let [column] = parent.key.columns.as_slice() else {
        return Err(Error::MultiColumnListUnsupported {
            columns: parent.key.columns.len(),
        });
    };

    let mut datums: Vec<Option<Datum>> = Vec::with_capacity(values.len());
    for tuple in values {
        let [literal] = tuple.as_slice() else {
            return Err(Error::InvalidBoundaryArity {
                clause: "VALUES",
                expected: 1,
                found: tuple.len(),
                location: tuple.first().and_then(|l| l.location).or(element.location),
            });
        };
        let datum = transform_bound_value(column, literal)?;
        let duplicate = datums.iter().any(|existing| match (existing, &datum) {
            (Some(a), Some(b)) => column.compare(a, b).is_eq(),
            (None, None) => true,
            _ => false,
        });
        if !duplicate {
            datums.push(datum);
        }
    }
    Ok(PartitionBoundSpec::List(datums))
}

#[cfg(test)]
mod tests {
    use partgen_types::Literal;
    use pretty_assertions::assert_eq;

    use super::*;

    fn element(name: &str, boundary: BoundaryClause) -> PartitionElement {
        PartitionElement {
            name: Some(name.to_string()),
            boundary: Some(boundary),
            ..Default::default()
        }
    }

    #[test]
    fn default_moves_to_front() {
        let elements = vec![
            element("a", BoundaryClause::List { values: vec![] }),
            element("other", BoundaryClause::Default),
            element("b", BoundaryClause::List { values: vec![] }),
        ];
        let names: Vec<_> = default_first(&elements)
            .unwrap()
            .into_iter()
            .map(|e| e.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["other", "a", "b"]);

        let two_defaults = vec![
            element("d1", BoundaryClause::Default),
            PartitionElement {
                location: Some(42.into()),
                ..element("d2", BoundaryClause::Default)
            },
        ];
        assert!(matches!(
            default_first(&two_defaults),
            Err(Error::MultipleDefaultPartitions { location: Some(l) }) if l.offset() == 42
        ));
    }

    #[test]
    fn tablename_option_is_extracted() {
        let mut options = vec![
            StorageOption::new("appendonly", true),
            StorageOption::new("tablename", "sales_1_prt_jan"),
        ];
        assert_eq!(
            extract_tablename(&mut options, "tablename").unwrap().as_deref(),
            Some("sales_1_prt_jan")
        );
        assert_eq!(options, vec![StorageOption::new("appendonly", true)]);
        assert_eq!(extract_tablename(&mut options, "tablename").unwrap(), None);

        let mut options = vec![StorageOption::new("tablename", 7_i64)];
        assert!(matches!(
            extract_tablename(&mut options, "tablename"),
            Err(Error::InvalidTablenameOption)
        ));
    }

    #[test]
    fn descriptors_flatten_parents_first() {
        let descriptor = |name: &str| GeneratedTableDescriptor {
            name: partgen_types::QualifiedName::new("public", name),
            parent: partgen_types::QualifiedName::new("public", "t"),
            ordinal: 0,
            level: 1,
            bound: PartitionBoundSpec::Default,
            options: vec![],
            tablespace: None,
            access_method: None,
            column_encodings: vec![],
            sub_partition: None,
            owner: "postgres".to_string(),
            persistence: Default::default(),
            distribution: Default::default(),
        };
        let tree = ExpandedPartition {
            descriptor: descriptor("a"),
            children: vec![
                ExpandedPartition {
                    descriptor: descriptor("a1"),
                    children: vec![],
                },
                ExpandedPartition {
                    descriptor: descriptor("a2"),
                    children: vec![],
                },
            ],
        };
        let names: Vec<_> = tree
            .descriptors()
            .into_iter()
            .map(|d| d.name.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "a1", "a2"]);
    }

    #[test]
    fn list_values_are_deduplicated() {
        use std::sync::Arc;

        use partgen_types::{KeyColumn, QualifiedName};

        use crate::builtin::IntType;

        let parent = ParentTable::new(
            QualifiedName::new("public", "t"),
            vec![KeyColumn::new("id", Arc::new(IntType::int4()))],
            PartitionStrategy::List,
            &["id"],
        )
        .unwrap();
        let values = [
            Literal::integer(1),
            Literal::string("1"),
            Literal::null(),
            Literal::integer(2),
            Literal::null(),
        ]
        .into_iter()
        .map(|l| vec![l])
        .collect();
        let bound = list_bound(&parent, &element("p", BoundaryClause::List { values })).unwrap();
        assert_eq!(
            bound,
            PartitionBoundSpec::List(vec![Some(Datum::Int4(1)), None, Some(Datum::Int4(2))])
        );
    }
}
