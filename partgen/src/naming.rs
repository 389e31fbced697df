//! Child table names.
//!
//! Generated names have the form `<parent>_<level>_prt_<label>`, where the label is the
//! declared partition name or, for unnamed partitions, the partition's number within the
//! level. Numbers count every generated child of the level that is not named through
//! the legacy `tablename` option, in processing order.

use std::collections::HashSet;

use partgen_types::{Location, QualifiedName};

use crate::{
    Error, Result,
    catalog::{ParentTable, PartitionCatalog},
};

fn clip(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Join `name1`, `name2` and `label` with underscores, shortening `name1` and `name2`
/// (the longer one first) until the result fits `max_len` bytes.
///
/// Returns `None` when not even the label and separators fit.
pub(crate) fn make_object_name(
    name1: &str,
    name2: &str,
    label: &str,
    max_len: usize,
) -> Option<String> {
    let overhead = label.len() + 2;
    let available = max_len.checked_sub(overhead)?;

    let (mut name1_len, mut name2_len) = (name1.len(), name2.len());
    while name1_len + name2_len > available {
        if name1_len > name2_len {
            name1_len -= 1;
        } else {
            name2_len -= 1;
        }
    }

    Some(format!(
        "{}_{}_{}",
        clip(name1, name1_len),
        clip(name2, name2_len),
        label
    ))
}

/// Names handed out during one expansion, across all levels of the hierarchy.
#[derive(Debug, Default)]
pub(crate) struct NameRegistry {
    claimed: HashSet<QualifiedName>,
}

impl NameRegistry {
    /// Reserve `name`, failing if the catalog or this expansion already uses it.
    fn claim(
        &mut self,
        catalog: &dyn PartitionCatalog,
        name: QualifiedName,
        location: Option<Location>,
    ) -> Result<QualifiedName> {
        if catalog.relation_exists(&name) {
            return Err(Error::name_generation(
                name.name,
                "relation already exists",
                location,
            ));
        }
        if !self.claimed.insert(name.clone()) {
            return Err(Error::name_generation(
                name.name,
                "name is used by another partition",
                location,
            ));
        }
        Ok(name)
    }
}

/// Chooses names for the children of one parent.
#[derive(Debug)]
pub(crate) struct PartitionNamer<'a> {
    parent: &'a ParentTable,
    max_len: usize,
    partnum: usize,
}

impl<'a> PartitionNamer<'a> {
    pub(crate) fn new(parent: &'a ParentTable, max_len: usize) -> Self {
        Self {
            parent,
            max_len,
            partnum: 0,
        }
    }

    /// Name the next child. `tablename` is the legacy override, used verbatim; `name`
    /// is the declared partition name (with any EVERY suffix already applied).
    pub(crate) fn next_name(
        &mut self,
        catalog: &dyn PartitionCatalog,
        registry: &mut NameRegistry,
        tablename: Option<&str>,
        name: Option<&str>,
        location: Option<Location>,
    ) -> Result<QualifiedName> {
        let namespace = &self.parent.name.namespace;

        let relname = match tablename {
            Some(tablename) if tablename.len() > self.max_len => {
                return Err(Error::name_generation(
                    tablename,
                    format!("name is longer than {} bytes", self.max_len),
                    location,
                ));
            }
            Some(tablename) => tablename.to_string(),
            None => {
                self.partnum += 1;
                let label = match name {
                    Some(name) => format!("prt_{name}"),
                    None => format!("prt_{}", self.partnum),
                };
                make_object_name(
                    &self.parent.name.name,
                    &self.parent.level.to_string(),
                    &label,
                    self.max_len,
                )
                .ok_or_else(|| {
                    Error::name_generation(
                        &label,
                        format!("name is longer than {} bytes", self.max_len),
                        location,
                    )
                })?
            }
        };

        registry.claim(catalog, QualifiedName::new(namespace.clone(), relname), location)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use partgen_types::{KeyColumn, PartitionStrategy};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{builtin::IntType, catalog::MemCatalog};

    fn parent(name: &str) -> ParentTable {
        ParentTable::new(
            QualifiedName::new("public", name),
            vec![KeyColumn::new("id", Arc::new(IntType::int4()))],
            PartitionStrategy::Range,
            &["id"],
        )
        .unwrap()
    }

    #[test]
    fn object_names() {
        assert_eq!(
            make_object_name("sales", "1", "prt_2", 63).unwrap(),
            "sales_1_prt_2"
        );
        assert_eq!(
            make_object_name("abcdefghij", "1", "prt_x", 12).unwrap(),
            "abcd_1_prt_x"
        );
        assert_eq!(make_object_name("sales", "12", "prt_x", 10).unwrap(), "sa_1_prt_x");
        // clipping never splits a character
        assert_eq!(make_object_name("ééé", "1", "prt_1", 11).unwrap(), "é_1_prt_1");
        assert_eq!(make_object_name("sales", "1", "prt_toolong", 8), None);
    }

    #[test]
    fn numbering_and_overrides() {
        let catalog = MemCatalog::new();
        let parent = parent("sales");
        let mut registry = NameRegistry::default();
        let mut namer = PartitionNamer::new(&parent, 63);

        let mut next = |tablename: Option<&str>, name: Option<&str>| {
            namer
                .next_name(&catalog, &mut registry, tablename, name, None)
                .map(|n| n.to_string())
        };
        assert_eq!(next(None, Some("other")).unwrap(), "public.sales_1_prt_other");
        assert_eq!(next(None, None).unwrap(), "public.sales_1_prt_2");
        assert_eq!(next(Some("restored"), None).unwrap(), "public.restored");
        assert_eq!(next(None, None).unwrap(), "public.sales_1_prt_3");
    }

    #[test]
    fn collisions() {
        let mut catalog = MemCatalog::new();
        catalog.add_relation(QualifiedName::new("public", "sales_1_prt_1"));
        let parent = parent("sales");
        let mut registry = NameRegistry::default();
        let mut namer = PartitionNamer::new(&parent, 63);

        let err = namer
            .next_name(&catalog, &mut registry, None, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::NameGenerationError { name, .. } if name == "sales_1_prt_1"));

        namer
            .next_name(&catalog, &mut registry, None, Some("a"), None)
            .unwrap();
        let err = namer
            .next_name(&catalog, &mut registry, Some("sales_1_prt_a"), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::NameGenerationError { .. }));

        let err = namer
            .next_name(&catalog, &mut registry, Some(&"x".repeat(64)), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::NameGenerationError { .. }));
    }

    proptest! {
        #[test]
        fn generated_names_fit(
            parent_name in "[a-zà-ÿ]{1,80}",
            label in "[a-z0-9_]{0,20}",
            max_len in 30..80_usize,
        ) {
            let label = format!("prt_{label}");
            let name = make_object_name(&parent_name, "1", &label, max_len).unwrap();
            prop_assert!(name.len() <= max_len);
            let suffix = format!("_{label}");
            prop_assert!(name.ends_with(&suffix));

            // deterministic
            let again = make_object_name(&parent_name, "1", &label, max_len).unwrap();
            prop_assert_eq!(name, again);
        }
    }
}
