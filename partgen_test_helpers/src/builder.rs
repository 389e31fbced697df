use partgen_types::{
    BoundaryClause, ColumnEncoding, Literal, Location, OptionValue, PartitionDefinition,
    PartitionElement, StorageOption,
};

/// An integer literal.
pub fn int(value: i64) -> Literal {
    Literal::integer(value)
}

/// A quoted string literal.
pub fn text(value: &str) -> Literal {
    Literal::string(value)
}

/// Builds a [`PartitionElement`].
///
/// ```
/// use partgen_test_helpers::{ElementBuilder, int};
///
/// let element = ElementBuilder::named("p")
///     .start(int(1))
///     .end(int(10))
///     .every(int(3))
///     .build();
/// assert_eq!(element.name.as_deref(), Some("p"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    element: PartitionElement,
    range: Option<RangeClause>,
}

#[derive(Debug, Clone, Default)]
struct RangeClause {
    start: Option<Vec<Literal>>,
    end: Option<Vec<Literal>>,
    end_inclusive: bool,
    every: Option<Vec<Literal>>,
}

impl ElementBuilder {
    /// An unnamed element.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self::new().name(name)
    }

    /// `DEFAULT PARTITION <name>`.
    pub fn default_partition(name: &str) -> Self {
        let mut builder = Self::named(name);
        builder.element.boundary = Some(BoundaryClause::Default);
        builder.range = None;
        builder
    }

    pub fn name(mut self, name: &str) -> Self {
        self.element.name = Some(name.to_string());
        self
    }

    fn range(&mut self) -> &mut RangeClause {
        self.range.get_or_insert_with(RangeClause::default)
    }

    pub fn start(mut self, value: Literal) -> Self {
        self.range().start = Some(vec![value]);
        self
    }

    pub fn end(mut self, value: Literal) -> Self {
        self.range().end = Some(vec![value]);
        self
    }

    /// `END (value) INCLUSIVE`.
    pub fn end_inclusive(mut self, value: Literal) -> Self {
        let range = self.range();
        range.end = Some(vec![value]);
        range.end_inclusive = true;
        self
    }

    pub fn every(mut self, value: Literal) -> Self {
        self.range().every = Some(vec![value]);
        self
    }

    /// Replace the whole range clause, for arity tests.
    pub fn range_clause(
        mut self,
        start: Option<Vec<Literal>>,
        end: Option<Vec<Literal>>,
        every: Option<Vec<Literal>>,
    ) -> Self {
        self.range = Some(RangeClause {
            start,
            end,
            end_inclusive: false,
            every,
        });
        self
    }

    /// `VALUES (v1, v2, ..)` with single-value tuples.
    pub fn values(self, values: impl IntoIterator<Item = Literal>) -> Self {
        self.value_tuples(values.into_iter().map(|v| vec![v]).collect())
    }

    pub fn value_tuples(mut self, values: Vec<Vec<Literal>>) -> Self {
        self.element.boundary = Some(BoundaryClause::List { values });
        self.range = None;
        self
    }

    pub fn option(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.element.options.push(StorageOption::new(name, value));
        self
    }

    pub fn tablespace(mut self, tablespace: &str) -> Self {
        self.element.tablespace = Some(tablespace.to_string());
        self
    }

    pub fn access_method(mut self, access_method: &str) -> Self {
        self.element.access_method = Some(access_method.to_string());
        self
    }

    pub fn encoding(mut self, encoding: ColumnEncoding) -> Self {
        self.element.column_encodings.push(encoding);
        self
    }

    pub fn sub_partition(mut self, definition: PartitionDefinition) -> Self {
        self.element.sub_partition = Some(definition);
        self
    }

    pub fn at(mut self, location: usize) -> Self {
        self.element.location = Some(Location::new(location));
        self
    }

    pub fn build(mut self) -> PartitionElement {
        if let Some(range) = self.range {
            self.element.boundary = Some(BoundaryClause::Range {
                start: range.start,
                end: range.end,
                end_inclusive: range.end_inclusive,
                every: range.every,
            });
        }
        self.element
    }
}

/// Builds a [`PartitionDefinition`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionBuilder {
    definition: PartitionDefinition,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, element: ElementBuilder) -> Self {
        self.definition.elements.push(element.build());
        self
    }

    pub fn encoding(mut self, encoding: ColumnEncoding) -> Self {
        self.definition.column_encodings.push(encoding);
        self
    }

    /// Mark the definition as a `SUBPARTITION TEMPLATE`.
    pub fn template(mut self) -> Self {
        self.definition.is_template = true;
        self
    }

    pub fn build(self) -> PartitionDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn range_clause_accumulates() {
        let element = ElementBuilder::named("p")
            .start(int(1))
            .end_inclusive(int(9))
            .every(int(2))
            .build();
        assert_eq!(
            element.boundary,
            Some(BoundaryClause::Range {
                start: Some(vec![int(1)]),
                end: Some(vec![int(9)]),
                end_inclusive: true,
                every: Some(vec![int(2)]),
            })
        );
    }

    #[test]
    fn list_and_default() {
        let list = ElementBuilder::named("l").values([text("a"), text("b")]).build();
        assert_eq!(
            list.boundary,
            Some(BoundaryClause::List {
                values: vec![vec![text("a")], vec![text("b")]],
            })
        );
        assert!(ElementBuilder::default_partition("other").build().is_default());
    }
}
