//! The compiled `<key column> + <step>` expression used to step RANGE bounds.

use observability_deps::tracing::debug;
use partgen_types::{Datum, KeyColumn, Literal, Location, PlusOperator};

use crate::{Error, Result, bound_value::check_collation};

/// Evaluation state bound to one RANGE element: the parameter slot the current bound is
/// written into and a count of evaluations. Released when the owning evaluator is
/// dropped, whether expansion of the element finished or failed.
#[derive(Debug)]
pub(crate) struct EvaluationScope {
    column: String,
    param: Option<Datum>,
    evaluations: usize,
}

impl EvaluationScope {
    fn acquire(column: &str) -> Self {
        Self {
            column: column.to_string(),
            param: None,
            evaluations: 0,
        }
    }

    fn bind(&mut self, value: &Datum) -> &Datum {
        self.evaluations += 1;
        self.param.insert(value.clone())
    }
}

impl Drop for EvaluationScope {
    fn drop(&mut self) {
        debug!(
            column = %self.column,
            evaluations = self.evaluations,
            "released partition bound evaluation scope"
        );
    }
}

#[derive(Debug)]
pub(crate) struct SuccessorEvaluator {
    column: KeyColumn,
    operator: Box<dyn PlusOperator>,
    scope: EvaluationScope,
    location: Option<Location>,
}

impl SuccessorEvaluator {
    /// Resolve `+` between the column type and `step`.
    pub(crate) fn compile(column: &KeyColumn, step: &Literal) -> Result<Self> {
        check_collation(column, step)?;
        let operator = column
            .key_type
            .plus_operator(step, column.typmod)
            .map_err(|source| Error::NoOperator {
                column: column.name.clone(),
                source,
                location: step.location,
            })?;
        Ok(Self {
            column: column.clone(),
            operator,
            scope: EvaluationScope::acquire(&column.name),
            location: step.location,
        })
    }

    /// Evaluate `current + step`, returning a value the caller owns.
    pub(crate) fn next(&mut self, current: &Datum) -> Result<Datum> {
        let param = self.scope.bind(current);
        match self.operator.evaluate(param) {
            Ok(Some(value)) => Ok(self.column.key_type.copy_datum(&value)),
            Ok(None) => Err(Error::NullSuccessor {
                column: self.column.name.clone(),
            }),
            Err(source) => Err(Error::StepEvaluation {
                column: self.column.name.clone(),
                source,
                location: self.location,
            }),
        }
    }
}

/// Turn an inclusive upper bound into the equivalent exclusive one by adding 1.
pub(crate) fn canonicalize_range_end(column: &KeyColumn, end: &Datum) -> Result<Datum> {
    let mut evaluator = SuccessorEvaluator::compile(column, &Literal::integer(1))?;
    evaluator.next(end)
}
