use crate::{
    AsValue, ColumnRef, Comparator, Condition, Fragment, SqlExpression, SqlWriter, writer::Context,
};
use std::borrow::Cow;

/// Programmatic counterpart to derived queries: a fluent builder chaining
/// column predicates into a [`Condition`] with inline literal values.
///
/// ```
/// use quarry_core::{Criteria, GenericSqlWriter};
///
/// let criteria = Criteria::column("first_name")
///     .is("John")
///     .and("age")
///     .greater_than(21);
/// assert_eq!(
///     criteria.to_sql(&GenericSqlWriter {}),
///     "first_name = 'John' AND age > 21"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    condition: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

/// A criteria chain waiting for its comparison operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaStep {
    column: Cow<'static, str>,
    previous: Option<(Box<Criteria>, Combinator)>,
}

impl Criteria {
    /// Start a new chain on `column`.
    pub fn column(column: impl Into<Cow<'static, str>>) -> CriteriaStep {
        CriteriaStep {
            column: column.into(),
            previous: None,
        }
    }

    /// Continue the chain with an AND branch on `column`.
    pub fn and(self, column: impl Into<Cow<'static, str>>) -> CriteriaStep {
        CriteriaStep {
            column: column.into(),
            previous: Some((self.into(), Combinator::And)),
        }
    }

    /// Continue the chain with an OR branch on `column`.
    pub fn or(self, column: impl Into<Cow<'static, str>>) -> CriteriaStep {
        CriteriaStep {
            column: column.into(),
            previous: Some((self.into(), Combinator::Or)),
        }
    }

    pub fn into_condition(self) -> Condition {
        self.condition
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn to_sql(&self, writer: &dyn SqlWriter) -> String {
        let mut out = String::new();
        let mut context = Context::new(
            Fragment::SqlSelectWhere,
            true,
            writer.bind_markers_factory().create(),
        );
        writer.write_condition(&mut context, &mut out, &self.condition);
        out
    }
}

impl CriteriaStep {
    pub fn is(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::Comparison {
            lhs,
            comparator: Comparator::Eq,
            rhs,
        })
    }

    pub fn not(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::Comparison {
            lhs,
            comparator: Comparator::Neq,
            rhs,
        })
    }

    pub fn greater_than(self, value: impl AsValue) -> Criteria {
        self.comparison(Comparator::Gt, value)
    }

    pub fn greater_than_or_equals(self, value: impl AsValue) -> Criteria {
        self.comparison(Comparator::Gte, value)
    }

    pub fn less_than(self, value: impl AsValue) -> Criteria {
        self.comparison(Comparator::Lt, value)
    }

    pub fn less_than_or_equals(self, value: impl AsValue) -> Criteria {
        self.comparison(Comparator::Lte, value)
    }

    pub fn like(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::Like {
            lhs,
            rhs,
            negated: false,
        })
    }

    pub fn not_like(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::Like {
            lhs,
            rhs,
            negated: true,
        })
    }

    /// `column IN (…)`, expecting a collection value.
    pub fn is_in(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::In {
            lhs,
            rhs,
            negated: false,
        })
    }

    pub fn not_in(self, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::In {
            lhs,
            rhs,
            negated: true,
        })
    }

    pub fn is_null(self) -> Criteria {
        let lhs = self.expression();
        self.finish(Condition::IsNull {
            lhs,
            negated: false,
        })
    }

    pub fn is_not_null(self) -> Criteria {
        let lhs = self.expression();
        self.finish(Condition::IsNull { lhs, negated: true })
    }

    pub fn is_true(self) -> Criteria {
        let lhs = self.expression();
        self.finish(Condition::Test { lhs, value: true })
    }

    pub fn is_false(self) -> Criteria {
        let lhs = self.expression();
        self.finish(Condition::Test { lhs, value: false })
    }

    fn comparison(self, comparator: Comparator, value: impl AsValue) -> Criteria {
        let rhs = SqlExpression::Literal(value.as_value());
        let lhs = self.expression();
        self.finish(Condition::Comparison {
            lhs,
            comparator,
            rhs,
        })
    }

    fn expression(&self) -> SqlExpression {
        SqlExpression::Column(ColumnRef::new(self.column.clone(), ""))
    }

    fn finish(self, condition: Condition) -> Criteria {
        let condition = match self.previous {
            Some((previous, Combinator::And)) => previous.condition.and(condition),
            Some((previous, Combinator::Or)) => previous.condition.or(condition),
            None => condition,
        };
        Criteria { condition }
    }
}
