use crate::{
    ColumnRef, IgnoreCase, ParameterMetadata, ParameterMetadataProvider, Part, PartType, Result,
    TableRef,
};
use anyhow::anyhow;
use std::borrow::Cow;

/// A scalar expression appearing on either side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpression {
    Column(ColumnRef),
    /// A bind marker slot. The placeholder text is synthesized by the
    /// dialect's marker factory at render time; `hint` feeds named markers.
    Marker { hint: Cow<'static, str> },
    /// An inline literal, quoted and escaped by the writer. Derived queries
    /// never produce these; the criteria API does.
    Literal(crate::Value),
    Upper(Box<SqlExpression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Neq => "!=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
        }
    }
}

/// The predicate tree of a derived query. Built left-to-right by the query
/// creator, immutable afterwards, rendered by the dialect's writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison {
        lhs: SqlExpression,
        comparator: Comparator,
        rhs: SqlExpression,
    },
    /// `lhs >= lower AND lhs <= upper`, markers consumed in order.
    Between {
        lhs: SqlExpression,
        lower: SqlExpression,
        upper: SqlExpression,
    },
    IsNull {
        lhs: SqlExpression,
        negated: bool,
    },
    Like {
        lhs: SqlExpression,
        rhs: SqlExpression,
        negated: bool,
    },
    /// `lhs IN (marker)`, one marker carrying the whole collection.
    In {
        lhs: SqlExpression,
        rhs: SqlExpression,
        negated: bool,
    },
    /// `lhs = TRUE` / `lhs = FALSE`, no bind marker.
    Test {
        lhs: SqlExpression,
        value: bool,
    },
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        Condition::And(self.into(), other.into())
    }

    pub fn or(self, other: Condition) -> Condition {
        Condition::Or(self.into(), other.into())
    }

    /// Binding strength used for parenthesization when rendering nested
    /// conditions. Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Condition::Or(..) => 100,
            Condition::And(..) | Condition::Between { .. } => 200,
            _ => 255,
        }
    }
}

/// Turns one predicate part into a [`Condition`], consuming the part's
/// arguments from the metadata provider as a side effect. The metadata
/// consumed here is collected in order and later zipped with runtime values
/// at bind time.
pub struct ConditionFactory<'a, 'b, 'p> {
    table: &'a TableRef,
    provider: &'b mut ParameterMetadataProvider<'p>,
    metadata: Vec<ParameterMetadata>,
}

impl<'a, 'b, 'p> ConditionFactory<'a, 'b, 'p> {
    pub fn new(table: &'a TableRef, provider: &'b mut ParameterMetadataProvider<'p>) -> Self {
        Self {
            table,
            provider,
            metadata: Vec::new(),
        }
    }

    /// The bind metadata consumed so far, in marker order.
    pub fn into_metadata(self) -> Vec<ParameterMetadata> {
        self.metadata
    }

    pub fn create_condition(&mut self, part: &Part) -> Result<Condition> {
        let upper = self.must_upper(part)?;
        let column = self.column(part, upper);
        Ok(match part.part_type {
            PartType::SimpleProperty | PartType::NegatingSimpleProperty => {
                let metadata = self.next(part)?;
                let condition = if metadata.is_null_parameter() {
                    Condition::IsNull {
                        lhs: column,
                        negated: false,
                    }
                } else {
                    Condition::Comparison {
                        lhs: column,
                        comparator: Comparator::Eq,
                        rhs: self.marker(part, &metadata, upper),
                    }
                };
                self.metadata.push(metadata);
                if part.part_type == PartType::NegatingSimpleProperty {
                    Condition::Not(condition.into())
                } else {
                    condition
                }
            }
            PartType::Between => {
                let lower_metadata = self.next(part)?;
                let lower = self.marker(part, &lower_metadata, upper);
                self.metadata.push(lower_metadata);
                let upper_metadata = self.next(part)?;
                let upper_marker = self.marker(part, &upper_metadata, upper);
                self.metadata.push(upper_metadata);
                Condition::Between {
                    lhs: column,
                    lower,
                    upper: upper_marker,
                }
            }
            PartType::GreaterThan | PartType::After => {
                self.comparison(part, column, Comparator::Gt, upper)?
            }
            PartType::GreaterThanEqual => self.comparison(part, column, Comparator::Gte, upper)?,
            PartType::LessThan | PartType::Before => {
                self.comparison(part, column, Comparator::Lt, upper)?
            }
            PartType::LessThanEqual => self.comparison(part, column, Comparator::Lte, upper)?,
            PartType::IsNull => Condition::IsNull {
                lhs: column,
                negated: false,
            },
            PartType::IsNotNull => Condition::IsNull {
                lhs: column,
                negated: true,
            },
            PartType::Like
            | PartType::StartingWith
            | PartType::EndingWith
            | PartType::Containing => {
                let metadata = self.next(part)?;
                let rhs = self.marker(part, &metadata, upper);
                self.metadata.push(metadata);
                Condition::Like {
                    lhs: column,
                    rhs,
                    negated: false,
                }
            }
            PartType::NotLike | PartType::NotContaining => {
                let metadata = self.next(part)?;
                let rhs = self.marker(part, &metadata, upper);
                self.metadata.push(metadata);
                Condition::Like {
                    lhs: column,
                    rhs,
                    negated: true,
                }
            }
            PartType::In | PartType::NotIn => {
                let metadata = self.next(part)?;
                let rhs = self.marker(part, &metadata, upper);
                self.metadata.push(metadata);
                Condition::In {
                    lhs: column,
                    rhs,
                    negated: part.part_type == PartType::NotIn,
                }
            }
            PartType::True => Condition::Test {
                lhs: column,
                value: true,
            },
            PartType::False => Condition::Test {
                lhs: column,
                value: false,
            },
        })
    }

    fn comparison(
        &mut self,
        part: &Part,
        lhs: SqlExpression,
        comparator: Comparator,
        upper: bool,
    ) -> Result<Condition> {
        let metadata = self.next(part)?;
        let rhs = self.marker(part, &metadata, upper);
        self.metadata.push(metadata);
        Ok(Condition::Comparison {
            lhs,
            comparator,
            rhs,
        })
    }

    fn next(&mut self, part: &Part) -> Result<ParameterMetadata> {
        self.provider.next(part)
    }

    /// Whether both sides of this part's condition get wrapped in `UPPER()`.
    /// ALWAYS on a non-textual property is a resolution failure.
    fn must_upper(&self, part: &Part) -> Result<bool> {
        let textual = part.property.prototype.is_textual();
        match part.ignore_case {
            IgnoreCase::Never => Ok(false),
            IgnoreCase::WhenPossible => Ok(textual),
            IgnoreCase::Always if textual => Ok(true),
            IgnoreCase::Always => Err(anyhow!(
                "Unable to ignore case of {} type, the property `{}` must reference a string",
                part.property.prototype.type_name(),
                part.property.path,
            )),
        }
    }

    fn column(&self, part: &Part, upper: bool) -> SqlExpression {
        let column = SqlExpression::Column(ColumnRef::new(
            part.property.column.clone(),
            self.table.name.clone(),
        ));
        Self::wrap(column, upper)
    }

    fn marker(&self, part: &Part, metadata: &ParameterMetadata, upper: bool) -> SqlExpression {
        let hint = match metadata.name() {
            Some(name) => Cow::Owned(name.to_owned()),
            None => match &part.property.path {
                Cow::Borrowed(path) if !path.contains('.') => Cow::Borrowed(*path),
                path => Cow::Owned(path.replace('.', "_")),
            },
        };
        Self::wrap(SqlExpression::Marker { hint }, upper)
    }

    fn wrap(expression: SqlExpression, upper: bool) -> SqlExpression {
        if upper {
            SqlExpression::Upper(expression.into())
        } else {
            expression
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parameter, Property, Value};

    fn table() -> TableRef {
        TableRef::new("users")
    }

    fn part(part_type: PartType, ignore_case: IgnoreCase) -> Part {
        Part {
            property: Property::new("firstName", "first_name", Value::Varchar(None)),
            part_type,
            ignore_case,
        }
    }

    fn column() -> SqlExpression {
        SqlExpression::Column(ColumnRef::new("first_name", "users"))
    }

    fn marker() -> SqlExpression {
        SqlExpression::Marker {
            hint: "firstName".into(),
        }
    }

    #[test]
    fn equality_produces_a_comparison() {
        let table = table();
        let declared = [Parameter::new(Value::Varchar(None))];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let condition = factory
            .create_condition(&part(PartType::SimpleProperty, IgnoreCase::Never))
            .unwrap();
        assert_eq!(
            condition,
            Condition::Comparison {
                lhs: column(),
                comparator: Comparator::Eq,
                rhs: marker(),
            }
        );
        assert_eq!(factory.into_metadata().len(), 1);
    }

    #[test]
    fn null_value_reclassifies_equality_as_is_null() {
        let table = table();
        let declared = [Parameter::new(Value::Varchar(None))];
        let values = [Value::Varchar(None)];
        let mut provider = ParameterMetadataProvider::new(&declared, Some(&values));
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let condition = factory
            .create_condition(&part(PartType::SimpleProperty, IgnoreCase::Never))
            .unwrap();
        assert_eq!(
            condition,
            Condition::IsNull {
                lhs: column(),
                negated: false,
            }
        );
        // The slot still occupies a place in the metadata list so bind-time
        // zipping stays aligned.
        let metadata = factory.into_metadata();
        assert_eq!(metadata.len(), 1);
        assert!(metadata[0].is_null_parameter());
    }

    #[test]
    fn negated_equality_wraps_in_not() {
        let table = table();
        let declared = [Parameter::new(Value::Varchar(None))];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let condition = factory
            .create_condition(&part(PartType::NegatingSimpleProperty, IgnoreCase::Never))
            .unwrap();
        assert_eq!(
            condition,
            Condition::Not(
                Condition::Comparison {
                    lhs: column(),
                    comparator: Comparator::Eq,
                    rhs: marker(),
                }
                .into()
            )
        );
    }

    #[test]
    fn between_consumes_two_markers() {
        let table = table();
        let declared = [
            Parameter::new(Value::Int32(None)),
            Parameter::new(Value::Int32(None)),
        ];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let age = Part {
            property: Property::new("age", "age", Value::Int32(None)),
            part_type: PartType::Between,
            ignore_case: IgnoreCase::Never,
        };
        let condition = factory.create_condition(&age).unwrap();
        assert!(matches!(condition, Condition::Between { .. }));
        assert_eq!(factory.into_metadata().len(), 2);
    }

    #[test]
    fn ignore_case_wraps_both_sides() {
        let table = table();
        let declared = [Parameter::new(Value::Varchar(None))];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let condition = factory
            .create_condition(&part(PartType::SimpleProperty, IgnoreCase::Always))
            .unwrap();
        assert_eq!(
            condition,
            Condition::Comparison {
                lhs: SqlExpression::Upper(column().into()),
                comparator: Comparator::Eq,
                rhs: SqlExpression::Upper(marker().into()),
            }
        );
    }

    #[test]
    fn ignore_case_on_non_text_property_fails() {
        let table = table();
        let declared = [Parameter::new(Value::Int32(None))];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let age = Part {
            property: Property::new("age", "age", Value::Int32(None)),
            part_type: PartType::SimpleProperty,
            ignore_case: IgnoreCase::Always,
        };
        let error = factory.create_condition(&age).unwrap_err();
        assert!(error.to_string().contains("Unable to ignore case"));

        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let age = Part {
            property: Property::new("age", "age", Value::Int32(None)),
            part_type: PartType::SimpleProperty,
            ignore_case: IgnoreCase::WhenPossible,
        };
        // WHEN_POSSIBLE silently leaves non-text properties untouched.
        let condition = factory.create_condition(&age).unwrap();
        assert!(matches!(
            condition,
            Condition::Comparison {
                lhs: SqlExpression::Column(_),
                ..
            }
        ));
    }

    #[test]
    fn true_and_false_take_no_arguments() {
        let table = table();
        let declared = [];
        let mut provider = ParameterMetadataProvider::new(&declared, None);
        let mut factory = ConditionFactory::new(&table, &mut provider);
        let active = Part {
            property: Property::new("active", "active", Value::Boolean(None)),
            part_type: PartType::True,
            ignore_case: IgnoreCase::Never,
        };
        let condition = factory.create_condition(&active).unwrap();
        assert_eq!(
            condition,
            Condition::Test {
                lhs: SqlExpression::Column(ColumnRef::new("active", "users")),
                value: true,
            }
        );
        assert!(factory.into_metadata().is_empty());
    }
}
