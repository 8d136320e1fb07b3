use crate::Property;
use std::fmt::{self, Display, Formatter};

/// Operator of one predicate part derived from a repository method name.
///
/// Variants are listed in detection order: when two keywords overlap (for
/// example `NotNull` and `Null`, `NotIn` and `In`) the longer one must be
/// tried first so suffix matching stays unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Between,
    IsNotNull,
    IsNull,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Before,
    After,
    NotLike,
    Like,
    StartingWith,
    EndingWith,
    NotContaining,
    Containing,
    NotIn,
    In,
    True,
    False,
    NegatingSimpleProperty,
    SimpleProperty,
}

impl PartType {
    /// All types in detection order, `SimpleProperty` last as the fallback.
    pub const ALL: &'static [PartType] = &[
        PartType::Between,
        PartType::IsNotNull,
        PartType::IsNull,
        PartType::LessThanEqual,
        PartType::LessThan,
        PartType::GreaterThanEqual,
        PartType::GreaterThan,
        PartType::Before,
        PartType::After,
        PartType::NotLike,
        PartType::Like,
        PartType::StartingWith,
        PartType::EndingWith,
        PartType::NotContaining,
        PartType::Containing,
        PartType::NotIn,
        PartType::In,
        PartType::True,
        PartType::False,
        PartType::NegatingSimpleProperty,
        PartType::SimpleProperty,
    ];

    /// Method name keywords mapped to this operator, longest first.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            PartType::Between => &["IsBetween", "Between"],
            PartType::IsNotNull => &["IsNotNull", "NotNull"],
            PartType::IsNull => &["IsNull", "Null"],
            PartType::LessThan => &["IsLessThan", "LessThan"],
            PartType::LessThanEqual => &["IsLessThanEqual", "LessThanEqual"],
            PartType::GreaterThan => &["IsGreaterThan", "GreaterThan"],
            PartType::GreaterThanEqual => &["IsGreaterThanEqual", "GreaterThanEqual"],
            PartType::Before => &["IsBefore", "Before"],
            PartType::After => &["IsAfter", "After"],
            PartType::NotLike => &["IsNotLike", "NotLike"],
            PartType::Like => &["IsLike", "Like"],
            PartType::StartingWith => &["IsStartingWith", "StartingWith", "StartsWith"],
            PartType::EndingWith => &["IsEndingWith", "EndingWith", "EndsWith"],
            PartType::NotContaining => &["IsNotContaining", "NotContaining", "NotContains"],
            PartType::Containing => &["IsContaining", "Containing", "Contains"],
            PartType::NotIn => &["IsNotIn", "NotIn"],
            PartType::In => &["IsIn", "In"],
            PartType::True => &["IsTrue", "True"],
            PartType::False => &["IsFalse", "False"],
            PartType::NegatingSimpleProperty => &["IsNot", "Not"],
            PartType::SimpleProperty => &["Is", "Equals"],
        }
    }

    /// How many runtime arguments the operator consumes.
    pub fn number_of_arguments(&self) -> usize {
        match self {
            PartType::Between => 2,
            PartType::IsNotNull
            | PartType::IsNull
            | PartType::True
            | PartType::False => 0,
            _ => 1,
        }
    }

    /// Whether the single argument is expected to be a collection.
    pub fn expects_collection(&self) -> bool {
        matches!(self, PartType::In | PartType::NotIn)
    }

    /// Whether the argument feeds a LIKE pattern and must be escaped/wrapped.
    pub fn is_like_shaped(&self) -> bool {
        matches!(
            self,
            PartType::StartingWith
                | PartType::EndingWith
                | PartType::Containing
                | PartType::NotContaining
        )
    }

    /// Split a predicate token into operator and property prefix.
    ///
    /// Falls back to `SimpleProperty` with the whole token as property when no
    /// keyword matches. A keyword only matches when a non empty property
    /// remains in front of it.
    pub fn from_token(token: &str) -> (PartType, &str) {
        for part_type in Self::ALL {
            for keyword in part_type.keywords() {
                if let Some(property) = token.strip_suffix(keyword) {
                    if !property.is_empty() {
                        return (*part_type, property);
                    }
                }
            }
        }
        (PartType::SimpleProperty, token)
    }
}

impl Display for PartType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartType::Between => "BETWEEN",
            PartType::IsNotNull => "IS_NOT_NULL",
            PartType::IsNull => "IS_NULL",
            PartType::LessThan => "LESS_THAN",
            PartType::LessThanEqual => "LESS_THAN_EQUAL",
            PartType::GreaterThan => "GREATER_THAN",
            PartType::GreaterThanEqual => "GREATER_THAN_EQUAL",
            PartType::Before => "BEFORE",
            PartType::After => "AFTER",
            PartType::NotLike => "NOT_LIKE",
            PartType::Like => "LIKE",
            PartType::StartingWith => "STARTING_WITH",
            PartType::EndingWith => "ENDING_WITH",
            PartType::NotContaining => "NOT_CONTAINING",
            PartType::Containing => "CONTAINING",
            PartType::NotIn => "NOT_IN",
            PartType::In => "IN",
            PartType::True => "TRUE",
            PartType::False => "FALSE",
            PartType::NegatingSimpleProperty => "NEGATING_SIMPLE_PROPERTY",
            PartType::SimpleProperty => "SIMPLE_PROPERTY",
        })
    }
}

/// Case sensitivity requested for a predicate part.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreCase {
    /// Wrap both sides in UPPER(), error when the property is not textual.
    Always,
    /// Wrap only when the property is textual, otherwise leave untouched.
    WhenPossible,
    #[default]
    Never,
}

/// One atomic predicate: resolved property plus operator. Created once at
/// method resolution time and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub property: Property,
    pub part_type: PartType,
    pub ignore_case: IgnoreCase,
}

impl Display for Part {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property.path, self.part_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_keyword_wins() {
        assert_eq!(
            PartType::from_token("AgeLessThanEqual"),
            (PartType::LessThanEqual, "Age")
        );
        assert_eq!(
            PartType::from_token("AgeLessThan"),
            (PartType::LessThan, "Age")
        );
        assert_eq!(
            PartType::from_token("AgeIsNotNull"),
            (PartType::IsNotNull, "Age")
        );
        assert_eq!(PartType::from_token("AgeNotIn"), (PartType::NotIn, "Age"));
        assert_eq!(PartType::from_token("AgeIn"), (PartType::In, "Age"));
    }

    #[test]
    fn bare_property_is_simple_equality() {
        assert_eq!(
            PartType::from_token("FirstName"),
            (PartType::SimpleProperty, "FirstName")
        );
    }

    #[test]
    fn keyword_needs_a_property_in_front() {
        // A token that is nothing but a keyword is treated as a property name.
        assert_eq!(PartType::from_token("In"), (PartType::SimpleProperty, "In"));
    }

    #[test]
    fn argument_arity() {
        assert_eq!(PartType::Between.number_of_arguments(), 2);
        assert_eq!(PartType::IsNull.number_of_arguments(), 0);
        assert_eq!(PartType::True.number_of_arguments(), 0);
        assert_eq!(PartType::Containing.number_of_arguments(), 1);
    }
}
