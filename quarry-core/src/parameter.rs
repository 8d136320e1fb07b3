use crate::{Part, PartType, Result, Value};
use anyhow::anyhow;
use std::borrow::Cow;

/// Escapes LIKE wildcard characters in pattern fragments built from runtime
/// values, so `50%` matches the literal string instead of acting as a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeEscaper {
    escape: char,
}

impl LikeEscaper {
    pub const DEFAULT: LikeEscaper = LikeEscaper { escape: '\\' };

    /// A custom escape character. `%` and `_` cannot be used since they carry
    /// wildcard meaning inside LIKE patterns.
    pub fn of(escape: char) -> Result<Self> {
        if escape == '%' || escape == '_' {
            return Err(anyhow!(
                "Cannot use `{}` as the LIKE escape character",
                escape
            ));
        }
        Ok(Self { escape })
    }

    /// Prefix every `%`, `_` and escape character occurrence with the escape
    /// character.
    pub fn escape(&self, value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        for c in value.chars() {
            if c == '%' || c == '_' || c == self.escape {
                result.push(self.escape);
            }
            result.push(c);
        }
        result
    }
}

impl Default for LikeEscaper {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A declared bindable parameter of a repository method: optional explicit
/// name and a [`Value`] prototype describing its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<Cow<'static, str>>,
    pub prototype: Value,
}

impl Parameter {
    pub fn new(prototype: Value) -> Self {
        Self {
            name: None,
            prototype,
        }
    }

    pub fn named(name: impl Into<Cow<'static, str>>, prototype: Value) -> Self {
        Self {
            name: Some(name.into()),
            prototype,
        }
    }
}

/// Binding descriptor for one argument of one predicate part. Created once at
/// query resolution, consumed on every invocation; the value changes between
/// calls, the shape does not.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    name: Option<Cow<'static, str>>,
    type_hint: Value,
    part_type: PartType,
    is_null_parameter: bool,
    escaper: LikeEscaper,
}

impl ParameterMetadata {
    /// Explicit bind name, absent for positional binding.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn type_hint(&self) -> &Value {
        &self.type_hint
    }

    /// Whether a null argument value is reinterpreted as an IS NULL condition
    /// for this slot.
    pub fn is_null_parameter(&self) -> bool {
        self.is_null_parameter
    }

    /// Apply the value transformation belonging to the part's operator. LIKE
    /// shaped operators wrap the escaped text in `%` wildcards; everything
    /// else passes through untouched.
    pub fn prepare(&self, value: Value) -> Value {
        let Value::Varchar(Some(text)) = &value else {
            return value;
        };
        let escaped = self.escaper.escape(text);
        match self.part_type {
            PartType::StartingWith => Value::Varchar(Some(format!("{escaped}%"))),
            PartType::EndingWith => Value::Varchar(Some(format!("%{escaped}"))),
            PartType::Containing | PartType::NotContaining => {
                Value::Varchar(Some(format!("%{escaped}%")))
            }
            _ => value,
        }
    }
}

/// Walks the method's declared parameters in lockstep with the predicate
/// parts, producing one [`ParameterMetadata`] per required argument.
///
/// Two cursors advance together: the declared parameter cursor (name/type) and
/// an optional cursor over actual argument values used for null detection
/// during real invocations. Resolution-only passes have no value cursor.
#[derive(Debug)]
pub struct ParameterMetadataProvider<'a> {
    declared: &'a [Parameter],
    values: Option<&'a [Value]>,
    index: usize,
    escaper: LikeEscaper,
}

impl<'a> ParameterMetadataProvider<'a> {
    pub fn new(declared: &'a [Parameter], values: Option<&'a [Value]>) -> Self {
        Self::with_escaper(declared, values, LikeEscaper::DEFAULT)
    }

    pub fn with_escaper(
        declared: &'a [Parameter],
        values: Option<&'a [Value]>,
        escaper: LikeEscaper,
    ) -> Self {
        Self {
            declared,
            values,
            index: 0,
            escaper,
        }
    }

    /// Metadata for the next argument of `part`, advancing both cursors.
    pub fn next(&mut self, part: &Part) -> Result<ParameterMetadata> {
        let Some(parameter) = self.declared.get(self.index) else {
            return Err(anyhow!("No parameter available for part {}", part));
        };
        let value_is_null = self
            .values
            .map(|values| values.get(self.index).is_none_or(Value::is_null))
            .unwrap_or(false);
        self.index += 1;
        let equality = matches!(
            part.part_type,
            PartType::SimpleProperty | PartType::NegatingSimpleProperty
        );
        Ok(ParameterMetadata {
            name: parameter.name.clone(),
            type_hint: parameter.prototype.clone(),
            part_type: part.part_type,
            is_null_parameter: value_is_null && equality,
            escaper: self.escaper,
        })
    }
}
