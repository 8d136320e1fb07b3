use crate::{Result, Value};

/// Execution sink populated by [`crate::BindableQuery::bind`]. Implemented by
/// driver statement wrappers; the engine itself never executes anything.
pub trait BindTarget {
    fn bind(&mut self, position: usize, value: Value) -> Result<()>;
    fn bind_name(&mut self, name: &str, value: Value) -> Result<()>;
}

/// Where a bound value landed inside a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub enum BindSlot {
    Position(usize),
    Name(String),
}

/// In-memory statement capturing its bindings in call order, in place of a
/// driver statement.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    bindings: Vec<(BindSlot, Value)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bindings(&self) -> &[(BindSlot, Value)] {
        &self.bindings
    }
}

impl BindTarget for Statement {
    fn bind(&mut self, position: usize, value: Value) -> Result<()> {
        self.bindings.push((BindSlot::Position(position), value));
        Ok(())
    }

    fn bind_name(&mut self, name: &str, value: Value) -> Result<()> {
        self.bindings.push((BindSlot::Name(name.to_owned()), value));
        Ok(())
    }
}
