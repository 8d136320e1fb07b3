use std::borrow::Cow;

/// Reference to a table, optionally schema qualified.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
}

impl TableRef {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            schema: "".into(),
        }
    }

    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(&self.schema);
            result.push('.');
        }
        result.push_str(&self.name);
        result
    }
}

/// Reference to a column of a table.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: Cow<'static, str>,
    pub table: Cow<'static, str>,
}

impl ColumnRef {
    pub fn new(name: impl Into<Cow<'static, str>>, table: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
        }
    }
}
