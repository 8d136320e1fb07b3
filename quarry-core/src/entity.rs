use crate::{ColumnRef, TableRef, Value};
use std::borrow::Cow;

/// One mapped property of an entity: the logical dot path used in repository
/// method names, the physical column it maps to and a [`Value`] prototype
/// describing its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub path: Cow<'static, str>,
    pub column: Cow<'static, str>,
    pub prototype: Value,
    pub identifier: bool,
}

impl Property {
    pub fn new(
        path: impl Into<Cow<'static, str>>,
        column: impl Into<Cow<'static, str>>,
        prototype: Value,
    ) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
            prototype,
            identifier: false,
        }
    }

    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }
}

/// Metadata about the entity a repository manages. The query engine only ever
/// consumes this narrow interface: it never reflects over host types.
pub trait EntityMetadata {
    fn table_ref(&self) -> &TableRef;
    /// All mapped columns in declaration order.
    fn properties(&self) -> &[Property];
    /// The identifier (primary key) subset of [`EntityMetadata::properties`].
    fn id_properties(&self) -> Vec<&Property> {
        self.properties().iter().filter(|p| p.identifier).collect()
    }
    /// Resolve a dot separated property path, `None` when it does not exist.
    fn resolve_property(&self, path: &str) -> Option<&Property>;

    fn column_ref(&self, property: &Property) -> ColumnRef {
        ColumnRef::new(property.column.clone(), self.table_ref().name.clone())
    }
}

/// Straightforward [`EntityMetadata`] backed by an explicit property list.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    table: TableRef,
    properties: Vec<Property>,
}

impl TableMetadata {
    pub fn new(table: impl Into<Cow<'static, str>>, properties: Vec<Property>) -> Self {
        Self {
            table: TableRef::new(table),
            properties,
        }
    }
}

impl EntityMetadata for TableMetadata {
    fn table_ref(&self) -> &TableRef {
        &self.table
    }
    fn properties(&self) -> &[Property] {
        &self.properties
    }
    fn resolve_property(&self, path: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_declared_paths_only() {
        let metadata = TableMetadata::new(
            "users",
            vec![
                Property::new("id", "id", Value::Int64(None)).identifier(),
                Property::new("firstName", "first_name", Value::Varchar(None)),
            ],
        );
        assert_eq!(
            metadata.resolve_property("firstName").map(|p| &*p.column),
            Some("first_name")
        );
        assert!(metadata.resolve_property("first_name").is_none());
        assert_eq!(metadata.id_properties().len(), 1);
    }
}
