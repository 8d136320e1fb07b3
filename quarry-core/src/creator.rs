use crate::{
    BindableQuery, ColumnRef, Condition, ConditionFactory, EntityMetadata, Parameter,
    ParameterMetadata, ParameterMetadataProvider, PartTree, Projection, Result, Select, SqlWriter,
    Value,
};
use anyhow::anyhow;

/// Folds a parsed [`PartTree`] into a renderable [`Select`]: AND within a
/// group, OR between groups, left associative, no reordering.
pub struct QueryCreator<'a> {
    method: &'a str,
    tree: &'a PartTree,
    entity: &'a dyn EntityMetadata,
}

impl<'a> QueryCreator<'a> {
    pub fn new(method: &'a str, tree: &'a PartTree, entity: &'a dyn EntityMetadata) -> Self {
        Self {
            method,
            tree,
            entity,
        }
    }

    /// Cross check the method name against the declared parameter list before
    /// consuming anything, so a mismatch surfaces as one clear error instead
    /// of a cursor underflow halfway through assembly.
    pub fn validate(&self, declared: &[Parameter]) -> Result<()> {
        let mut index = 0;
        for part in self.tree.parts() {
            let arguments = part.part_type.number_of_arguments();
            if arguments == 0 {
                continue;
            }
            if index + arguments > declared.len() {
                return Err(anyhow!(
                    "Method `{}` expects at least {} arguments but only found {}. \
                     This leaves an operator of type {} for property `{}` unbound",
                    self.method,
                    index + arguments,
                    declared.len(),
                    part.part_type,
                    part.property.path,
                ));
            }
            if part.part_type.expects_collection() && !declared[index].prototype.is_collection() {
                return Err(anyhow!(
                    "Operator {} on `{}` requires a collection argument, \
                     but method `{}` declares parameter {} of type {}",
                    part.part_type,
                    part.property.path,
                    self.method,
                    index,
                    declared[index].prototype.type_name(),
                ));
            }
            index += arguments;
        }
        Ok(())
    }

    /// Assemble the SELECT and the ordered bind metadata its markers refer to.
    pub fn create(
        &self,
        provider: &mut ParameterMetadataProvider<'_>,
    ) -> Result<(Select, Vec<ParameterMetadata>)> {
        if self.tree.subject.delete {
            return Err(anyhow!(
                "Derived delete queries are not supported, method `{}`",
                self.method
            ));
        }
        let table = self.entity.table_ref();
        let mut factory = ConditionFactory::new(table, provider);
        let mut condition: Option<Condition> = None;
        for group in &self.tree.or_parts {
            let mut conjunction: Option<Condition> = None;
            for part in group {
                let next = factory.create_condition(part)?;
                conjunction = Some(match conjunction {
                    Some(left) => left.and(next),
                    None => next,
                });
            }
            if let Some(conjunction) = conjunction {
                condition = Some(match condition {
                    Some(left) => left.or(conjunction),
                    None => conjunction,
                });
            }
        }
        let select = Select {
            distinct: self.tree.subject.distinct,
            projection: self.projection()?,
            table: table.clone(),
            condition,
            order_by: self
                .tree
                .sort
                .iter()
                .map(|order| (ColumnRef::new(order.property.column.clone(), ""), order.direction))
                .collect(),
            limit: if self.tree.is_exists_projection() {
                Some(1)
            } else {
                self.tree.subject.limit
            },
        };
        Ok((select, factory.into_metadata()))
    }

    /// Validate, assemble and render in one go.
    pub fn bindable(
        &self,
        declared: &[Parameter],
        values: Option<&[Value]>,
        writer: &dyn SqlWriter,
    ) -> Result<BindableQuery> {
        self.validate(declared)?;
        let mut provider = ParameterMetadataProvider::new(declared, values);
        let (select, metadata) = self.create(&mut provider)?;
        let sql = select.to_sql(writer);
        log::debug!("Derived query for method `{}`: {}", self.method, sql);
        Ok(BindableQuery::new(sql, self.method, metadata))
    }

    fn projection(&self) -> Result<Projection> {
        let entity = self.entity;
        let all = || {
            entity
                .properties()
                .iter()
                .map(|p| entity.column_ref(p))
                .collect::<Vec<_>>()
        };
        Ok(if self.tree.is_count_projection() {
            let column = entity
                .id_properties()
                .first()
                .copied()
                .or_else(|| entity.properties().first())
                .ok_or_else(|| {
                    anyhow!("Table `{}` maps no columns", entity.table_ref().full_name())
                })?;
            Projection::Count(entity.column_ref(column))
        } else if self.tree.is_exists_projection() {
            let ids = entity
                .id_properties()
                .into_iter()
                .map(|p| entity.column_ref(p))
                .collect::<Vec<_>>();
            Projection::Columns(if ids.is_empty() { all() } else { ids })
        } else {
            Projection::Columns(all())
        })
    }
}

/// Resolve a repository method end to end: parse the name, cross check the
/// signature, assemble and render the SELECT for the given dialect writer.
pub fn derive_query(
    method: &str,
    entity: &dyn EntityMetadata,
    declared: &[Parameter],
    values: Option<&[Value]>,
    writer: &dyn SqlWriter,
) -> Result<BindableQuery> {
    let tree = PartTree::parse(method, entity)?;
    QueryCreator::new(method, &tree, entity).bindable(declared, values, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenericSqlWriter, Property, TableMetadata, Value};

    fn users() -> TableMetadata {
        TableMetadata::new(
            "users",
            vec![
                Property::new("id", "id", Value::Int64(None)).identifier(),
                Property::new("firstName", "first_name", Value::Varchar(None)),
                Property::new("lastName", "last_name", Value::Varchar(None)),
            ],
        )
    }

    fn varchar() -> Parameter {
        Parameter::new(Value::Varchar(None))
    }

    #[test]
    fn projects_all_columns_for_find() {
        let users = users();
        let query = derive_query(
            "findAllByLastName",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT users.id, users.first_name, users.last_name FROM users \
             WHERE users.last_name = ?"
        );
    }

    #[test]
    fn exists_projects_id_and_limits_to_one() {
        let users = users();
        let query = derive_query(
            "existsByFirstName",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT users.id FROM users WHERE users.first_name = ? LIMIT 1"
        );
    }

    #[test]
    fn count_projects_count_of_id() {
        let users = users();
        let query = derive_query(
            "countByFirstName",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT COUNT(users.id) FROM users WHERE users.first_name = ?"
        );
    }

    #[test]
    fn no_predicate_renders_without_where() {
        let users = users();
        let query = derive_query("findAll", &users, &[], None, &GenericSqlWriter {}).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT users.id, users.first_name, users.last_name FROM users"
        );
    }

    #[test]
    fn missing_argument_is_reported_with_the_unbound_part() {
        let users = users();
        let error = derive_query(
            "findAllByFirstNameAndLastName",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap_err();
        let message = error.to_string();
        assert!(message.contains("expects at least 2 arguments but only found 1"));
        assert!(message.contains("SIMPLE_PROPERTY"));
        assert!(message.contains("lastName"));
    }

    #[test]
    fn in_operator_requires_a_collection_parameter() {
        let users = users();
        let error = derive_query(
            "findAllByFirstNameIn",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap_err();
        assert!(error.to_string().contains("requires a collection argument"));

        let declared = [Parameter::new(Value::List(
            None,
            Value::Varchar(None).into(),
        ))];
        let query = derive_query(
            "findAllByFirstNameIn",
            &users,
            &declared,
            None,
            &GenericSqlWriter {},
        )
        .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT users.id, users.first_name, users.last_name FROM users \
             WHERE users.first_name IN (?)"
        );
    }

    #[test]
    fn delete_queries_are_rejected() {
        let users = users();
        let error = derive_query(
            "deleteByFirstName",
            &users,
            &[varchar()],
            None,
            &GenericSqlWriter {},
        )
        .unwrap_err();
        assert!(error.to_string().contains("not supported"));
    }
}
