use crate::{
    BindTarget, ColumnRef, Condition, Direction, EntityMetadata, Parameter, ParameterMetadata,
    PartTree, QueryCreator, Result, SqlWriter, TableRef, Value,
};
use anyhow::anyhow;
use std::borrow::Cow;

/// What the SELECT projects.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<ColumnRef>),
    /// `COUNT(column)`.
    Count(ColumnRef),
}

/// A fully assembled SELECT, ready to be rendered by a [`SqlWriter`].
/// Rendering is pure: the same `Select` renders to byte-identical SQL every
/// time, with bind marker numbering restarting per render.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub projection: Projection,
    pub table: TableRef,
    pub condition: Option<Condition>,
    pub order_by: Vec<(ColumnRef, Direction)>,
    pub limit: Option<u32>,
}

impl Select {
    pub fn to_sql(&self, writer: &dyn SqlWriter) -> String {
        let mut out = String::new();
        writer.write_select(&mut out, self);
        out
    }
}

/// Rendered SQL plus the ordered bind metadata of a derived query. Produced
/// once per method resolution, immutable, reused across invocations with
/// fresh argument values each call.
#[derive(Debug, Clone, PartialEq)]
pub struct BindableQuery {
    sql: String,
    method: String,
    metadata: Vec<ParameterMetadata>,
}

impl BindableQuery {
    pub fn new(sql: String, method: impl Into<String>, metadata: Vec<ParameterMetadata>) -> Self {
        Self {
            sql,
            method: method.into(),
            metadata,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn metadata(&self) -> &[ParameterMetadata] {
        &self.metadata
    }

    /// Push the runtime argument values into `target`, zipping them
    /// positionally with the metadata captured at resolution.
    ///
    /// Slots reclassified as IS NULL consume their value without binding
    /// anything. Named parameters bind by name; anonymous ones keep their own
    /// position counter since both kinds can interleave in one statement.
    pub fn bind<T: BindTarget>(&self, target: &mut T, values: &[Value]) -> Result<()> {
        if values.len() < self.metadata.len() {
            return Err(anyhow!(
                "Method `{}` expects {} argument values but only {} were supplied",
                self.method,
                self.metadata.len(),
                values.len(),
            ));
        }
        let mut position = 0;
        for (index, metadata) in self.metadata.iter().enumerate() {
            let value = &values[index];
            if metadata.is_null_parameter() {
                if !value.is_null() {
                    return Err(match metadata.name() {
                        Some(name) => anyhow!(
                            "Value of parameter with name `{}` must be null, \
                             the query was rendered with an IS NULL comparison",
                            name,
                        ),
                        None => anyhow!(
                            "Value of parameter at position {} must be null, \
                             the query was rendered with an IS NULL comparison",
                            index,
                        ),
                    });
                }
                continue;
            }
            if value.is_null() {
                return Err(match metadata.name() {
                    Some(name) => {
                        anyhow!("Value of parameter with name `{}` must not be null", name)
                    }
                    None => {
                        anyhow!("Value of parameter at position {} must not be null", index)
                    }
                });
            }
            let value = metadata.prepare(value.clone());
            match metadata.name() {
                Some(name) => target.bind_name(name, value)?,
                None => {
                    target.bind(position, value)?;
                    position += 1;
                }
            }
        }
        Ok(())
    }
}

/// A repository method signature: the derived name plus its declared
/// parameters, in declaration order.
#[derive(Debug, Clone)]
pub struct QueryMethod {
    name: Cow<'static, str>,
    parameters: Vec<Parameter>,
}

impl QueryMethod {
    pub fn new(name: impl Into<Cow<'static, str>>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// A method resolved against its entity: the name parsed into a [`PartTree`]
/// and the signature cross checked once, up front. Invocations then only pay
/// for assembling and rendering, via [`PartTreeQuery::bindable`].
#[derive(Debug, Clone)]
pub struct PartTreeQuery {
    method: QueryMethod,
    tree: PartTree,
}

impl PartTreeQuery {
    pub fn resolve(method: QueryMethod, entity: &dyn EntityMetadata) -> Result<Self> {
        let tree = PartTree::parse(method.name(), entity)?;
        QueryCreator::new(method.name(), &tree, entity).validate(method.parameters())?;
        Ok(Self { method, tree })
    }

    pub fn method(&self) -> &QueryMethod {
        &self.method
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    /// Assemble and render for one invocation. `values` are the runtime
    /// arguments, when known at render time they drive the null equality
    /// rewrite; pass `None` to render with every marker in place.
    pub fn bindable(
        &self,
        entity: &dyn EntityMetadata,
        values: Option<&[Value]>,
        writer: &dyn SqlWriter,
    ) -> Result<BindableQuery> {
        QueryCreator::new(self.method.name(), &self.tree, entity).bindable(
            self.method.parameters(),
            values,
            writer,
        )
    }
}
