mod as_value;
mod column;
mod condition;
mod creator;
mod criteria;
mod dialect;
mod entity;
mod parameter;
mod part;
mod part_tree;
mod query;
mod statement;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use column::*;
pub use condition::*;
pub use creator::*;
pub use criteria::*;
pub use dialect::*;
pub use entity::*;
pub use parameter::*;
pub use part::*;
pub use part_tree::*;
pub use query::*;
pub use statement::*;
pub use util::*;
pub use value::*;
pub use writer::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
