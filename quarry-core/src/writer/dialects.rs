use crate::{BindMarkersFactory, SqlWriter, writer::Context};

/// ANSI flavored writer with anonymous `?` markers.
pub struct GenericSqlWriter {}

impl SqlWriter for GenericSqlWriter {}

/// PostgreSQL: `$1, $2, …` markers, everything else ANSI.
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn bind_markers_factory(&self) -> BindMarkersFactory {
        BindMarkersFactory::indexed("$", 1)
    }
}

/// SQL Server: named `@P0_name` markers, bracket quoting, FETCH based limit.
pub struct SqlServerSqlWriter {}

impl SqlWriter for SqlServerSqlWriter {
    fn bind_markers_factory(&self) -> BindMarkersFactory {
        BindMarkersFactory::named("@", "P")
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('[');
        self.write_escaped(context, out, value, ']', "]]");
        out.push(']');
    }

    // T-SQL accepts OFFSET / FETCH only after an ORDER BY clause.
    fn write_limit(&self, _context: &mut Context, out: &mut String, limit: u32, ordered: bool) {
        if !ordered {
            out.push_str(" ORDER BY (SELECT 1)");
        }
        out.push_str(" OFFSET 0 ROWS FETCH FIRST ");
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(limit));
        out.push_str(" ROWS ONLY");
    }
}
