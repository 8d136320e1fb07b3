use crate::{
    BindMarkersFactory, ColumnRef, Condition, Direction, Fragment, Projection, Select,
    SqlExpression, TableRef, Value, parenthesized_if, separated_by, writer::Context,
};
use std::fmt::Write;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Dialect printer converting assembled queries into concrete SQL strings.
///
/// Default methods render the ANSI-ish flavor shared by most dialects;
/// concrete writers override only what their vendor does differently (marker
/// syntax, limit clause, identifier quoting).
pub trait SqlWriter {
    /// The placeholder syntax of this dialect. The factory is stateless; a
    /// fresh marker sequence is created per rendering pass.
    fn bind_markers_factory(&self) -> BindMarkersFactory {
        BindMarkersFactory::anonymous()
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    /// Render an identifier, quoting only when it would not survive bare
    /// (mixed case, leading digit, punctuation).
    fn write_identifier(&self, context: &mut Context, out: &mut String, value: &str) {
        let plain = value.chars().next().is_some_and(|c| !c.is_ascii_digit())
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if plain {
            out.push_str(value);
        } else {
            self.write_identifier_quoted(context, out, value);
        }
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference with optional schema qualification.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier(context, out, &value.name);
    }

    /// Render a column reference, table qualified except inside ORDER BY.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        if context.qualify_columns
            && context.fragment != Fragment::SqlSelectOrderBy
            && !value.table.is_empty()
        {
            self.write_identifier(context, out, &value.table);
            out.push('.');
        }
        self.write_identifier(context, out, &value.name);
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(context, out),
            Value::Boolean(Some(v)) => self.write_value_bool(context, out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(context, out, v),
            Value::Date(Some(v)) => self.write_value_date(context, out, v, false),
            Value::Time(Some(v)) => self.write_value_time(context, out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(context, out, v),
            Value::TimestampWithTimezone(Some(v)) => {
                self.write_value_timestamptz(context, out, v)
            }
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            Value::List(Some(v), ..) => {
                separated_by(out, v, |out, v| self.write_value(context, out, v), ", ");
            }
            _ => {
                log::error!("Cannot write {:?}", value);
            }
        };
    }

    /// Render NULL literal.
    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    /// Render boolean literal.
    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["FALSE", "TRUE"][value as usize]);
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a DATE literal (optionally as part of TIMESTAMP composition).
    fn write_value_date(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Date,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    /// Render a TIME literal (optionally as part of TIMESTAMP composition).
    fn write_value_time(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Time,
        timestamp: bool,
    ) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:02}:{:02}:{:02}.{:0width$}{b}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    /// Render a TIMESTAMP literal.
    fn write_value_timestamp(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PrimitiveDateTime,
    ) {
        out.push('\'');
        self.write_value_date(context, out, &value.date(), true);
        out.push('T');
        self.write_value_time(context, out, &value.time(), true);
        out.push('\'');
    }

    /// Render a TIMESTAMPTZ literal.
    fn write_value_timestamptz(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &OffsetDateTime,
    ) {
        let date_time = value.to_utc();
        self.write_value_timestamp(
            context,
            out,
            &PrimitiveDateTime::new(date_time.date(), date_time.time()),
        );
    }

    /// Render a scalar expression. Markers are allocated here, in
    /// left-to-right render order.
    fn write_expression(&self, context: &mut Context, out: &mut String, value: &SqlExpression) {
        match value {
            SqlExpression::Column(column) => self.write_column_ref(context, out, column),
            SqlExpression::Marker { hint } => {
                let marker = context.markers.next(hint);
                out.push_str(marker.placeholder());
            }
            SqlExpression::Literal(value) => self.write_value(context, out, value),
            SqlExpression::Upper(inner) => {
                out.push_str("UPPER(");
                self.write_expression(context, out, inner);
                out.push(')');
            }
        }
    }

    /// Render a condition tree, parenthesizing children that bind looser
    /// than their parent.
    fn write_condition(&self, context: &mut Context, out: &mut String, value: &Condition) {
        match value {
            Condition::Comparison {
                lhs,
                comparator,
                rhs,
            } => {
                self.write_expression(context, out, lhs);
                out.push(' ');
                out.push_str(comparator.as_sql());
                out.push(' ');
                self.write_expression(context, out, rhs);
            }
            Condition::Between { lhs, lower, upper } => {
                self.write_expression(context, out, lhs);
                out.push_str(" >= ");
                self.write_expression(context, out, lower);
                out.push_str(" AND ");
                self.write_expression(context, out, lhs);
                out.push_str(" <= ");
                self.write_expression(context, out, upper);
            }
            Condition::IsNull { lhs, negated } => {
                self.write_expression(context, out, lhs);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Condition::Like { lhs, rhs, negated } => {
                self.write_expression(context, out, lhs);
                out.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.write_expression(context, out, rhs);
            }
            Condition::In { lhs, rhs, negated } => {
                self.write_expression(context, out, lhs);
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.write_expression(context, out, rhs);
                out.push(')');
            }
            Condition::Test { lhs, value } => {
                self.write_expression(context, out, lhs);
                out.push_str(" = ");
                self.write_value_bool(context, out, *value);
            }
            Condition::Not(inner) => {
                out.push_str("NOT (");
                self.write_condition(context, out, inner);
                out.push(')');
            }
            Condition::And(lhs, rhs) => {
                self.write_condition_infix(context, out, lhs, " AND ", rhs, value.precedence());
            }
            Condition::Or(lhs, rhs) => {
                self.write_condition_infix(context, out, lhs, " OR ", rhs, value.precedence());
            }
        }
    }

    fn write_condition_infix(
        &self,
        context: &mut Context,
        out: &mut String,
        lhs: &Condition,
        separator: &str,
        rhs: &Condition,
        precedence: u8,
    ) {
        parenthesized_if(out, lhs.precedence() < precedence, |out| {
            self.write_condition(context, out, lhs)
        });
        out.push_str(separator);
        parenthesized_if(out, rhs.precedence() < precedence, |out| {
            self.write_condition(context, out, rhs)
        });
    }

    /// Render the limit clause, leading space included. `ordered` tells
    /// whether the statement already carries an ORDER BY clause, for dialects
    /// whose row limiting is only valid after one.
    fn write_limit(&self, _context: &mut Context, out: &mut String, limit: u32, _ordered: bool) {
        out.push_str(" LIMIT ");
        write_integer!(out, limit);
    }

    /// Render a full SELECT statement.
    fn write_select(&self, out: &mut String, select: &Select) {
        out.reserve(128);
        let mut context = Context::new(
            Fragment::SqlSelect,
            true,
            self.bind_markers_factory().create(),
        );
        out.push_str("SELECT ");
        match &select.projection {
            Projection::Count(column) => {
                out.push_str("COUNT(");
                self.write_column_ref(&mut context, out, column);
                out.push(')');
            }
            Projection::Columns(columns) => {
                if select.distinct {
                    out.push_str("DISTINCT ");
                }
                separated_by(
                    out,
                    columns,
                    |out, column| self.write_column_ref(&mut context, out, column),
                    ", ",
                );
            }
        }
        out.push_str(" FROM ");
        {
            let mut from = context.switch_fragment(Fragment::SqlSelectFrom);
            self.write_table_ref(&mut from.current, out, &select.table);
        }
        if let Some(condition) = &select.condition {
            out.push_str(" WHERE ");
            let mut where_clause = context.switch_fragment(Fragment::SqlSelectWhere);
            self.write_condition(&mut where_clause.current, out, condition);
        }
        if !select.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            let mut order_by = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                out,
                &select.order_by,
                |out, (column, direction)| {
                    self.write_column_ref(&mut order_by.current, out, column);
                    out.push_str(match direction {
                        Direction::Asc => " ASC",
                        Direction::Desc => " DESC",
                    });
                },
                ", ",
            );
        }
        if let Some(limit) = select.limit {
            self.write_limit(&mut context, out, limit, !select.order_by.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Comparator, GenericSqlWriter, PostgresSqlWriter, SqlServerSqlWriter};
    use time::macros::date;

    fn context(writer: &dyn SqlWriter) -> Context {
        Context::new(
            Fragment::SqlSelectWhere,
            true,
            writer.bind_markers_factory().create(),
        )
    }

    fn name_condition() -> Condition {
        Condition::Comparison {
            lhs: SqlExpression::Column(ColumnRef::new("first_name", "users")),
            comparator: Comparator::Eq,
            rhs: SqlExpression::Marker {
                hint: "firstName".into(),
            },
        }
    }

    #[test]
    fn marker_styles_per_dialect() {
        let writer = GenericSqlWriter {};
        let mut out = String::new();
        writer.write_condition(&mut context(&writer), &mut out, &name_condition());
        assert_eq!(out, "users.first_name = ?");

        let writer = PostgresSqlWriter {};
        let mut out = String::new();
        writer.write_condition(&mut context(&writer), &mut out, &name_condition());
        assert_eq!(out, "users.first_name = $1");

        let writer = SqlServerSqlWriter {};
        let mut out = String::new();
        writer.write_condition(&mut context(&writer), &mut out, &name_condition());
        assert_eq!(out, "users.first_name = @P0_firstName");
    }

    #[test]
    fn or_inside_and_is_parenthesized() {
        let writer = GenericSqlWriter {};
        let active = Condition::Test {
            lhs: SqlExpression::Column(ColumnRef::new("active", "users")),
            value: true,
        };
        let condition = name_condition()
            .or(name_condition())
            .and(active.clone())
            .or(active);
        let mut out = String::new();
        writer.write_condition(&mut context(&writer), &mut out, &condition);
        assert_eq!(
            out,
            "(users.first_name = ? OR users.first_name = ?) AND users.active = TRUE \
             OR users.active = TRUE"
        );
    }

    #[test]
    fn mixed_case_identifiers_are_quoted() {
        let writer = GenericSqlWriter {};
        let mut out = String::new();
        writer.write_column_ref(
            &mut context(&writer),
            &mut out,
            &ColumnRef::new("firstName", "Users"),
        );
        assert_eq!(out, "\"Users\".\"firstName\"");
    }

    #[test]
    fn literal_values() {
        let writer = GenericSqlWriter {};
        let mut out = String::new();
        writer.write_value(
            &mut context(&writer),
            &mut out,
            &Value::Varchar(Some("O'Hara".into())),
        );
        assert_eq!(out, "'O''Hara'");

        let mut out = String::new();
        writer.write_value(
            &mut context(&writer),
            &mut out,
            &Value::Date(Some(date!(2024 - 02 - 29))),
        );
        assert_eq!(out, "'2024-02-29'");

        let mut out = String::new();
        writer.write_value(
            &mut context(&writer),
            &mut out,
            &Value::List(
                Some(vec![Value::Int32(Some(1)), Value::Int32(Some(2))]),
                Value::Int32(None).into(),
            ),
        );
        assert_eq!(out, "1, 2");
    }

    #[test]
    fn marker_numbering_restarts_per_render() {
        let writer = PostgresSqlWriter {};
        let condition = name_condition().and(name_condition());
        let mut first = String::new();
        writer.write_condition(&mut context(&writer), &mut first, &condition);
        let mut second = String::new();
        writer.write_condition(&mut context(&writer), &mut second, &condition);
        assert_eq!(first, "users.first_name = $1 AND users.first_name = $2");
        assert_eq!(first, second);
    }
}
