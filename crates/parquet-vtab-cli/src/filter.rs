//! `column OP value` filters turned into scan constraints.
//!
//! The value is typed by the column it is compared against, so the cursor
//! never sees a pair it cannot decide and no post-filtering is needed here.

use parquet_vtab_core::{
    ColumnRef, Constraint, ConstraintOp, ConstraintSet, ConstraintValue, LogicalTable, SqlType,
};
use snafu::prelude::*;

use crate::error::{CliResult, FilterSyntaxSnafu, FilterValueSnafu, UnknownColumnSnafu};

fn split_operator(expr: &str) -> Option<(&str, ConstraintOp, &str)> {
    let at = expr.find(['<', '>', '='])?;
    let (column, rest) = expr.split_at(at);

    let (op, len) = if rest.starts_with("<=") {
        (ConstraintOp::Le, 2)
    } else if rest.starts_with(">=") {
        (ConstraintOp::Ge, 2)
    } else if rest.starts_with("==") {
        (ConstraintOp::Eq, 2)
    } else if rest.starts_with('<') {
        (ConstraintOp::Lt, 1)
    } else if rest.starts_with('>') {
        (ConstraintOp::Gt, 1)
    } else {
        (ConstraintOp::Eq, 1)
    };

    let column = column.trim();
    let value = rest[len..].trim();
    if column.is_empty() || value.is_empty() {
        return None;
    }
    Some((column, op, value))
}

fn unquote(s: &str, quote: char) -> &str {
    s.strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(s)
}

/// Type a literal by the column's SQL type.
fn typed_value(sql_type: SqlType, literal: &str) -> Option<ConstraintValue> {
    match sql_type {
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => literal
            .parse::<i64>()
            .map(ConstraintValue::Integer)
            .or_else(|_| literal.parse::<f64>().map(ConstraintValue::Double))
            .ok(),
        SqlType::Double => literal.parse::<f64>().ok().map(ConstraintValue::Double),
        SqlType::Text => Some(ConstraintValue::Text(
            unquote(literal, '\'').replace("''", "'"),
        )),
        SqlType::Blob => match literal
            .strip_prefix("x'")
            .or_else(|| literal.strip_prefix("X'"))
            .and_then(|s| s.strip_suffix('\''))
        {
            Some(digits) => hex::decode(digits).ok().map(ConstraintValue::Blob),
            None => Some(ConstraintValue::Blob(
                unquote(literal, '\'').as_bytes().to_vec(),
            )),
        },
    }
}

/// Parse one filter expression against `table`'s columns.
pub fn parse_filter(table: &LogicalTable, expr: &str) -> CliResult<Constraint> {
    let (column, op, literal) = split_operator(expr).context(FilterSyntaxSnafu { expr })?;
    let column = unquote(column, '"');

    let index = table
        .column_index(column)
        .context(UnknownColumnSnafu { name: column })?;
    let def = &table.columns()[index];

    let value = typed_value(def.sql_type, literal).context(FilterValueSnafu {
        expr,
        column,
        expected: def.sql_type,
    })?;

    let column_ref = if index == table.row_id_column() {
        ColumnRef::RowId
    } else {
        ColumnRef::Column(index)
    };
    Ok(Constraint::new(column_ref, op, value))
}

/// Parse every `--where` expression into one constraint set.
pub fn parse_filters<S: AsRef<str>>(table: &LogicalTable, exprs: &[S]) -> CliResult<ConstraintSet> {
    exprs
        .iter()
        .map(|e| parse_filter(table, e.as_ref()))
        .collect()
}
