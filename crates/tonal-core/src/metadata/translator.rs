//! Validation + translation of the AST into a parameterized SQL string
//! (spec.md §4.7). Values are always bound as positional `?` placeholders,
//! never interpolated into the SQL text.

use rusqlite::types::Value as SqlValue;

use crate::error::{IndexError, Result};
use crate::ident::normalize_track_id;

use super::ast::{ColumnList, Condition, CompareOp, LogicalOp, Select, Value};

const ALLOWED_TABLE: &str = "metadata";
const ALLOWED_COLUMNS: [&str; 5] = ["track_id", "title", "artist", "genre", "year"];

pub struct TranslatedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub columns: Vec<String>,
}

pub fn translate(select: &Select) -> Result<TranslatedQuery> {
    if select.table != ALLOWED_TABLE {
        return Err(IndexError::invalid_query(format!("table {:?} is not permitted", select.table)));
    }

    // `columns` drives row-dictionary extraction after execution, so it is
    // always the concrete column list even for `SELECT *` (whose row order
    // follows the table's declared column order). The SQL text itself,
    // though, must literally say `*` for the star case -- spelling out the
    // column names there would no longer be a star query.
    let (column_list_sql, columns) = match &select.columns {
        ColumnList::Star => {
            ("*".to_string(), ALLOWED_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        }
        ColumnList::Named(names) => {
            for name in names {
                check_column(name)?;
            }
            (names.join(", "), names.clone())
        }
    };

    let mut params = Vec::new();
    let where_clause = match &select.condition {
        Some(cond) => {
            let mut sql = String::new();
            translate_condition(cond, &mut sql, &mut params)?;
            format!(" WHERE {sql}")
        }
        None => String::new(),
    };

    let sql = format!("SELECT {column_list_sql} FROM metadata{where_clause}");
    Ok(TranslatedQuery { sql, params, columns })
}

fn check_column(name: &str) -> Result<()> {
    if ALLOWED_COLUMNS.contains(&name) {
        Ok(())
    } else {
        Err(IndexError::invalid_query(format!("column {name:?} is not permitted")))
    }
}

fn translate_condition(cond: &Condition, sql: &mut String, params: &mut Vec<SqlValue>) -> Result<()> {
    match cond {
        Condition::Compare { column, op, value } => {
            check_column(column)?;
            sql.push_str(column);
            sql.push_str(compare_op_str(*op));
            sql.push('?');
            params.push(bind_value(column, value));
            Ok(())
        }
        Condition::Between { column, low, high } => {
            check_column(column)?;
            sql.push_str(column);
            sql.push_str(" BETWEEN ? AND ?");
            params.push(bind_value(column, low));
            params.push(bind_value(column, high));
            Ok(())
        }
        Condition::Logical { op, left, right } => {
            sql.push('(');
            translate_condition(left, sql, params)?;
            sql.push_str(match op {
                LogicalOp::And => " AND ",
                LogicalOp::Or => " OR ",
            });
            translate_condition(right, sql, params)?;
            sql.push(')');
            Ok(())
        }
    }
}

fn compare_op_str(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => " = ",
        CompareOp::Ne => " != ",
        CompareOp::Lt => " < ",
        CompareOp::Le => " <= ",
        CompareOp::Gt => " > ",
        CompareOp::Ge => " >= ",
    }
}

fn bind_value(column: &str, value: &Value) -> SqlValue {
    match value {
        Value::Number(n) => SqlValue::Real(*n),
        Value::Text(s) => {
            let text = if column == "track_id" { normalize_track_id(s) } else { s.clone() };
            SqlValue::Text(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parser::parse_query;

    #[test]
    fn short_form_logical_translates_to_parameterized_sql() {
        let select = parse_query(r#"genre = "Rock" AND year >= 2000"#).unwrap();
        let translated = translate(&select).unwrap();
        assert_eq!(translated.sql, "SELECT * FROM metadata WHERE (genre = ? AND year >= ?)");
        assert_eq!(translated.params, vec![SqlValue::Text("Rock".into()), SqlValue::Real(2000.0)]);
    }

    #[test]
    fn long_form_star_also_emits_literal_star() {
        let select = parse_query("SELECT * FROM metadata WHERE year = 2000").unwrap();
        let translated = translate(&select).unwrap();
        assert_eq!(translated.sql, "SELECT * FROM metadata WHERE year = ?");
        assert_eq!(translated.columns, ALLOWED_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn track_id_values_are_canonicalized_before_binding() {
        let select = parse_query(r#"track_id = "34996""#).unwrap();
        let translated = translate(&select).unwrap();
        assert_eq!(translated.params, vec![SqlValue::Text("034996".into())]);
    }

    #[test]
    fn disallowed_table_is_rejected() {
        let select = parse_query("SELECT * FROM tracks WHERE year = 2000").unwrap();
        let err = translate(&select).unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery { .. }));
    }

    #[test]
    fn disallowed_column_is_rejected() {
        let select = parse_query("bitrate = 320").unwrap();
        let err = translate(&select).unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery { .. }));
    }

    #[test]
    fn between_binds_both_bounds() {
        let select = parse_query("year BETWEEN 2010 AND 2015").unwrap();
        let translated = translate(&select).unwrap();
        assert_eq!(translated.sql, "SELECT * FROM metadata WHERE year BETWEEN ? AND ?");
        assert_eq!(translated.params, vec![SqlValue::Real(2010.0), SqlValue::Real(2015.0)]);
    }
}
