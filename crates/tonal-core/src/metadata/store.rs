//! Read-only execution against the metadata row store (C7's execution
//! stage), grounded on `original_source/audio/metadata/metadata_sqlite.py`.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::ident::normalize_track_id;

use super::ast::{ColumnList, Condition, CompareOp, Select, Value};
use super::parser::parse_query;
use super::translator::translate;

pub type Row = HashMap<String, JsonValue>;

pub struct MetadataStore {
    conn: Connection,
}

impl MetadataStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Parse, validate, translate and execute a user query string (either
    /// the short condition-only form or a full `SELECT`).
    pub fn run_query(&self, input: &str) -> Result<Vec<Row>> {
        let select = parse_query(input)?;
        self.run_select(&select)
    }

    pub fn run_select(&self, select: &Select) -> Result<Vec<Row>> {
        let translated = translate(select)?;
        let mut stmt = self.conn.prepare(&translated.sql)?;
        let params = rusqlite::params_from_iter(translated.params.iter());

        let rows = stmt.query_map(params, |row| {
            let mut map = Row::new();
            for (i, column) in translated.columns.iter().enumerate() {
                let value: rusqlite::types::Value = row.get(i)?;
                map.insert(column.clone(), sql_value_to_json(value));
            }
            Ok(map)
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Fetch a single row by `track_id`, canonicalizing the id first. Built
    /// as an AST directly (not a formatted-then-reparsed string) so an id
    /// containing a quote character can never escape into the surrounding
    /// SQL.
    pub fn find_by_track_id(&self, track_id: &str) -> Result<Option<Row>> {
        let canonical = normalize_track_id(track_id);
        let select = Select {
            columns: ColumnList::Star,
            table: "metadata".to_string(),
            condition: Some(Condition::Compare {
                column: "track_id".to_string(),
                op: CompareOp::Eq,
                value: Value::Text(canonical),
            }),
        };
        let rows = self.run_select(&select)?;
        Ok(rows.into_iter().next())
    }
}

fn sql_value_to_json(value: rusqlite::types::Value) -> JsonValue {
    use rusqlite::types::Value as V;
    match value {
        V::Null => JsonValue::Null,
        V::Integer(i) => JsonValue::from(i),
        V::Real(f) => serde_json::Number::from_f64(f).map(JsonValue::Number).unwrap_or(JsonValue::Null),
        V::Text(s) => JsonValue::String(s),
        V::Blob(b) => JsonValue::String(format!("<{} bytes>", b.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (tempfile::TempDir, MetadataStore) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("metadata.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                "CREATE TABLE metadata (track_id TEXT, title TEXT, artist TEXT, genre TEXT, year INTEGER)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO metadata VALUES ('034996', 'Song A', 'Psychadelik Pedestrian', 'Electronic', 2012)",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO metadata VALUES ('000123', 'Song B', 'Someone Else', 'Rock', 1999)",
                [],
            )
            .unwrap();
        }
        let store = MetadataStore::open(&db_path).unwrap();
        (dir, store)
    }

    #[test]
    fn short_form_query_returns_matching_row() {
        let (_dir, store) = seeded_store();
        let rows = store.run_query(r#"artist = "Psychadelik Pedestrian""#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("title").unwrap(), "Song A");
    }

    #[test]
    fn track_id_lookup_normalizes_before_query() {
        let (_dir, store) = seeded_store();
        let row = store.find_by_track_id("34996").unwrap().unwrap();
        assert_eq!(row.get("track_id").unwrap(), "034996");
    }

    #[test]
    fn long_form_with_explicit_columns_limits_output() {
        let (_dir, store) = seeded_store();
        let rows = store.run_query("SELECT title, artist FROM metadata WHERE year < 2000").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0].contains_key("title"));
        assert!(!rows[0].contains_key("year"));
    }

    #[test]
    fn no_matching_rows_returns_empty_list() {
        let (_dir, store) = seeded_store();
        let rows = store.run_query("genre = \"Jazz\"").unwrap();
        assert!(rows.is_empty());
    }
}
