//! Conversion of SQLite result rows into JSON-ready maps.

use std::collections::BTreeMap;

use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};

use crate::query::error::{QueryError, QueryResult};

/// One result row keyed by column name.
pub type RowMap = BTreeMap<String, ColumnValue>;

/// Raw column bytes rendered verbatim as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(pub Vec<u8>);

impl Serialize for RawText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(RawText),
}

impl From<ValueRef<'_>> for ColumnValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ColumnValue::Null,
            ValueRef::Integer(i) => ColumnValue::Integer(i),
            ValueRef::Real(r) => ColumnValue::Real(r),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                ColumnValue::Text(RawText(bytes.to_vec()))
            }
        }
    }
}

/// Drain a cursor into row maps.
///
/// Stepping failures are execution errors; reading a fetched column is not.
pub fn collect_rows(mut rows: rusqlite::Rows<'_>, columns: &[String]) -> QueryResult<Vec<RowMap>> {
    let mut result = Vec::new();
    while let Some(row) = rows.next().map_err(QueryError::execution)? {
        result.push(row_map(row, columns)?);
    }
    Ok(result)
}

fn row_map(row: &rusqlite::Row<'_>, columns: &[String]) -> QueryResult<RowMap> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let value = row.get_ref(idx).map_err(QueryError::unknown)?;
            Ok((name.clone(), ColumnValue::from(value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn rows_of(conn: &Connection, sql: &str) -> Vec<RowMap> {
        let mut stmt = conn.prepare(sql).unwrap();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query([]).unwrap();
        collect_rows(rows, &columns).unwrap()
    }

    #[test]
    fn test_text_and_blob_render_as_strings() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = rows_of(&conn, "SELECT 'x' AS body, X'3132' AS raw");
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json, serde_json::json!([{"body": "x", "raw": "12"}]));
    }

    #[test]
    fn test_native_values_pass_through() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = rows_of(&conn, "SELECT 3 AS id, 2.5 AS ratio, NULL AS gone");
        assert_eq!(rows[0]["id"], ColumnValue::Integer(3));
        assert_eq!(rows[0]["ratio"], ColumnValue::Real(2.5));
        assert_eq!(rows[0]["gone"], ColumnValue::Null);

        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(json, r#"[{"gone":null,"id":3,"ratio":2.5}]"#);
    }

    #[test]
    fn test_numeric_looking_text_stays_text() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = rows_of(&conn, "SELECT '007' AS code");
        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(json, r#"[{"code":"007"}]"#);
    }

    #[test]
    fn test_row_order_is_preserved() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = rows_of(
            &conn,
            "SELECT 1 AS n UNION ALL SELECT 2 UNION ALL SELECT 3",
        );
        let ns: Vec<_> = rows.iter().map(|r| r["n"].clone()).collect();
        assert_eq!(
            ns,
            vec![
                ColumnValue::Integer(1),
                ColumnValue::Integer(2),
                ColumnValue::Integer(3)
            ]
        );
    }

    #[test]
    fn test_empty_cursor() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = rows_of(&conn, "SELECT 1 WHERE 0");
        assert!(rows.is_empty());
    }
}
