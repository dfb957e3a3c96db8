use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;

use super::schema::SCHEMA;
use super::{Collection, Document, DocumentStore, Filter, ID_FIELD, apply_set, assign_id};
use crate::error::{Error, Result};

/// Document store on SQLite: one table per collection holding JSON bodies.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key.replace('"', "\\\""))
}

/// Translates an equality filter into a WHERE clause over `body`.
/// Each predicate checks the JSON type as well as the value so that `true`
/// never matches `1`.
fn where_clause(filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
    if filter.is_empty() {
        return Ok(("1 = 1".to_string(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(filter.len());
    let mut args = Vec::new();

    for (key, expected) in filter {
        if key == ID_FIELD {
            match expected.as_str() {
                Some(id) => {
                    clauses.push("id = ?".to_string());
                    args.push(SqlValue::Text(id.to_string()));
                }
                None => clauses.push("0 = 1".to_string()),
            }
            continue;
        }

        let path = SqlValue::Text(json_path(key));
        match expected {
            Value::Null => {
                clauses.push(
                    "(json_type(body, ?) IS NULL OR json_type(body, ?) = 'null')".to_string(),
                );
                args.push(path.clone());
                args.push(path);
            }
            Value::Bool(b) => {
                clauses.push("json_type(body, ?) = ?".to_string());
                args.push(path);
                args.push(SqlValue::Text(if *b { "true" } else { "false" }.to_string()));
            }
            Value::Number(n) => {
                let (ty, value) = match n.as_i64() {
                    Some(i) => ("integer", SqlValue::Integer(i)),
                    None => ("real", SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))),
                };
                clauses.push(format!(
                    "(json_type(body, ?) = '{ty}' AND json_extract(body, ?) = ?)"
                ));
                args.push(path.clone());
                args.push(path);
                args.push(value);
            }
            Value::String(s) => {
                clauses.push(
                    "(json_type(body, ?) = 'text' AND json_extract(body, ?) = ?)".to_string(),
                );
                args.push(path.clone());
                args.push(path);
                args.push(SqlValue::Text(s.clone()));
            }
            Value::Array(_) | Value::Object(_) => {
                let ty = if expected.is_array() { "array" } else { "object" };
                clauses.push(format!(
                    "(json_type(body, ?) = '{ty}' AND json_extract(body, ?) = ?)"
                ));
                args.push(path.clone());
                args.push(path);
                args.push(SqlValue::Text(serde_json::to_string(expected)?));
            }
        }
    }

    Ok((clauses.join(" AND "), args))
}

fn parse_body(body: &str) -> Result<Document> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Invalid document body in database: {e}");
        Error::Malformed(e.to_string())
    })
}

impl DocumentStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<String> {
        let id = assign_id(&mut doc);
        let body = serde_json::to_string(&doc)?;

        let result = self.conn().execute(
            &format!("INSERT INTO \"{collection}\" (id, body) VALUES (?1, ?2)"),
            params![id, body],
        );

        match result {
            Ok(_) => Ok(id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists(format!("{collection} document {id} already exists")))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let (clause, args) = where_clause(filter)?;
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                &format!("SELECT body FROM \"{collection}\" WHERE {clause} ORDER BY rowid LIMIT 1"),
                params_from_iter(args),
                |row| row.get(0),
            )
            .optional()?;

        body.as_deref().map(parse_body).transpose()
    }

    fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let (clause, args) = where_clause(filter)?;
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT body FROM \"{collection}\" WHERE {clause} ORDER BY rowid"
        ))?;

        let bodies = stmt
            .query_map(params_from_iter(args), |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies.iter().map(|b| parse_body(b)).collect()
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let (clause, args) = where_clause(filter)?;
        let count: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM \"{collection}\" WHERE {clause}"),
            params_from_iter(args),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn update_many(&self, collection: Collection, filter: &Filter, set: &Document) -> Result<u64> {
        let (clause, args) = where_clause(filter)?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = {
            let mut stmt = tx.prepare(&format!(
                "SELECT id, body FROM \"{collection}\" WHERE {clause} ORDER BY rowid"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(args), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        for (id, body) in &rows {
            let mut doc = parse_body(body)?;
            apply_set(&mut doc, set);
            tx.execute(
                &format!("UPDATE \"{collection}\" SET body = ?1 WHERE id = ?2"),
                params![serde_json::to_string(&doc)?, id],
            )?;
        }

        tx.commit()?;
        Ok(rows.len() as u64)
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let (clause, args) = where_clause(filter)?;
        let rows = self.conn().execute(
            &format!(
                "DELETE FROM \"{collection}\" WHERE id = \
                 (SELECT id FROM \"{collection}\" WHERE {clause} ORDER BY rowid LIMIT 1)"
            ),
            params_from_iter(args),
        )?;
        Ok(rows as u64)
    }

    fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let (clause, args) = where_clause(filter)?;
        let rows = self.conn().execute(
            &format!("DELETE FROM \"{collection}\" WHERE {clause}"),
            params_from_iter(args),
        )?;
        Ok(rows as u64)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
