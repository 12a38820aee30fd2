use crate::error::Result;
use crate::frame::DataFrame;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Handle to the relational source store. Constructed explicitly by the
/// entry point and handed to the ingestion stage, which owns it for the
/// duration of a single run; dropping the handle closes the connection.
pub struct SourceStore {
    connection: Connection,
}

impl SourceStore {
    /// Open the store at an explicit database path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(path.as_ref())?;
        info!("Connected to source store at {}", path.as_ref().display());
        Ok(Self { connection })
    }

    /// Fetch every record of `schema.table` and flatten the JSON payload
    /// column into a flat tabular row set.
    ///
    /// Each table row holds one `data` payload; nested objects become dotted
    /// column names. Rows missing a key yield a missing cell, not an error.
    pub fn fetch_table(&self, schema_name: &str, table_name: &str) -> Result<DataFrame> {
        let query = format!("SELECT data FROM {schema_name}.{table_name}");
        let mut statement = self.connection.prepare(&query)?;
        let mut rows = statement.query([])?;

        let mut payloads: Vec<Value> = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            payloads.push(serde_json::from_str(&raw)?);
        }

        let frame = normalize_payloads(&payloads)?;
        info!(
            "Fetched {} records ({} columns) from {}.{}",
            frame.n_rows(),
            frame.n_columns(),
            schema_name,
            table_name
        );
        Ok(frame)
    }
}

/// Flatten a batch of JSON payloads into a frame: union of flattened keys in
/// first-seen order, one row per payload.
fn normalize_payloads(payloads: &[Value]) -> Result<DataFrame> {
    let mut columns: Vec<String> = Vec::new();
    let mut flattened: Vec<Vec<(String, String)>> = Vec::with_capacity(payloads.len());

    for payload in payloads {
        let mut cells = Vec::new();
        flatten_value(None, payload, &mut cells);
        for (key, _) in &cells {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        flattened.push(cells);
    }

    let rows = flattened
        .into_iter()
        .map(|cells| {
            columns
                .iter()
                .map(|column| {
                    cells
                        .iter()
                        .find(|(key, _)| key == column)
                        .map(|(_, value)| value.clone())
                })
                .collect()
        })
        .collect();

    DataFrame::from_parts(columns, rows)
}

/// Depth-first flattening with dotted key qualification. Scalars are
/// stringified, arrays are kept inline as JSON text, nulls become missing.
fn flatten_value(prefix: Option<&str>, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let qualified = match prefix {
                    Some(p) => format!("{p}.{key}"),
                    None => key.clone(),
                };
                flatten_value(Some(&qualified), child, out);
            }
        }
        Value::Null => {}
        Value::String(s) => {
            if let Some(p) = prefix {
                out.push((p.to_string(), s.clone()));
            }
        }
        other => {
            if let Some(p) = prefix {
                out.push((p.to_string(), other.to_string()));
            }
        }
    }
}
