use crate::error::{PipelineError, Result};
use std::path::Path;

/// In-memory tabular row set: ordered column names plus rows of optional
/// string cells. A `None` cell is a missing value and round-trips through
/// CSV as an empty field.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl DataFrame {
    /// Build a frame from parts, checking that every row matches the header
    /// width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PipelineError::Config(format!(
                    "row {i} has {} cells but the frame declares {} columns",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Extract a column as numeric values. Missing cells are skipped; an
    /// absent column or an unparseable cell is an error, surfaced as a
    /// statistical failure because the only numeric consumer is the drift
    /// comparison.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| PipelineError::Statistical {
                column: name.to_string(),
                message: "column not present in frame".to_string(),
            })?;

        let mut values = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if let Some(cell) = &row[index] {
                let parsed = cell
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| PipelineError::Statistical {
                        column: name.to_string(),
                        message: format!("non-numeric value '{cell}'"),
                    })?;
                values.push(parsed);
            }
        }
        Ok(values)
    }

    /// Select a subset of rows by index, preserving the column set.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Write the frame as a delimited file with a header row. Overwrites any
    /// existing file at `path`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a delimited file with a header row back into a frame. Empty
    /// fields become missing cells.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }
        Self::from_parts(columns, rows)
    }
}
