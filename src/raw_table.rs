//! Minimal in-memory representation of a tab-delimited instrument export
//!

use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};
use log::info;
use thousands::Separable;

use crate::errors::{Result, ReviewError};

/// Header plus string cells for every row, in file order
///
/// Every row is padded or truncated to the header width so that cell lookups by column index
/// are always valid.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Read a tab-delimited file with a header line
    ///
    /// # Arguments
    /// * `label` - Describes the file type in log and error messages
    ///
    pub fn from_tsv_file(filename: &Utf8Path, label: &str) -> Result<Self> {
        info!("Reading {label} table from file: '{filename}'");
        let file = std::fs::File::open(filename).map_err(|e| {
            ReviewError::Io(std::io::Error::new(
                e.kind(),
                format!("Unable to open {label} file '{filename}': {e}"),
            ))
        })?;
        let table = Self::from_tsv_reader(file)?;
        info!(
            "Read {} rows from {label} table",
            table.rows.len().separate_with_commas()
        );
        Ok(table)
    }

    pub fn from_tsv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(b'\t')
            .from_reader(reader);

        let columns = rdr
            .headers()?
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            // Skip fully blank lines left behind by spreadsheet exports
            if record.iter().all(|x| x.is_empty()) {
                continue;
            }
            rows.push(record.iter().map(|x| x.to_string()).collect());
        }

        Ok(Self::new(columns, rows))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|x| x == name)
    }

    /// Same as `column_index` but a missing column is reported as a schema error
    pub fn required_column_index(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            ReviewError::schema(
                name,
                format!(
                    "required column is missing, found columns: {}",
                    self.columns.join(", ")
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tsv_reader() {
        let text = "SampleId\tGene Name\tCall\nS1\tKRAS\tMD\nS2\tTP53\n\t\t\n";
        let table = RawTable::from_tsv_reader(text.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["SampleId", "Gene Name", "Call"]);
        assert_eq!(table.rows.len(), 2);

        // Short rows are padded to the header width
        assert_eq!(table.rows[1], vec!["S2", "TP53", ""]);
    }

    #[test]
    fn test_required_column_index() {
        let table = RawTable::new(vec!["A".to_string(), "B".to_string()], Vec::new());
        assert_eq!(table.required_column_index("B").unwrap(), 1);
        assert!(matches!(
            table.required_column_index("C"),
            Err(ReviewError::Schema { field, .. }) if field == "C"
        ));
    }
}
