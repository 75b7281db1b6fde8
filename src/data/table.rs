//! Raw delimited table as loaded from disk.

use crate::error::{MetaPowerError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A rectangular table of string cells, in file order.
///
/// The first row is the header and the first column holds row identifiers.
/// The top-left "corner" cell is kept so that `transpose` is lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from a header and rows, checking that it is rectangular.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if header.len() < 2 {
            return Err(MetaPowerError::Parse(
                "table must have an identifier column and at least one data column".to_string(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(MetaPowerError::Parse(format!(
                    "row {} has {} fields, header has {}",
                    i + 2,
                    row.len(),
                    header.len()
                )));
            }
        }
        Ok(Self { header, rows })
    }

    /// Load a comma-separated table from a file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path(path, b',')
    }

    /// Load a tab-separated table from a file.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path(path, b'\t')
    }

    /// Load a delimited table from a file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            MetaPowerError::Parse(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let table = Self::from_reader(file, delimiter)?;
        log::debug!(
            "Loaded {} rows x {} columns from {}",
            table.n_rows(),
            table.n_cols(),
            path.display()
        );
        Ok(table)
    }

    /// Parse a delimited table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(String::from).collect(),
            None => return Err(MetaPowerError::Parse("empty input table".to_string())),
        };

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            // Blank trailing lines come through as a single empty field.
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            rows.push(record.iter().map(String::from).collect());
        }

        if rows.is_empty() {
            return Err(MetaPowerError::Parse("table has a header but no rows".to_string()));
        }

        Self::new(header, rows)
    }

    /// Write the table with the given delimiter.
    pub fn to_writer<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        csv_writer.write_record(&self.header)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as CSV.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file, b',')
    }

    /// Swap rows and columns, header included.
    ///
    /// The header becomes the first column and the identifier column becomes
    /// the header, so transposing twice gives back the original table.
    pub fn transpose(&self) -> Self {
        let n_out_rows = self.header.len();
        let n_out_cols = self.rows.len() + 1;

        let mut grid: Vec<Vec<String>> = (0..n_out_rows)
            .map(|_| Vec::with_capacity(n_out_cols))
            .collect();
        for (j, cell) in self.header.iter().enumerate() {
            grid[j].push(cell.clone());
        }
        for row in &self.rows {
            for (j, cell) in row.iter().enumerate() {
                grid[j].push(cell.clone());
            }
        }

        let mut grid = grid.into_iter();
        let header = grid.next().unwrap_or_default();
        Self {
            header,
            rows: grid.collect(),
        }
    }

    /// Header row, including the corner cell.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows; each starts with its identifier.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Column identifiers (header without the corner cell).
    pub fn column_ids(&self) -> &[String] {
        &self.header[1..]
    }

    /// Row identifiers (first cell of every row).
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r[0].as_str()).collect()
    }

    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, identifier column included.
    pub fn n_cols(&self) -> usize {
        self.header.len()
    }

    /// Cell at (row, col) where row 0 is the first data row.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Index of the first data row whose identifier matches `name` (ASCII case-insensitive).
    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r[0].eq_ignore_ascii_case(name))
    }

    /// Index of the first data column whose header matches `name` (ASCII case-insensitive).
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, h)| h.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CSV: &str = "feature,S1,S2,S3\n\
                              Label,KO,WT,KO\n\
                              101.05_1.2,10,20,30\n\
                              202.10_3.4,1.5,,4\n";

    #[test]
    fn test_from_reader() {
        let table = RawTable::from_reader(SAMPLE_CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_cols(), 4);
        assert_eq!(table.column_ids(), &["S1", "S2", "S3"]);
        assert_eq!(table.row_ids(), vec!["Label", "101.05_1.2", "202.10_3.4"]);
        assert_eq!(table.cell(2, 2), Some(""));
    }

    #[test]
    fn test_find_row_and_column() {
        let table = RawTable::from_reader(SAMPLE_CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.find_row("label"), Some(0));
        assert_eq!(table.find_row("missing"), None);
        assert_eq!(table.find_column("s2"), Some(2));
        // The corner cell is not a data column.
        assert_eq!(table.find_column("feature"), None);
    }

    #[test]
    fn test_transpose() {
        let table = RawTable::from_reader(SAMPLE_CSV.as_bytes(), b',').unwrap();
        let t = table.transpose();
        assert_eq!(t.header(), &["feature", "Label", "101.05_1.2", "202.10_3.4"]);
        assert_eq!(t.row_ids(), vec!["S1", "S2", "S3"]);
        assert_eq!(t.cell(1, 1), Some("WT"));
        assert_eq!(t.cell(2, 2), Some("30"));
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let table = RawTable::from_reader(SAMPLE_CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.transpose().transpose(), table);
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let input = "feature,S1,S2\nf1,1,2\nf2,3\n";
        let err = RawTable::from_reader(input.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, MetaPowerError::Parse(_)));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = RawTable::from_reader("".as_bytes(), b',').unwrap_err();
        assert!(matches!(err, MetaPowerError::Parse(_)));

        let err = RawTable::from_reader("feature,S1\n".as_bytes(), b',').unwrap_err();
        assert!(matches!(err, MetaPowerError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = RawTable::from_csv("/nonexistent/intensities.csv").unwrap_err();
        assert!(matches!(err, MetaPowerError::Parse(_)));
    }

    #[test]
    fn test_csv_roundtrip_through_file() {
        let table = RawTable::from_reader(SAMPLE_CSV.as_bytes(), b',').unwrap();
        let file = NamedTempFile::new().unwrap();
        table.to_csv(file.path()).unwrap();
        let loaded = RawTable::from_csv(file.path()).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_tsv_input() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "feature\tA\tB").unwrap();
        writeln!(file, "f1\t1\t2").unwrap();
        file.flush().unwrap();

        let table = RawTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.column_ids(), &["A", "B"]);
        assert_eq!(table.cell(0, 2), Some("2"));
    }
}
