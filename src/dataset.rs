// src/dataset.rs
//! Spreadsheet decoding and the in-memory table model.
//!
//! Uploaded bytes are dispatched on the filename extension: `.csv` goes
//! through the csv crate, `.xls`/`.xlsx` through calamine. Anything else
//! falls back to the built-in Gapminder sample so the dashboard always has
//! a table to chart against.

use calamine::{Data, Reader, Xls, Xlsx};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Name under which the built-in sample dataset is registered.
pub const SAMPLE_TABLE_NAME: &str = "gapminder";

/// How many rows the upload summary shows.
pub const PREVIEW_ROW_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("csv decode error: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook decode error: {0}")]
    Workbook(String),
    #[error("workbook contains no sheets")]
    EmptyWorkbook,
    #[error("file has no header row")]
    MissingHeader,
}

/// A single cell. Numbers are kept as f64 so they chart directly; everything
/// else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => Cell::Number(n),
        Err(_) => Cell::Text(trimmed.to_string()),
    }
}

/// Named, ordered, in-memory tabular dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn is_sample(&self) -> bool {
        self.name == SAMPLE_TABLE_NAME
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Human-viewable upload summary: filename, timestamp, columns and a short
/// row preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_name: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub preview: Vec<Vec<String>>,
}

pub fn table_summary(table: &Table, filename: &str, uploaded_at: DateTime<Utc>) -> TableSummary {
    TableSummary {
        table_name: table.name.clone(),
        filename: filename.to_string(),
        uploaded_at,
        columns: table.columns.clone(),
        row_count: table.rows.len(),
        preview: table
            .rows
            .iter()
            .take(PREVIEW_ROW_LIMIT)
            .map(|row| row.iter().map(Cell::display).collect())
            .collect(),
    }
}

/// Decode uploaded bytes into a table, dispatching on the filename
/// extension. Unknown extensions fall back to the sample dataset; decode
/// failures for recognized extensions surface as `DatasetError` and are
/// turned into an in-UI notice by the upload handler.
pub fn decode_table(bytes: &[u8], filename: &str) -> Result<Table, DatasetError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => decode_csv(bytes, filename),
        "xls" | "xlsx" => decode_workbook(bytes, filename, &extension),
        _ => {
            tracing::info!("unrecognized extension on '{}', using sample dataset", filename);
            Ok(sample_table())
        }
    }
}

fn table_name_from(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .to_string()
}

fn decode_csv(bytes: &[u8], filename: &str) -> Result<Table, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.is_empty() {
        return Err(DatasetError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Table {
        name: table_name_from(filename),
        columns,
        rows,
    })
}

fn decode_workbook(bytes: &[u8], filename: &str, extension: &str) -> Result<Table, DatasetError> {
    let cursor = Cursor::new(bytes.to_vec());

    // First worksheet only; the dashboard works on a single table.
    let range = if extension == "xls" {
        let mut workbook =
            Xls::new(cursor).map_err(|e| DatasetError::Workbook(e.to_string()))?;
        workbook
            .worksheet_range_at(0)
            .ok_or(DatasetError::EmptyWorkbook)?
            .map_err(|e| DatasetError::Workbook(e.to_string()))?
    } else {
        let mut workbook =
            Xlsx::new(cursor).map_err(|e| DatasetError::Workbook(e.to_string()))?;
        workbook
            .worksheet_range_at(0)
            .ok_or(DatasetError::EmptyWorkbook)?
            .map_err(|e| DatasetError::Workbook(e.to_string()))?
    };

    let mut rows_iter = range.rows();
    let header = rows_iter.next().ok_or(DatasetError::MissingHeader)?;
    let columns: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    if columns.is_empty() {
        return Err(DatasetError::MissingHeader);
    }

    let rows = rows_iter
        .map(|row| {
            row.iter()
                .map(|data| match data {
                    Data::Empty => Cell::Empty,
                    Data::Float(f) => Cell::Number(*f),
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::String(s) => parse_cell(s),
                    other => Cell::Text(other.to_string()),
                })
                .collect()
        })
        .collect();

    Ok(Table {
        name: table_name_from(filename),
        columns,
        rows,
    })
}

// Gapminder excerpt: four countries across the 1952-2007 surveys. Columns
// match the full dataset so the curated prompt example stays valid.
const GAPMINDER_ROWS: &[(&str, &str, u32, f64, u64, f64, &str, u32)] = &[
    ("Australia", "Oceania", 1952, 69.12, 8691212, 10039.60, "AUS", 36),
    ("Australia", "Oceania", 1957, 70.33, 9712569, 10949.65, "AUS", 36),
    ("Australia", "Oceania", 1962, 70.93, 10794968, 12217.23, "AUS", 36),
    ("Australia", "Oceania", 1967, 71.10, 11872264, 14526.12, "AUS", 36),
    ("Australia", "Oceania", 1972, 71.93, 13177000, 16788.63, "AUS", 36),
    ("Australia", "Oceania", 1977, 73.49, 14074100, 18334.20, "AUS", 36),
    ("Australia", "Oceania", 1982, 74.74, 15184200, 19477.01, "AUS", 36),
    ("Australia", "Oceania", 1987, 76.32, 16257249, 21888.89, "AUS", 36),
    ("Australia", "Oceania", 1992, 77.56, 17481977, 23424.77, "AUS", 36),
    ("Australia", "Oceania", 1997, 78.83, 18565243, 26997.94, "AUS", 36),
    ("Australia", "Oceania", 2002, 80.37, 19546792, 30687.75, "AUS", 36),
    ("Australia", "Oceania", 2007, 81.235, 20434176, 34435.37, "AUS", 36),
    ("New Zealand", "Oceania", 1952, 69.39, 1994794, 10556.58, "NZL", 554),
    ("New Zealand", "Oceania", 1957, 70.26, 2229407, 12247.40, "NZL", 554),
    ("New Zealand", "Oceania", 1962, 71.24, 2488550, 13175.68, "NZL", 554),
    ("New Zealand", "Oceania", 1967, 71.52, 2728150, 14463.92, "NZL", 554),
    ("New Zealand", "Oceania", 1972, 71.89, 2929100, 16046.04, "NZL", 554),
    ("New Zealand", "Oceania", 1977, 72.22, 3164900, 16233.72, "NZL", 554),
    ("New Zealand", "Oceania", 1982, 73.84, 3210650, 17632.41, "NZL", 554),
    ("New Zealand", "Oceania", 1987, 74.32, 3317166, 19007.19, "NZL", 554),
    ("New Zealand", "Oceania", 1992, 76.33, 3437674, 18363.32, "NZL", 554),
    ("New Zealand", "Oceania", 1997, 77.55, 3676187, 21050.41, "NZL", 554),
    ("New Zealand", "Oceania", 2002, 79.11, 3908037, 23189.80, "NZL", 554),
    ("New Zealand", "Oceania", 2007, 80.204, 4115771, 25185.01, "NZL", 554),
    ("Japan", "Asia", 1952, 63.03, 86459025, 3216.96, "JPN", 392),
    ("Japan", "Asia", 1957, 65.50, 91563009, 4317.69, "JPN", 392),
    ("Japan", "Asia", 1962, 68.73, 95831757, 6576.65, "JPN", 392),
    ("Japan", "Asia", 1967, 71.43, 100825279, 9847.79, "JPN", 392),
    ("Japan", "Asia", 1972, 73.42, 107188273, 14778.79, "JPN", 392),
    ("Japan", "Asia", 1977, 75.38, 113872473, 16610.38, "JPN", 392),
    ("Japan", "Asia", 1982, 77.11, 118454974, 19384.11, "JPN", 392),
    ("Japan", "Asia", 1987, 78.67, 122091325, 22375.94, "JPN", 392),
    ("Japan", "Asia", 1992, 79.36, 124329269, 26824.90, "JPN", 392),
    ("Japan", "Asia", 1997, 80.69, 125956499, 28816.58, "JPN", 392),
    ("Japan", "Asia", 2002, 82.00, 127065841, 28604.59, "JPN", 392),
    ("Japan", "Asia", 2007, 82.603, 127467972, 31656.07, "JPN", 392),
    ("Canada", "Americas", 1952, 68.75, 14785584, 11367.16, "CAN", 124),
    ("Canada", "Americas", 1957, 69.96, 17010154, 12489.95, "CAN", 124),
    ("Canada", "Americas", 1962, 71.30, 18985849, 13462.49, "CAN", 124),
    ("Canada", "Americas", 1967, 72.13, 20819767, 16076.59, "CAN", 124),
    ("Canada", "Americas", 1972, 72.88, 22284500, 18970.57, "CAN", 124),
    ("Canada", "Americas", 1977, 74.21, 23796400, 22090.88, "CAN", 124),
    ("Canada", "Americas", 1982, 75.76, 25201900, 22898.79, "CAN", 124),
    ("Canada", "Americas", 1987, 76.86, 26549700, 26626.52, "CAN", 124),
    ("Canada", "Americas", 1992, 77.95, 28523502, 26342.88, "CAN", 124),
    ("Canada", "Americas", 1997, 78.61, 30305843, 28954.93, "CAN", 124),
    ("Canada", "Americas", 2002, 79.77, 31902268, 33328.97, "CAN", 124),
    ("Canada", "Americas", 2007, 80.653, 33390141, 36319.24, "CAN", 124),
];

/// The built-in sample dataset used whenever no spreadsheet was uploaded.
pub fn sample_table() -> Table {
    let columns = vec![
        "country".to_string(),
        "continent".to_string(),
        "year".to_string(),
        "lifeExp".to_string(),
        "pop".to_string(),
        "gdpPercap".to_string(),
        "iso_alpha".to_string(),
        "iso_num".to_string(),
    ];
    let rows = GAPMINDER_ROWS
        .iter()
        .map(|(country, continent, year, life_exp, pop, gdp, iso_alpha, iso_num)| {
            vec![
                Cell::Text(country.to_string()),
                Cell::Text(continent.to_string()),
                Cell::Number(*year as f64),
                Cell::Number(*life_exp),
                Cell::Number(*pop as f64),
                Cell::Number(*gdp),
                Cell::Text(iso_alpha.to_string()),
                Cell::Number(*iso_num as f64),
            ]
        })
        .collect();

    Table {
        name: SAMPLE_TABLE_NAME.to_string(),
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_decode_happy_path() {
        let bytes = b"city,population\nWellington,215100\nAuckland,1657000\n";
        let table = decode_table(bytes, "cities.csv").unwrap();
        assert_eq!(table.name, "cities");
        assert_eq!(table.columns, vec!["city", "population"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("Wellington".to_string()));
        assert_eq!(table.rows[0][1], Cell::Number(215100.0));
    }

    #[test]
    fn test_csv_decode_malformed_returns_error_not_panic() {
        // Ragged record: wrong number of fields mid-file.
        let bytes = b"a,b\n1\n2,3,4\n";
        assert!(decode_table(bytes, "bad.csv").is_err());

        // Invalid UTF-8 in a record.
        let bytes: &[u8] = &[0x61, 0x2c, 0x62, 0x0a, 0xff, 0xfe, 0x2c, 0x31, 0x0a];
        assert!(decode_table(bytes, "bad.csv").is_err());
    }

    #[test]
    fn test_workbook_decode_malformed_returns_error_not_panic() {
        assert!(decode_table(b"this is not a zip archive", "data.xlsx").is_err());
        assert!(decode_table(b"\x00\x01\x02\x03", "data.xls").is_err());
    }

    #[test]
    fn test_unknown_extension_falls_back_to_sample() {
        let table = decode_table(b"whatever", "notes.txt").unwrap();
        assert!(table.is_sample());
        assert_eq!(table.name, SAMPLE_TABLE_NAME);
    }

    #[test]
    fn test_sample_table_shape() {
        let table = sample_table();
        assert_eq!(
            table.columns,
            vec!["country", "continent", "year", "lifeExp", "pop", "gdpPercap", "iso_alpha", "iso_num"]
        );
        assert_eq!(table.rows.len(), 48);
        // Every row is as wide as the header.
        assert!(table.rows.iter().all(|row| row.len() == table.columns.len()));
    }

    #[test]
    fn test_summary_preview_is_capped() {
        let table = sample_table();
        let summary = table_summary(&table, "gapminder", Utc::now());
        assert_eq!(summary.preview.len(), PREVIEW_ROW_LIMIT);
        assert_eq!(summary.row_count, 48);
        assert_eq!(summary.preview[0][0], "Australia");
        assert_eq!(summary.preview[0][2], "1952");
    }

    #[test]
    fn test_empty_and_numeric_cells() {
        let bytes = b"a,b\n,1.5\nx,\n";
        let table = decode_table(bytes, "t.csv").unwrap();
        assert_eq!(table.rows[0][0], Cell::Empty);
        assert_eq!(table.rows[0][1], Cell::Number(1.5));
        assert_eq!(table.rows[1][1], Cell::Empty);
        assert_eq!(table.rows[0][1].display(), "1.5");
        assert_eq!(Cell::Number(1952.0).display(), "1952");
    }
}
