use std::fs;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;

use crate::error::{ConversionError, Result};

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column.trim() == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

// Workbooks by extension, delimited text otherwise.
pub fn read_table(path: &Path, has_header: bool) -> Result<RawTable> {
    if is_workbook(path) {
        return read_workbook(path, has_header);
    }

    let contents = fs::read(path).map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = contents.strip_prefix(UTF8_BOM).unwrap_or(&contents);
    let text = String::from_utf8_lossy(bytes);
    read_table_text(&text, has_header).map_err(|source| ConversionError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

fn read_workbook(path: &Path, has_header: bool) -> Result<RawTable> {
    let workbook_error = |source: calamine::Error| ConversionError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ConversionError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_error)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<String>>());
    let header = if has_header {
        rows.next().unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(RawTable {
        header,
        rows: rows.collect(),
    })
}

pub fn workbook_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn read_table_text(text: &str, has_header: bool) -> csv::Result<RawTable> {
    parse_table(text, has_header, sniff_delimiter(text))
}

pub fn parse_table(text: &str, has_header: bool, delimiter: u8) -> csv::Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let header = if has_header {
        to_vec(reader.headers()?)
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(to_vec(&record?));
    }

    Ok(RawTable { header, rows })
}

pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.contains('\t') && !first_line.contains(',') {
        b'\t'
    } else {
        b','
    }
}

fn to_vec(record: &csv::StringRecord) -> Vec<String> {
    record.iter().map(|cell| cell.to_string()).collect()
}
