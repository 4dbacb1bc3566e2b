use crate::error::{Result, VizError};
use std::io::{self, Read};

/// Raw CSV contents: header row plus string cells.
#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV with a header row from any reader.
///
/// Short rows are padded with empty cells so every row lines up with the
/// headers.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(VizError::InvalidParameter(
            "CSV input has no header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}

pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_csv(io::stdin().lock())
}
