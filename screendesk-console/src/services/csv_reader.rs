//! CSV row parsing
//!
//! Turns an uploaded delimited file into ordered `RowRecord`s with
//! header-derived field names. Fully blank lines are skipped; ragged rows
//! are tolerated (missing cells simply absent).

use crate::models::RowRecord;
use screendesk_common::{Error, Result};

/// Parse CSV bytes into row records
///
/// The first record is the header. Headers and values are trimmed.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<RowRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::InvalidInput("CSV file has an empty header".to_string()));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| Error::InvalidInput(format!("Bad CSV record on line {}: {}", line + 2, e)))?;

        let fields: Vec<(String, String)> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.trim().to_string()))
            .collect();

        let row = RowRecord::from_pairs(fields);
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}
