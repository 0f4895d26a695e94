use std::path::Path;

use serde_json::{Map, Value};

use pgrkam_core::types::JobRow;
use pgrkam_core::{Error, Result};

/// Load a job catalog: CSV with a header row when the extension is `.csv`,
/// otherwise a JSON array or JSON Lines.
pub fn load_catalog(path: &Path) -> Result<Vec<JobRow>> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("job catalog {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    let is_csv = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let parsed = if is_csv { parse_csv_catalog(&content) } else { parse_catalog(&content) };
    let rows = parsed.map_err(|e| match e {
        Error::MalformedInput(m) => Error::MalformedInput(format!("{}: {m}", path.display())),
        other => other,
    })?;
    tracing::info!(rows = rows.len(), path = %path.display(), "loaded job catalog");
    Ok(rows)
}

/// Missing columns become empty strings; a missing `id` becomes the row position.
pub fn parse_catalog(content: &str) -> Result<Vec<JobRow>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values.iter().enumerate().map(|(i, v)| row_from_value(v, i)).collect();
    }
    let mut rows = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        let value: Value = serde_json::from_str(line).map_err(|e| Error::MalformedInput(format!("line {}: {e}", line_no + 1)))?;
        rows.push(row_from_value(&value, rows.len())?);
    }
    Ok(rows)
}

/// CSV with a header row. Column order is free and unknown columns are ignored.
pub fn parse_csv_catalog(content: &str) -> Result<Vec<JobRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(content.as_bytes());
    let headers: Vec<String> = reader.headers().map_err(csv_error)?.iter().map(|h| h.to_lowercase()).collect();
    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let cell = |key: &str| headers.iter().position(|h| h == key).and_then(|i| record.get(i)).unwrap_or_default().to_string();
        rows.push(job_row(cell, position));
    }
    Ok(rows)
}

fn csv_error(e: csv::Error) -> Error {
    match e.position() {
        Some(pos) => Error::MalformedInput(format!("line {}: {e}", pos.line())),
        None => Error::MalformedInput(e.to_string()),
    }
}

fn row_from_value(value: &Value, position: usize) -> Result<JobRow> {
    let Value::Object(obj) = value else {
        return Err(Error::MalformedInput(format!("row {position} is not an object")));
    };
    Ok(job_row(|key| column(obj, key), position))
}

fn job_row(cell: impl Fn(&str) -> String, position: usize) -> JobRow {
    let id = cell("id");
    JobRow {
        id: if id.is_empty() { position.to_string() } else { id },
        title: cell("title"),
        location: cell("location"),
        sector: cell("sector"),
        description: cell("description"),
        url: cell("url"),
        deadline: cell("deadline"),
    }
}

fn column(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
