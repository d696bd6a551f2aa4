//! Custom Tera filters for generator templates.
//!
//! These filters let templates move structured data in and out of strings,
//! which is how list and object values usually reach a template (e.g. a
//! parent field rendered as JSON and unpacked again by a child).
//!
//! | Filter      | Input            | Output           | Arguments               |
//! |-------------|------------------|------------------|-------------------------|
//! | `from_json` | JSON string      | value            |                         |
//! | `to_json`   | value            | JSON string      | `indent` (optional)     |
//! | `from_csv`  | CSV with headers | list of mappings | `delimiter` (`,`)       |
//! | `to_csv`    | list of mappings | CSV with headers | `delimiter` (`,`)       |
//!
//! # Examples
//!
//! ```text
//! {{ inp.rows | from_csv(delimiter=";") | length }}
//! {{ par.gen.attributes | to_json(indent=2) }}
//! ```

use std::collections::HashMap;

/// Largest `indent` accepted by `to_json`.
const MAX_JSON_INDENT: u64 = 16;

type Args = HashMap<String, tera::Value>;

/// Read the `delimiter` argument as a single byte, defaulting to `,`.
fn delimiter_arg(filter: &str, args: &Args) -> tera::Result<u8> {
    let Some(value) = args.get("delimiter") else {
        return Ok(b',');
    };
    let delimiter = value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{filter}: delimiter must be a string")))?;
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(tera::Error::msg(format!(
            "{filter}: delimiter must be a single character, got '{delimiter}'"
        ))),
    }
}

/// Text of a scalar cell; `null` is an empty cell.
fn cell_text(value: &tera::Value) -> String {
    match value {
        tera::Value::Null => String::new(),
        tera::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Create the `from_json` filter.
pub fn create_from_json_filter() -> impl tera::Filter + 'static {
    move |value: &tera::Value, _args: &Args| -> tera::Result<tera::Value> {
        let text = value.as_str().ok_or_else(|| tera::Error::msg("from_json requires a string"))?;
        serde_json::from_str(text).map_err(|e| tera::Error::msg(format!("from_json: {e}")))
    }
}

/// Create the `to_json` filter.
///
/// Without `indent` the output is compact; with `indent=N` it is pretty
/// printed with `N` spaces per level, up to 16.
pub fn create_to_json_filter() -> impl tera::Filter + 'static {
    move |value: &tera::Value, args: &Args| -> tera::Result<tera::Value> {
        let text = match args.get("indent") {
            None | Some(tera::Value::Null) => serde_json::to_string(value),
            Some(indent) => {
                let width = indent.as_u64().filter(|width| *width <= MAX_JSON_INDENT).ok_or_else(|| {
                    tera::Error::msg(format!("to_json: indent must be an integer from 0 to {MAX_JSON_INDENT}"))
                })?;
                let indent = " ".repeat(width as usize);
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut buffer = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
                serde::Serialize::serialize(value, &mut serializer)
                    .map(|()| String::from_utf8_lossy(&buffer).into_owned())
            }
        }
        .map_err(|e| tera::Error::msg(format!("to_json: {e}")))?;
        Ok(tera::Value::String(text))
    }
}

/// Create the `from_csv` filter.
///
/// The first row holds the headers; every following row becomes a mapping
/// from header to cell text.
pub fn create_from_csv_filter() -> impl tera::Filter + 'static {
    move |value: &tera::Value, args: &Args| -> tera::Result<tera::Value> {
        let text = value.as_str().ok_or_else(|| tera::Error::msg("from_csv requires a string"))?;
        let delimiter = delimiter_arg("from_csv", args)?;

        let mut reader =
            csv::ReaderBuilder::new().delimiter(delimiter).has_headers(true).from_reader(text.as_bytes());
        let headers = reader.headers().map_err(|e| tera::Error::msg(format!("from_csv: {e}")))?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| tera::Error::msg(format!("from_csv: {e}")))?;
            let row: serde_json::Map<String, tera::Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| (header.to_string(), tera::Value::String(cell.to_string())))
                .collect();
            rows.push(tera::Value::Object(row));
        }

        Ok(tera::Value::Array(rows))
    }
}

/// Create the `to_csv` filter.
///
/// Headers are the union of all row keys in first-seen order. Rows end with
/// `\r\n`.
pub fn create_to_csv_filter() -> impl tera::Filter + 'static {
    move |value: &tera::Value, args: &Args| -> tera::Result<tera::Value> {
        let rows = value.as_array().ok_or_else(|| tera::Error::msg("to_csv requires a list of mappings"))?;
        let delimiter = delimiter_arg("to_csv", args)?;

        let mut headers: Vec<&str> = Vec::new();
        for row in rows {
            let row = row.as_object().ok_or_else(|| tera::Error::msg("to_csv requires a list of mappings"))?;
            for key in row.keys() {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());

        let write_error = |e: csv::Error| tera::Error::msg(format!("to_csv: {e}"));
        writer.write_record(&headers).map_err(write_error)?;
        for row in rows {
            let record: Vec<String> =
                headers.iter().map(|header| row.get(*header).map(cell_text).unwrap_or_default()).collect();
            writer.write_record(&record).map_err(write_error)?;
        }

        let bytes = writer.into_inner().map_err(|e| tera::Error::msg(format!("to_csv: {e}")))?;
        let text = String::from_utf8(bytes).map_err(|e| tera::Error::msg(format!("to_csv: {e}")))?;
        Ok(tera::Value::String(text))
    }
}
