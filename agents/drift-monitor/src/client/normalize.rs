//! Flattening of cache payloads into records

use serde_json::Value;

use crate::dataset::{CellValue, Record};
use crate::error::{MonitorError, Result};

/// Separator joining nested object keys into one column name
pub const NESTED_SEPARATOR: &str = ".";

/// Extract the array under `region` and flatten every element
pub fn records_from_payload(payload: &Value, region: &str) -> Result<Vec<Record>> {
    let entries = payload
        .as_object()
        .and_then(|obj| obj.get(region))
        .ok_or_else(|| MonitorError::MissingRegion(region.to_string()))?;

    let items = entries.as_array().ok_or_else(|| {
        MonitorError::parse(format!("region '{}' does not hold an array", region))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| flatten_record(item, index))
        .collect()
}

/// Flatten one JSON object; nested objects become dotted columns
pub fn flatten_record(item: &Value, index: usize) -> Result<Record> {
    let obj = item.as_object().ok_or_else(|| {
        MonitorError::parse(format!("record {} is not a JSON object", index))
    })?;

    let mut record = Record::new();
    for (key, value) in obj {
        flatten_into(&mut record, key.clone(), value);
    }
    Ok(record)
}

fn flatten_into(record: &mut Record, prefix: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_into(record, format!("{}{}{}", prefix, NESTED_SEPARATOR, key), nested);
            }
        }
        other => record.insert(prefix, cell_from_json(other)),
    }
}

fn cell_from_json(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
        Value::String(s) => CellValue::Text(s.clone()),
        // arrays and empty objects are kept verbatim
        other => CellValue::Text(other.to_string()),
    }
}
