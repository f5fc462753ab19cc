//! The tab-separated flat intermediate format.
//!
//! Every line has four tab-separated columns. The first line is a header:
//!
//! | column | header | property row | entity row |
//! |---|---|---|---|
//! | 0 | identifier namespace | property id | raw entity key |
//! | 1 | dataset name | property name | entity name |
//! | 2 | schema namespace | `property,` + type ids | comma-separated type ids |
//! | 3 | JSON list of types | JSON object | JSON object |
//!
//! An empty type list in the header declares a single type `item`. The view
//! URL of the dataset is the `url` of the first declared type.
//!
//! In the JSON object of a row, `description` is the description and every
//! other key is a property value. Arrays give several values, nulls are
//! skipped. Files whose name ends in `.gz` are gunzipped on the fly.
//! [`write_flat`] produces the same format from a [`Dataset`].

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{Dataset, EntityRecord, PROPERTY_PSEUDO_TYPE, PropertyRecord, Record};
use crate::core::StoreMetadata;
use crate::error::LoadError;
use crate::types::{PropertyMap, PropertyValue, Type};

/// Type declared when the header lists none.
pub const FALLBACK_TYPE: &str = "item";

const DESCRIPTION_KEY: &str = "description";

/// Reads a flat file, gunzipping it when the name ends in `.gz`.
pub fn load_flat_file(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let io_error = |source| LoadError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let dataset = parse_flat(BufReader::new(reader)).map_err(|err| match err {
        LoadError::Io { source, .. } => io_error(source),
        other => other,
    })?;
    info!(
        path = %path.display(),
        records = dataset.records.len(),
        "Loaded flat file"
    );
    Ok(dataset)
}

/// Parses the flat format from a reader.
pub fn parse_flat(reader: impl BufRead) -> Result<Dataset, LoadError> {
    let mut dataset: Option<Dataset> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| LoadError::Io {
            path: "<reader>".to_string(),
            source,
        })?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        match dataset.as_mut() {
            None => dataset = Some(parse_header(line)?),
            Some(dataset) => dataset.records.push(parse_row(line, line_no)?),
        }
    }

    dataset.ok_or_else(|| LoadError::InvalidHeader {
        message: "input is empty".to_string(),
    })
}

fn parse_header(line: &str) -> Result<Dataset, LoadError> {
    let columns: Vec<&str> = line.splitn(4, '\t').collect();
    if columns.len() < 3 {
        return Err(LoadError::InvalidHeader {
            message: format!("expected 4 columns, found {}", columns.len()),
        });
    }

    let types_json = columns.get(3).copied().unwrap_or_default().trim();
    let mut types: Vec<Type> = if types_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(types_json).map_err(|e| LoadError::InvalidJson {
            line: 1,
            message: e.to_string(),
        })?
    };
    if types.is_empty() {
        types.push(Type::new(FALLBACK_TYPE, FALLBACK_TYPE));
    }

    let metadata = StoreMetadata {
        name: columns[1].to_string(),
        identifier_namespace: columns[0].to_string(),
        schema_namespace: columns[2].to_string(),
        view_url: types[0].view_url.clone(),
    };
    debug!(name = %metadata.name, types = types.len(), "Parsed flat file header");

    Ok(Dataset {
        metadata,
        records: types.into_iter().map(Record::Type).collect(),
    })
}

fn parse_row(line: &str, line_no: usize) -> Result<Record, LoadError> {
    let columns: Vec<&str> = line.splitn(4, '\t').collect();
    if columns.len() != 4 || columns[3].trim().is_empty() {
        return Err(LoadError::InvalidRow {
            line: line_no,
            message: "expected 4 tab-separated columns with a JSON object last".to_string(),
        });
    }

    let attributes: Map<String, Value> =
        serde_json::from_str(columns[3]).map_err(|e| LoadError::InvalidJson {
            line: line_no,
            message: e.to_string(),
        })?;

    let mut record = EntityRecord {
        key: columns[0].to_string(),
        name: columns[1].to_string(),
        type_ids: columns[2]
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        ..Default::default()
    };

    for (key, value) in attributes {
        if key == DESCRIPTION_KEY {
            record.description = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            continue;
        }
        add_values(&mut record.properties, key, &value, line_no);
    }

    Ok(Record::Entity(record))
}

fn add_values(properties: &mut PropertyMap, key: String, value: &Value, line_no: usize) {
    let values: Vec<PropertyValue> = match value {
        Value::Array(items) => items.iter().filter_map(PropertyValue::from_json).collect(),
        other => PropertyValue::from_json(other).into_iter().collect(),
    };
    if values.is_empty() {
        if !value.is_null() {
            debug!(line = line_no, property_id = %key, "Skipping unusable property value");
        }
        return;
    }
    properties.entry(key).or_default().extend(values);
}

/// Writes a dataset in the flat format.
///
/// Declared types go into the header; every other record becomes one row in
/// dataset order. Tabs and line breaks in the text columns are replaced by
/// spaces.
pub fn write_flat(dataset: &Dataset, mut writer: impl Write) -> io::Result<()> {
    let types: Vec<&Type> = dataset
        .records
        .iter()
        .filter_map(|record| match record {
            Record::Type(ty) => Some(ty),
            _ => None,
        })
        .collect();
    let metadata = &dataset.metadata;
    writeln!(
        writer,
        "{}\t{}\t{}\t{}",
        clean(&metadata.identifier_namespace),
        clean(&metadata.name),
        clean(&metadata.schema_namespace),
        serde_json::to_string(&types)?
    )?;

    let mut rows = 0usize;
    for record in &dataset.records {
        match record {
            Record::Type(_) => continue,
            Record::Property(PropertyRecord { property, type_ids }) => {
                let attributes = with_description(&property.description);
                let types = std::iter::once(PROPERTY_PSEUDO_TYPE)
                    .chain(type_ids.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(",");
                write_row(&mut writer, &property.id, &property.name, &types, &attributes)?;
            }
            Record::Entity(entity) => {
                let mut attributes = with_description(&entity.description);
                for (key, values) in &entity.properties {
                    let value = match values.as_slice() {
                        [] => continue,
                        [single] => serde_json::to_value(single)?,
                        many => serde_json::to_value(many)?,
                    };
                    attributes.insert(key.clone(), value);
                }
                write_row(
                    &mut writer,
                    &entity.key,
                    &entity.name,
                    &entity.type_ids.join(","),
                    &attributes,
                )?;
            }
        }
        rows += 1;
    }

    writer.flush()?;
    debug!(rows, types = types.len(), "Wrote flat file");
    Ok(())
}

fn with_description(description: &str) -> Map<String, Value> {
    let mut attributes = Map::new();
    if !description.is_empty() {
        attributes.insert(
            DESCRIPTION_KEY.to_string(),
            Value::String(description.to_string()),
        );
    }
    attributes
}

fn write_row(
    writer: &mut impl Write,
    key: &str,
    name: &str,
    types: &str,
    attributes: &Map<String, Value>,
) -> io::Result<()> {
    writeln!(
        writer,
        "{}\t{}\t{}\t{}",
        clean(key),
        clean(name),
        clean(types),
        serde_json::to_string(attributes)?
    )
}

fn clean(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}
