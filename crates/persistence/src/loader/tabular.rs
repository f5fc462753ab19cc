//! Config-driven import of CSV and tab-separated source files.
//!
//! An [`ImportConfig`] names the dataset and lists source files, each holding
//! the entities of one type. `column2property` maps 0-based columns to
//! property ids: `id`, `name` and `description` fill the entity's key, name
//! and description, an empty id ignores the column, and any other id becomes a
//! string property. Empty cells and `-` are skipped.
//!
//! A file is read as CSV when its name (without `.gz`) ends in `csv` and as
//! tab-separated text otherwise. Names ending in `.gz` are gunzipped. Relative
//! file names are resolved against the directory of the configuration file.
//!
//! ```json
//! {
//!   "name": "Genes",
//!   "identifier_namespace": "http://example.org/gene/",
//!   "schema_namespace": "http://example.org/schema/",
//!   "view_url": "https://example.org/gene/{{id}}",
//!   "property_names": {"tax_id": "Taxonomy"},
//!   "files": [{
//!     "id": "gene",
//!     "name": "Gene",
//!     "filename": "genes.tsv.gz",
//!     "column2property": {"0": "tax_id", "1": "id", "2": "name"}
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Dataset, EntityRecord, PROPERTY_PSEUDO_TYPE, PropertyRecord, Record};
use crate::core::StoreMetadata;
use crate::error::LoadError;
use crate::types::{Property, PropertyValue, Type};

const KEY_COLUMN: &str = "id";
const NAME_COLUMN: &str = "name";
const DESCRIPTION_COLUMN: &str = "description";
const MISSING_VALUE: &str = "-";

/// Dataset description and source files of an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Human-readable name of the dataset.
    pub name: String,

    /// Namespace URI for entity identifiers.
    pub identifier_namespace: String,

    /// Namespace URI for type identifiers.
    pub schema_namespace: String,

    /// Display names of properties by id. Unlisted ids get a title-cased name.
    pub property_names: BTreeMap<String, String>,

    /// View-URL template given to every imported type.
    pub view_url: String,

    /// Source files, one type each.
    pub files: Vec<TableConfig>,

    /// Path the configuration was read from.
    #[serde(skip)]
    pub source: PathBuf,
}

/// One source file and the type of the entities it holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Type id of the file's entities.
    pub id: String,

    /// Type name.
    pub name: String,

    /// Type description.
    pub description: String,

    /// CSV or tab-separated file, optionally gzipped.
    pub filename: PathBuf,

    /// Property id of each 0-based column.
    #[serde(rename = "column2property")]
    pub columns: BTreeMap<usize, String>,
}

/// Column mapping of one source file, as found by [`inspect_tables`].
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    /// Type id of the file's entities.
    pub type_id: String,
    /// Resolved file path.
    pub path: PathBuf,
    /// Header columns in order.
    pub columns: Vec<ColumnPlan>,
}

/// A header column and the property it feeds, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    /// 0-based column index.
    pub index: usize,
    /// Header text.
    pub header: String,
    /// Mapped property id.
    pub property_id: Option<String>,
}

impl ImportConfig {
    /// Reads and validates a JSON import configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: ImportConfig =
            serde_json::from_reader(file).map_err(|e| LoadError::InvalidConfig {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.source = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Checks that every file has a type and a key column.
    pub fn validate(&self) -> Result<(), LoadError> {
        let invalid = |message: String| LoadError::InvalidConfig {
            path: self.source.display().to_string(),
            message,
        };

        if self.files.is_empty() {
            return Err(invalid("no files listed".to_string()));
        }
        for (index, table) in self.files.iter().enumerate() {
            if table.filename.as_os_str().is_empty() {
                return Err(invalid(format!("file {index} has no filename")));
            }
            let file = table.filename.display();
            if table.id.is_empty() || table.id == PROPERTY_PSEUDO_TYPE {
                return Err(invalid(format!("{file}: invalid type id '{}'", table.id)));
            }
            if !table.columns.values().any(|p| p == KEY_COLUMN) {
                return Err(invalid(format!("{file}: no column is mapped to \"id\"")));
            }
        }
        Ok(())
    }

    /// Resolves a file name against the configuration's directory.
    pub fn table_path(&self, table: &TableConfig) -> PathBuf {
        match self.source.parent() {
            Some(dir) => dir.join(&table.filename),
            None => table.filename.clone(),
        }
    }

    /// Display name of a property.
    pub fn property_name(&self, property_id: &str) -> String {
        self.property_names
            .get(property_id)
            .cloned()
            .unwrap_or_else(|| title_case(property_id))
    }
}

/// Turns a property id into a display name: `tax_id` becomes `Tax Id`.
pub fn title_case(id: &str) -> String {
    id.split(['_', '.', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn open_table(path: &Path) -> Result<csv::Reader<Box<dyn Read>>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (reader, format_name): (Box<dyn Read>, &str) = match file_name.strip_suffix(".gz") {
        Some(stem) => (Box::new(GzDecoder::new(file)), stem),
        None => (Box::new(file), file_name.as_str()),
    };

    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    if !format_name.ends_with("csv") {
        builder.delimiter(b'\t').quoting(false);
    }
    Ok(builder.from_reader(reader))
}

fn table_error(path: &Path, err: csv::Error) -> LoadError {
    LoadError::InvalidTable {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Reads the header of every source file and reports its column mapping
/// without reading any data rows.
pub fn inspect_tables(config: &ImportConfig) -> Result<Vec<TablePlan>, LoadError> {
    config.validate()?;

    let mut plans = Vec::with_capacity(config.files.len());
    for table in &config.files {
        let path = config.table_path(table);
        let mut reader = open_table(&path)?;
        let headers = reader.headers().map_err(|e| table_error(&path, e))?;

        let columns: Vec<ColumnPlan> = headers
            .iter()
            .enumerate()
            .map(|(index, header)| ColumnPlan {
                index,
                header: header.to_string(),
                property_id: table.columns.get(&index).filter(|p| !p.is_empty()).cloned(),
            })
            .collect();
        for column in &columns {
            info!(
                path = %path.display(),
                column = column.index,
                header = %column.header,
                property_id = column.property_id.as_deref().unwrap_or(""),
                "Column mapping"
            );
        }
        for index in table.columns.keys().filter(|&&i| i >= columns.len()) {
            warn!(path = %path.display(), column = index, "Mapped column is not in the header");
        }

        plans.push(TablePlan {
            type_id: table.id.clone(),
            path,
            columns,
        });
    }
    Ok(plans)
}

/// Reads every source file of an import into a dataset.
///
/// The dataset lists the types in file order, then the properties (each
/// declared for the types whose files gave it a value), then the entities.
/// Rows without a key are skipped.
pub fn load_tabular(config: &ImportConfig) -> Result<Dataset, LoadError> {
    config.validate()?;

    let mut types: Vec<Type> = Vec::new();
    let mut seen_types: HashSet<&str> = HashSet::new();
    let mut property_types: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut entities: Vec<EntityRecord> = Vec::new();

    for table in &config.files {
        if seen_types.insert(table.id.as_str()) {
            types.push(Type {
                id: table.id.clone(),
                name: if table.name.is_empty() {
                    table.id.clone()
                } else {
                    table.name.clone()
                },
                description: table.description.clone(),
                view_url: config.view_url.clone(),
            });
        }

        let path = config.table_path(table);
        let rows = read_table(&path, table, &mut entities, &mut property_types)?;
        info!(path = %path.display(), type_id = %table.id, rows, "Read source table");
    }

    let mut records: Vec<Record> = types.into_iter().map(Record::Type).collect();
    records.extend(property_types.into_iter().map(|(id, type_ids)| {
        let name = config.property_name(&id);
        Record::Property(PropertyRecord {
            property: Property::new(id, name),
            type_ids,
        })
    }));
    records.extend(entities.into_iter().map(Record::Entity));

    Ok(Dataset {
        metadata: StoreMetadata {
            name: config.name.clone(),
            identifier_namespace: config.identifier_namespace.clone(),
            schema_namespace: config.schema_namespace.clone(),
            view_url: config.view_url.clone(),
        },
        records,
    })
}

fn read_table(
    path: &Path,
    table: &TableConfig,
    entities: &mut Vec<EntityRecord>,
    property_types: &mut BTreeMap<String, Vec<String>>,
) -> Result<usize, LoadError> {
    let mut reader = open_table(path)?;
    let mut rows = 0;

    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| table_error(path, e))?;
        let mut entity = EntityRecord {
            type_ids: vec![table.id.clone()],
            ..Default::default()
        };

        for (&column, property_id) in &table.columns {
            let Some(cell) = row.get(column) else {
                continue;
            };
            let cell = cell.trim();
            match property_id.as_str() {
                "" => {}
                KEY_COLUMN => entity.key = cell.to_string(),
                NAME_COLUMN => entity.name = cell.to_string(),
                _ if cell.is_empty() || cell == MISSING_VALUE => {}
                DESCRIPTION_COLUMN => entity.description = cell.to_string(),
                _ => entity
                    .properties
                    .entry(property_id.clone())
                    .or_default()
                    .push(PropertyValue::String(cell.to_string())),
            }
        }

        if entity.key.is_empty() {
            // header is line 1
            debug!(path = %path.display(), line = index + 2, "Skipping row without a key");
            continue;
        }
        for property_id in entity.properties.keys() {
            let type_ids = property_types.entry(property_id.clone()).or_default();
            if !type_ids.contains(&table.id) {
                type_ids.push(table.id.clone());
            }
        }
        entities.push(entity);
        rows += 1;
    }
    Ok(rows)
}
