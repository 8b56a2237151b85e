//! Records and record-file parsing.
//!
//! A [`Record`] is the parsed field mapping of one record file plus the two
//! attributes the loader derives: the normalized relative path and the
//! content digest. The derived attributes live beside the fields, never
//! inside them, so nothing the loader computes can leak back into a source
//! document.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{json_type_name, RecordError};

/// Supported record file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Yaml,
}

impl RecordFormat {
    /// Format for a file path, or `None` if the extension is not a record extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    /// Parse file bytes into a field mapping.
    ///
    /// # Errors
    ///
    /// [`RecordError::Parse`] if the bytes are not valid in this format and
    /// [`RecordError::NotAnObject`] if the document is not a mapping.
    pub fn parse(self, bytes: &[u8]) -> Result<Map<String, Value>, RecordError> {
        let parse_err = |reason: String| RecordError::Parse {
            format: self.name(),
            reason,
        };
        let value: Value = match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| parse_err(e.to_string()))?,
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| parse_err(e.to_string()))?,
        };
        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(RecordError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }
}

/// Read the identifier field of a parsed record.
///
/// # Errors
///
/// [`RecordError::MissingId`] when the field is absent, null, or empty;
/// [`RecordError::InvalidId`] when it holds a non-string value.
pub fn extract_id(fields: &Map<String, Value>, id_field: &'static str) -> Result<String, RecordError> {
    match fields.get(id_field) {
        None | Some(Value::Null) => Err(RecordError::MissingId { field: id_field }),
        Some(Value::String(s)) if s.is_empty() => Err(RecordError::MissingId { field: id_field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(RecordError::InvalidId {
            field: id_field,
            found: json_type_name(other),
        }),
    }
}

/// One accepted record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    path: String,
    digest: String,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: String, path: String, digest: String, fields: Map<String, Value>) -> Self {
        Self {
            id,
            path,
            digest,
            fields,
        }
    }

    /// The identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path relative to the registry directory, `/`-separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lowercase hex SHA-256 of the file bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The parsed source fields, exactly as read.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A field's value when it is a non-empty string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Relative path of `path` under `base`, with `/` separators.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
