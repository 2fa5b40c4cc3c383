use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of structural unit recognized by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Function,
    Class,
    Variable,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Function => "function",
            UnitType::Class => "class",
            UnitType::Variable => "variable",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural unit as produced by the extraction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedUnit {
    /// Function, class or variable
    pub unit_type: UnitType,
    /// Identifier of the unit
    pub name: String,
    /// Bare-name decorators in source order
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Positional parameter names, only set for functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    /// Bare-name base classes, only set for classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_types: Option<Vec<String>>,
    /// Verbatim text of the unit's lines, trimmed as one block
    pub source_text: String,
    /// Path of the originating file, as discovered
    pub file_path: String,
    /// Starting line number (1-based, inclusive)
    pub start_line: usize,
    /// Ending line number (1-based, inclusive)
    pub end_line: usize,
    /// Starting column (0-based byte offset)
    pub start_col: usize,
    /// Ending column (0-based byte offset), when known
    pub end_col: Option<usize>,
}

/// One entry of the catalog: an extracted unit enriched with its identity and token count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Dense sequential id, unique within one build
    pub identity: usize,
    #[serde(flatten)]
    pub unit: ExtractedUnit,
    /// Tokens produced by the configured tokenizer for `source_text`
    pub token_count: usize,
}

impl CatalogRecord {
    /// Flatten this record into the shape a vector-store collection accepts.
    ///
    /// List fields become comma-joined strings and absent values are dropped,
    /// since collection metadata only holds scalars.
    pub fn to_document(&self) -> IndexDocument {
        let unit = &self.unit;
        let mut metadata = BTreeMap::new();

        metadata.insert("identity".to_string(), self.identity.into());
        metadata.insert("unit_type".to_string(), unit.unit_type.as_str().into());
        metadata.insert("name".to_string(), unit.name.clone().into());
        metadata.insert("decorators".to_string(), unit.decorators.join(",").into());
        if let Some(parameters) = &unit.parameters {
            metadata.insert("parameters".to_string(), parameters.join(",").into());
        }
        if let Some(base_types) = &unit.base_types {
            metadata.insert("base_types".to_string(), base_types.join(",").into());
        }
        metadata.insert("file_path".to_string(), unit.file_path.clone().into());
        metadata.insert("start_line".to_string(), unit.start_line.into());
        metadata.insert("end_line".to_string(), unit.end_line.into());
        metadata.insert("start_col".to_string(), unit.start_col.into());
        if let Some(end_col) = unit.end_col {
            metadata.insert("end_col".to_string(), end_col.into());
        }
        metadata.insert("token_count".to_string(), self.token_count.into());

        IndexDocument {
            id: self.identity.to_string(),
            document: unit.source_text.clone(),
            metadata,
        }
    }

    /// `file:start-end` location string for tracing a record back to source
    pub fn location(&self) -> String {
        format!(
            "{}:{}-{}",
            self.unit.file_path, self.unit.start_line, self.unit.end_line
        )
    }
}

/// Sink-side representation of a catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Unique id within the collection
    pub id: String,
    /// The text to embed
    pub document: String,
    /// Every other record field, flattened to scalars
    pub metadata: BTreeMap<String, serde_json::Value>,
}
