use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const TABLE_CACHE_TTL_SECONDS: u32 = 60 * 60;

pub const TITLE_FIELD: &str = "title";
pub const TAG_FIELD: &str = "tag";
pub const NOTE_FIELD: &str = "note";
pub const LINE_COLOR_FIELD: &str = "line_color";

/// IAW identifiers arrive either as strings or as integers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSetRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationSetRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "iiif_url")]
    pub iiif_base_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IiifInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Term { term_label: String },
    Other(serde_json::Value),
}

impl FieldValue {
    /// Display text: the string itself, or the term label for tag terms.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(value) => Cow::Borrowed(value),
            Self::Term { term_label } => Cow::Borrowed(term_label),
            Self::Other(value) => Cow::Owned(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocalizedValues {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

/// Field name -> language code -> values.
pub type AnnotationFields = HashMap<String, HashMap<String, LocalizedValues>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub image_id: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub fields: AnnotationFields,
}

impl Annotation {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_values(&self, field: &str, language: &str) -> &[FieldValue] {
        self.fields
            .get(field)
            .and_then(|by_language| by_language.get(language))
            .map(|localized| localized.values.as_slice())
            .unwrap_or_default()
    }

    /// Newline-joined display text of a field, empty when the field is absent.
    pub fn joined_field(&self, field: &str, language: &str) -> String {
        self.field_values(field, language)
            .iter()
            .map(FieldValue::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRow {
    pub image: String,
    pub title: String,
    pub tags: String,
    pub notes: String,
    pub line_color: String,
}

impl TableRow {
    pub const HEADERS: [&'static str; 5] = ["Image", "Title", "Tags", "Notes", "Line Color"];

    pub fn cells(&self) -> [&str; 5] {
        [
            &self.image,
            &self.title,
            &self.tags,
            &self.notes,
            &self.line_color,
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchLevel {
    ImageSet,
    AnnotationSet,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedBranch {
    pub level: BranchLevel,
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableResponse {
    pub rows: Vec<TableRow>,
    pub row_count: usize,
    pub skipped: Vec<SkippedBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionsResponse {
    pub items: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesResponse {
    pub image_set: String,
    pub items: Vec<ImageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
