use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TITLE: &str = "title";
pub const HEADING: &str = "heading";
pub const TEXT: &str = "text";
pub const TAG: &str = "tag";
pub const ANCHOR: &str = "anchor";

/// One indexable unit: a page or a section of a page.
///
/// `id` is the stable external identifier (usually `link` or `link#anchor`).
/// Fields are tokenized and weighted independently of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
