use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::lookup::Localizable;
use crate::slug::slugify;

/// JSON export of translatable content: source fields plus per-language translations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub translations: BTreeMap<String, TranslatedFields>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ContentStore {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read content: {}", path.display()))?;
        let store: ContentStore = serde_json::from_str(&text)
            .with_context(|| format!("parse content json: {}", path.display()))?;
        Ok(store)
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let mut text = serde_json::to_string_pretty(self).context("serialize content json")?;
        text.push('\n');
        std::fs::write(path, text).with_context(|| format!("write content: {}", path.display()))?;
        Ok(())
    }

    /// Every language that appears in at least one item's translations.
    pub fn languages(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .flat_map(|item| item.translations.keys().cloned())
            .collect()
    }
}

impl Localizable for ContentItem {
    fn canonical_address(&self) -> Option<&str> {
        self.canonical_address.as_deref()
    }

    fn localized_address(&self, language: &str) -> Option<String> {
        self.translations
            .get(language)
            .and_then(|t| t.address.as_deref())
            .map(|a| slugify(a, true))
            .filter(|a| !a.is_empty())
    }
}
