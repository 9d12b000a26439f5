//! Parts catalog and rule store.
//!
//! A "part" is a named content pattern (card layout, table, ...) with a
//! supplemental rule file steering the generation step. The catalog maps
//! part names to rule files and is matched against the extracted text by
//! case-insensitive substring containment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Catalog file name inside the rules directory.
const CATALOG_FILE: &str = "parts_list.json";

/// Base rules file name inside the rules directory.
const BASE_RULES_FILE: &str = "rules.txt";

/// The parts catalog, validated at load time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartsCatalog {
    /// Catalog entries in file order.
    #[serde(default)]
    pub parts: Vec<PartEntry>,
}

/// One catalog entry mapping a part name to its rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct PartEntry {
    /// The part name matched against slide text.
    pub parts_name: String,

    /// Rule file name, relative to the rules directory.
    pub file_name: String,
}

impl PartsCatalog {
    /// Load a catalog from a JSON file.
    ///
    /// An absent file degrades to an empty catalog; a present but
    /// undeserializable file is a `MalformedCatalog` error. The two cases
    /// are never conflated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("parts catalog {} not found; no parts will match", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|err| Error::MalformedCatalog {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Look up an entry by its exact part name.
    pub fn entry(&self, name: &str) -> Option<&PartEntry> {
        self.parts.iter().find(|entry| entry.parts_name == name)
    }

    /// Scan texts for catalog part names.
    ///
    /// An entry matches when its folded name is a substring of any folded,
    /// trimmed text element. The result is deduplicated and ordered by
    /// first catalog occurrence, so reruns on identical input are
    /// byte-identical.
    pub fn match_texts(&self, texts: &[String]) -> Vec<String> {
        let folded_texts: Vec<String> = texts.iter().map(|text| fold(text)).collect();

        let mut found: Vec<String> = Vec::new();
        for entry in &self.parts {
            let needle = fold(&entry.parts_name);
            if needle.is_empty() || found.contains(&entry.parts_name) {
                continue;
            }
            if folded_texts.iter().any(|text| text.contains(&needle)) {
                found.push(entry.parts_name.clone());
            }
        }
        found
    }
}

/// Fold text for matching: trim, NFKC-normalize (full-width and half-width
/// forms compare equal), lowercase.
fn fold(text: &str) -> String {
    text.trim().nfkc().collect::<String>().to_lowercase()
}

/// Filesystem-backed store for the base rules, the parts catalog, and the
/// per-part rule files.
///
/// The directory handle is explicit; nothing in the core assumes ambient
/// paths.
#[derive(Debug, Clone)]
pub struct RuleStore {
    dir: PathBuf,
}

impl RuleStore {
    /// Create a store rooted at the given rules directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The rules directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the parts catalog (`parts_list.json`).
    pub fn catalog(&self) -> Result<PartsCatalog> {
        PartsCatalog::load(&self.dir.join(CATALOG_FILE))
    }

    /// Read the base rules (`rules.txt`). Missing file degrades to empty.
    pub fn base_rules(&self) -> String {
        let path = self.dir.join(BASE_RULES_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("base rules {} unreadable ({}); using empty rules", path.display(), err);
                String::new()
            }
        }
    }

    /// Read the rule file for a named part. Unknown names and missing
    /// files degrade to empty.
    pub fn part_rule(&self, catalog: &PartsCatalog, name: &str) -> String {
        let Some(entry) = catalog.entry(name) else {
            log::warn!("part {:?} is not in the catalog; skipping its rules", name);
            return String::new();
        };

        let path = self.dir.join(&entry.file_name);
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("part rule {} unreadable ({}); skipping", path.display(), err);
                String::new()
            }
        }
    }
}
