//! Text heuristics: image-placeholder classification and boilerplate markers.
//!
//! Both heuristics are explicit configuration structures so keyword sets and
//! markers can be swapped per locale without touching traversal logic. The
//! defaults match the production slide decks this tool was built for, which
//! are Japanese.

use regex::Regex;
use std::sync::LazyLock;

/// Keywords whose presence marks a text frame as an image placeholder.
const IMAGE_KEYWORDS: &[&str] = &["写真", "画像", "イメージ", "イラスト", "撮影", "全景写真"];

/// Verb conjugations of 図る that share a character with the image-keyword
/// family and would otherwise false-positive. Checked before the keywords.
const EXCLUDE_PATTERNS: &[&str] = &["図っている", "図る", "図ら", "図り", "図れ", "図ろう"];

static DEFAULT_EXCLUSIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EXCLUDE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// The literal emitted for pictures and image placeholders.
const IMAGE_MARKER: &str = "画像";

/// Two-tier keyword heuristic deciding whether a text frame should be
/// treated as an image marker instead of text content.
#[derive(Debug, Clone)]
pub struct ImageHeuristics {
    marker: String,
    keywords: Vec<String>,
    exclusions: Vec<Regex>,
}

impl Default for ImageHeuristics {
    fn default() -> Self {
        Self {
            marker: IMAGE_MARKER.to_string(),
            keywords: IMAGE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            exclusions: DEFAULT_EXCLUSIONS.clone(),
        }
    }
}

impl ImageHeuristics {
    /// Create a heuristic with explicit marker, keywords, and exclusions.
    pub fn new(
        marker: impl Into<String>,
        keywords: Vec<String>,
        exclusions: Vec<Regex>,
    ) -> Self {
        Self {
            marker: marker.into(),
            keywords,
            exclusions,
        }
    }

    /// The literal emitted for pictures and matched placeholders.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Decide whether `text` is an image placeholder.
    ///
    /// Exclusion patterns are evaluated first and short-circuit to `false`;
    /// only then is keyword containment checked.
    pub fn is_image_placeholder(&self, text: &str) -> bool {
        for pattern in &self.exclusions {
            if pattern.is_match(text) {
                return false;
            }
        }

        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}

/// Recognized header/breadcrumb/footer markers.
#[derive(Debug, Clone)]
pub struct BoilerplateRules {
    header_marker: String,
    footer_marker: String,
    home_marker: String,
    breadcrumb_separator: String,
}

impl Default for BoilerplateRules {
    fn default() -> Self {
        Self {
            header_marker: "ヘッダー".to_string(),
            footer_marker: "フッター".to_string(),
            home_marker: "HOME".to_string(),
            breadcrumb_separator: "＞".to_string(),
        }
    }
}

impl BoilerplateRules {
    /// Create rules with explicit markers.
    pub fn new(
        header_marker: impl Into<String>,
        footer_marker: impl Into<String>,
        home_marker: impl Into<String>,
        breadcrumb_separator: impl Into<String>,
    ) -> Self {
        Self {
            header_marker: header_marker.into(),
            footer_marker: footer_marker.into(),
            home_marker: home_marker.into(),
            breadcrumb_separator: breadcrumb_separator.into(),
        }
    }

    /// A breadcrumb contains both the home marker and the separator glyph.
    pub fn is_breadcrumb(&self, text: &str) -> bool {
        text.contains(&self.home_marker) && text.contains(&self.breadcrumb_separator)
    }

    /// Remove recognized boilerplate from an ordered text sequence.
    ///
    /// Three independent, additive exclusion rules:
    /// - a header triple at the front: header marker, the page title, a
    ///   breadcrumb;
    /// - the footer marker at the last index;
    /// - any remaining breadcrumb anywhere in the sequence.
    pub fn filter(&self, texts: Vec<String>, page_title: &str) -> Vec<String> {
        let mut excluded = vec![false; texts.len()];

        if texts.len() >= 3
            && texts[0] == self.header_marker
            && texts[1] == page_title
            && self.is_breadcrumb(&texts[2])
        {
            excluded[0] = true;
            excluded[1] = true;
            excluded[2] = true;
        }

        if let Some(last) = texts.last() {
            if *last == self.footer_marker {
                excluded[texts.len() - 1] = true;
            }
        }

        texts
            .into_iter()
            .zip(excluded)
            .filter(|(text, excluded)| !*excluded && !self.is_breadcrumb(text))
            .map(|(text, _)| text)
            .collect()
    }
}
