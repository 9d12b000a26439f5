//! Slide-range conversion entry point.
//!
//! Ties the pipeline together: extract each slide in the requested range in
//! reading order, concatenate, match catalog parts, compose the ruleset,
//! and dispatch one batched classification request.

use crate::error::Result;
use crate::extract::extract_slide_texts;
use crate::generate::{classify, compose_ruleset, Generator};
use crate::heuristics::{BoilerplateRules, ImageHeuristics};
use crate::parts::RuleStore;
use crate::trace::TraceSink;
use crate::types::{Presentation, SlideRange};

/// Caller-supplied options for one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Explicit part names. None lets the catalog matcher decide.
    pub parts: Option<Vec<String>>,

    /// Output base name for the image-naming directive.
    pub output_name: Option<String>,
}

/// Converter holding the swappable text heuristics.
#[derive(Debug, Clone, Default)]
pub struct SlideConverter {
    heuristics: ImageHeuristics,
    boilerplate: BoilerplateRules,
}

impl SlideConverter {
    /// Create a converter with the default (Japanese) heuristics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the image-placeholder heuristics.
    pub fn with_heuristics(mut self, heuristics: ImageHeuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Swap the boilerplate markers.
    pub fn with_boilerplate(mut self, boilerplate: BoilerplateRules) -> Self {
        self.boilerplate = boilerplate;
        self
    }

    /// Extract the ordered, boilerplate-free text sequence for a slide
    /// range, concatenated slide-by-slide.
    ///
    /// Fails with the offending 1-based number when the range reaches past
    /// the presentation.
    pub fn extract_range(
        &self,
        presentation: &Presentation,
        range: SlideRange,
        page_title: &str,
        trace: &mut dyn TraceSink,
    ) -> Result<Vec<String>> {
        let mut all_texts = Vec::new();

        for number in range.numbers() {
            let slide = presentation.slide(number)?;
            log::debug!("extracting slide {}", number);

            let texts = extract_slide_texts(
                slide,
                presentation.geometry,
                page_title,
                &self.heuristics,
                &self.boilerplate,
                trace,
            );
            all_texts.extend(texts);
        }

        Ok(all_texts)
    }

    /// Convert a slide range into generated markup.
    ///
    /// When `options.parts` is None, part names are auto-matched from the
    /// extracted (already boilerplate-filtered) texts, so a removed element
    /// can never trigger a match.
    pub fn convert(
        &self,
        presentation: &Presentation,
        range: SlideRange,
        page_title: &str,
        options: &ConvertOptions,
        store: &RuleStore,
        generator: &dyn Generator,
        trace: &mut dyn TraceSink,
    ) -> Result<String> {
        let all_texts = self.extract_range(presentation, range, page_title, trace)?;
        trace.extracted(&all_texts);

        let catalog = store.catalog()?;
        let part_names = match &options.parts {
            Some(names) => names.clone(),
            None => catalog.match_texts(&all_texts),
        };
        log::debug!("matched parts: {:?}", part_names);

        let part_rules: Vec<String> = part_names
            .iter()
            .map(|name| store.part_rule(&catalog, name))
            .filter(|rule| !rule.is_empty())
            .collect();

        let ruleset = compose_ruleset(&store.base_rules(), &part_rules, options.output_name.as_deref());
        classify(&all_texts, &ruleset, generator, trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generate::GenerationRequest;
    use crate::trace::NullTrace;
    use crate::types::{Shape, ShapeKind, Slide, SlideGeometry};
    use std::cell::RefCell;

    /// Generator that records the request and returns a fixed fragment.
    struct RecordingGenerator {
        seen: RefCell<Vec<GenerationRequest>>,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Generator for RecordingGenerator {
        fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.borrow_mut().push(request.clone());
            Ok("<section>ok</section>".to_string())
        }
    }

    fn text_shape(text: &str, left: f64, top: f64) -> Shape {
        Shape::new(ShapeKind::TextFrame(text.to_string()), left, top, 100.0, 50.0)
    }

    fn presentation() -> Presentation {
        let mut prs = Presentation::new(SlideGeometry::new(1000.0, 1000.0));

        let mut first = Slide::new();
        first.add_shape(text_shape("カードの紹介", 10.0, 10.0));
        first.add_shape(text_shape("本文です", 10.0, 200.0));
        prs.add_slide(first);

        let mut second = Slide::new();
        second.add_shape(text_shape("続きの本文", 10.0, 10.0));
        prs.add_slide(second);

        prs
    }

    fn rules_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rules.txt"), "base rules").unwrap();
        std::fs::write(
            dir.path().join("parts_list.json"),
            r#"{"parts": [{"parts_name": "カード", "file_name": "r_card.txt"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("r_card.txt"), "card rules").unwrap();
        dir
    }

    #[test]
    fn test_extract_range_concatenates_slides_in_order() {
        let prs = presentation();
        let range = SlideRange::new(1, 2).unwrap();

        let texts = SlideConverter::new()
            .extract_range(&prs, range, "title", &mut NullTrace)
            .unwrap();

        assert_eq!(texts, vec!["カードの紹介", "本文です", "続きの本文"]);
    }

    #[test]
    fn test_extract_range_out_of_bounds_names_the_slide() {
        let prs = presentation();
        let range = SlideRange::new(2, 5).unwrap();

        match SlideConverter::new().extract_range(&prs, range, "title", &mut NullTrace) {
            Err(Error::SlideOutOfRange { number, slide_count }) => {
                assert_eq!(number, 3);
                assert_eq!(slide_count, 2);
            }
            other => panic!("expected SlideOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_auto_matches_parts_and_composes_rules() {
        let prs = presentation();
        let dir = rules_dir();
        let store = RuleStore::new(dir.path());
        let generator = RecordingGenerator::new();
        let range = SlideRange::new(1, 2).unwrap();

        let result = SlideConverter::new()
            .convert(
                &prs,
                range,
                "title",
                &ConvertOptions::default(),
                &store,
                &generator,
                &mut NullTrace,
            )
            .unwrap();

        assert_eq!(result, "<section>ok</section>");

        let seen = generator.seen.borrow();
        assert_eq!(seen.len(), 1);
        let prompt = &seen[0].user_prompt;
        assert!(prompt.starts_with("base rules\ncard rules"));
        assert!(prompt.contains("カードの紹介"));
        assert!(prompt.contains("続きの本文"));
    }

    #[test]
    fn test_convert_with_explicit_parts_skips_matching() {
        let prs = presentation();
        let dir = rules_dir();
        let store = RuleStore::new(dir.path());
        let generator = RecordingGenerator::new();
        let range = SlideRange::new(2, 2).unwrap();

        // Slide 2 contains no part name, but the explicit option forces the
        // card rules in anyway.
        let options = ConvertOptions {
            parts: Some(vec!["カード".to_string()]),
            output_name: None,
        };

        SlideConverter::new()
            .convert(&prs, range, "title", &options, &store, &generator, &mut NullTrace)
            .unwrap();

        let seen = generator.seen.borrow();
        assert!(seen[0].user_prompt.starts_with("base rules\ncard rules"));
    }

    #[test]
    fn test_convert_appends_output_name_directive() {
        let prs = presentation();
        let dir = rules_dir();
        let store = RuleStore::new(dir.path());
        let generator = RecordingGenerator::new();
        let range = SlideRange::new(1, 1).unwrap();

        let options = ConvertOptions {
            parts: None,
            output_name: Some("dayservice".to_string()),
        };

        SlideConverter::new()
            .convert(&prs, range, "title", &options, &store, &generator, &mut NullTrace)
            .unwrap();

        let seen = generator.seen.borrow();
        assert!(seen[0].user_prompt.contains("output_filename = dayservice"));
    }

    #[test]
    fn test_convert_propagates_malformed_catalog() {
        let prs = presentation();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("parts_list.json"), "[broken").unwrap();

        let store = RuleStore::new(dir.path());
        let generator = RecordingGenerator::new();
        let range = SlideRange::new(1, 1).unwrap();

        let result = SlideConverter::new().convert(
            &prs,
            range,
            "title",
            &ConvertOptions::default(),
            &store,
            &generator,
            &mut NullTrace,
        );

        assert!(matches!(result, Err(Error::MalformedCatalog { .. })));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let prs = presentation();
        let range = SlideRange::new(1, 2).unwrap();
        let converter = SlideConverter::new();

        let first = converter
            .extract_range(&prs, range, "title", &mut NullTrace)
            .unwrap();
        let second = converter
            .extract_range(&prs, range, "title", &mut NullTrace)
            .unwrap();

        assert_eq!(first, second);
    }
}
