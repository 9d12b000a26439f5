//! Domain types for representing presentation content.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed presentation: slide geometry plus the slides in document order.
///
/// Immutable once built; the extraction pipeline only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Slide width/height shared by all slides.
    pub geometry: SlideGeometry,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given geometry.
    pub fn new(geometry: SlideGeometry) -> Self {
        Self {
            geometry,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Look up a slide by its 1-based number.
    ///
    /// Fails with the offending number when it is outside the presentation.
    pub fn slide(&self, number: usize) -> Result<&Slide> {
        number
            .checked_sub(1)
            .and_then(|idx| self.slides.get(idx))
            .ok_or(Error::SlideOutOfRange {
                number,
                slide_count: self.slides.len(),
            })
    }
}

/// Slide dimensions in the presentation's coordinate units (EMU for PPTX).
///
/// Either dimension may be unknown when the document source does not carry
/// it; coordinate normalization then passes raw values through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideGeometry {
    /// Slide width. None if unknown.
    pub width: Option<f64>,

    /// Slide height. None if unknown.
    pub height: Option<f64>,
}

impl SlideGeometry {
    /// Create a geometry with both dimensions known.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

/// A single slide, owning its visual-element tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level shape.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// A node in a slide's visual-element tree.
///
/// Group children carry coordinates relative to their group; absolute
/// positions are the sum of all ancestor offsets plus the shape's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// What kind of content this shape carries.
    pub kind: ShapeKind,

    /// Horizontal offset from the parent origin.
    pub left: f64,

    /// Vertical offset from the parent origin.
    pub top: f64,

    /// Shape width. None if the source document carries no extent.
    pub width: Option<f64>,

    /// Shape height. None if the source document carries no extent.
    pub height: Option<f64>,
}

impl Shape {
    /// Create a shape with a full bounding box.
    pub fn new(kind: ShapeKind, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            kind,
            left,
            top,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Create a shape whose extent is unknown.
    pub fn without_extent(kind: ShapeKind, left: f64, top: f64) -> Self {
        Self {
            kind,
            left,
            top,
            width: None,
            height: None,
        }
    }
}

/// Shape content variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A picture; flattened to the image-marker literal.
    Picture,

    /// A text frame with its raw text.
    TextFrame(String),

    /// A group of child shapes with coordinates relative to the group.
    Group(Vec<Shape>),

    /// A table as a row-major grid of cell texts.
    Table(Vec<Vec<String>>),

    /// Anything else; contributes no content.
    Other,
}

/// A flattened, positioned unit of extractable content.
///
/// Ephemeral: rebuilt for every extraction pass, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// The text content or image-marker literal.
    pub text: String,

    /// Absolute vertical position on the slide.
    pub top: f64,

    /// Absolute horizontal position on the slide.
    pub left: f64,
}

impl Element {
    /// Create an element at an absolute position.
    pub fn new(text: impl Into<String>, top: f64, left: f64) -> Self {
        Self {
            text: text.into(),
            top,
            left,
        }
    }
}

/// An inclusive, 1-based slide range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideRange {
    start: usize,
    end: usize,
}

impl SlideRange {
    /// Create a range, validating `1 <= start <= end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start == 0 {
            return Err(Error::InvalidRange(
                "slide numbers are 1-based; start must be at least 1".to_string(),
            ));
        }
        if end < start {
            return Err(Error::InvalidRange(format!(
                "end slide {} precedes start slide {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// First slide number in the range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last slide number in the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Iterate the 1-based slide numbers, inclusive.
    pub fn numbers(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}
