//! Core domain types, layout-aware extraction, and rule-driven
//! classification dispatch for slide-to-HTML conversion.

pub mod convert;
pub mod error;
pub mod extract;
pub mod generate;
pub mod heuristics;
pub mod parts;
pub mod trace;
pub mod types;

pub use convert::{ConvertOptions, SlideConverter};
pub use error::{Error, Result};
pub use generate::{GenerationRequest, Generator};
pub use heuristics::{BoilerplateRules, ImageHeuristics};
pub use parts::{PartEntry, PartsCatalog, RuleStore};
pub use trace::{NullTrace, TraceSink};
pub use types::{Element, Presentation, Shape, ShapeKind, Slide, SlideGeometry, SlideRange};
