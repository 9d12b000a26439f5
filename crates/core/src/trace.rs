//! Diagnostic sink for shape-by-shape tracing.
//!
//! Purely observational: the pipeline writes into the sink and never reads
//! back. Callers that want on-disk traces provide their own implementation;
//! everything here stays free of filesystem assumptions.

use crate::generate::GenerationRequest;

/// Write-only channel receiving traversal notes, the final extracted text
/// list, and the exact request/response exchanged with the generation
/// service.
pub trait TraceSink {
    /// A one-line traversal note (shape seen, element excluded, ...).
    fn note(&mut self, _line: &str) {}

    /// The final ordered text list for the whole requested range.
    fn extracted(&mut self, _texts: &[String]) {}

    /// The exact request sent to the generation service.
    fn request(&mut self, _request: &GenerationRequest) {}

    /// The raw response returned by the generation service.
    fn response(&mut self, _response: &str) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {}
