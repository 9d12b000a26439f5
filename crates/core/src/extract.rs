//! Layout-aware extraction: visibility, shape-tree flattening, and
//! reading-order sequencing.
//!
//! Slides carry no ordering guarantee, so the logical reading order has to
//! be reconstructed from spatial coordinates: flatten the shape tree into
//! positioned elements, drop elements bleeding off-canvas, then sort by
//! normalized position.

use std::cmp::Ordering;

use crate::heuristics::{BoilerplateRules, ImageHeuristics};
use crate::trace::TraceSink;
use crate::types::{Element, Shape, ShapeKind, Slide, SlideGeometry};

/// X-axis visibility test.
///
/// An element is on-slide iff at least half of its width lies within the
/// slide: `x_in = min(left + width, slide_width) - max(left, 0)` must be
/// positive and at least `width / 2` (the boundary counts as visible).
/// Vertical position never excludes an element. When either width is
/// unknown the test is skipped and the element counts as visible.
pub fn is_visible(left: f64, width: Option<f64>, slide_width: Option<f64>) -> bool {
    let (Some(width), Some(slide_width)) = (width, slide_width) else {
        return true;
    };

    let x_in = (left + width).min(slide_width) - left.max(0.0);
    x_in > 0.0 && x_in >= width / 2.0
}

/// Flatten a slide's shape tree into positioned elements.
///
/// Traversal-encounter order is preserved; it is the tie-breaker for the
/// reading-order sort.
pub fn flatten_slide(
    slide: &Slide,
    geometry: SlideGeometry,
    heuristics: &ImageHeuristics,
    trace: &mut dyn TraceSink,
) -> Vec<Element> {
    let mut elements = Vec::new();
    for shape in &slide.shapes {
        flatten_shape(shape, geometry.width, heuristics, 0.0, 0.0, &mut elements, trace);
    }
    elements
}

fn flatten_shape(
    shape: &Shape,
    slide_width: Option<f64>,
    heuristics: &ImageHeuristics,
    parent_left: f64,
    parent_top: f64,
    out: &mut Vec<Element>,
    trace: &mut dyn TraceSink,
) {
    // Offsets compose additively down the tree.
    let left = shape.left + parent_left;
    let top = shape.top + parent_top;

    trace.note(&format!(
        "shape kind={} left={} top={} width={:?} height={:?}",
        kind_name(&shape.kind),
        left,
        top,
        shape.width,
        shape.height
    ));

    // Groups have no independent visibility semantics; only leaf content is
    // checked against the slide edge.
    if let ShapeKind::Group(children) = &shape.kind {
        for child in children {
            flatten_shape(child, slide_width, heuristics, left, top, out, trace);
        }
        return;
    }

    if !is_visible(left, shape.width, slide_width) {
        trace.note(&format!(
            "excluded as off-slide: left={} width={:?}",
            left, shape.width
        ));
        return;
    }

    match &shape.kind {
        ShapeKind::Picture => {
            out.push(Element::new(heuristics.marker(), top, left));
        }
        ShapeKind::TextFrame(text) => {
            let text = text.trim();
            if text.is_empty() {
                trace.note("text frame with empty text");
            } else if heuristics.is_image_placeholder(text) {
                trace.note(&format!("image placeholder: {}", text));
                out.push(Element::new(heuristics.marker(), top, left));
            } else {
                out.push(Element::new(text, top, left));
            }
        }
        ShapeKind::Table(rows) => {
            // Row/column positions are not tracked separately; every cell
            // shares the table's position and cell order is row-major.
            for row in rows {
                for cell in row {
                    let cell = cell.trim();
                    if !cell.is_empty() {
                        out.push(Element::new(cell, top, left));
                    }
                }
            }
        }
        ShapeKind::Other => {
            trace.note("unsupported shape kind");
        }
        ShapeKind::Group(_) => unreachable!("groups are handled before the visibility test"),
    }
}

fn kind_name(kind: &ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Picture => "picture",
        ShapeKind::TextFrame(_) => "text_frame",
        ShapeKind::Group(_) => "group",
        ShapeKind::Table(_) => "table",
        ShapeKind::Other => "other",
    }
}

/// Stable-sort elements into reading order.
///
/// Positions are normalized to `(top / height, left / width)` so the
/// comparison is aspect-independent; raw values pass through when a
/// dimension is unknown. Elements at identical normalized positions keep
/// their flattening order.
pub fn sort_reading_order(elements: &mut [Element], geometry: SlideGeometry) {
    elements.sort_by(|a, b| {
        normalized_position(a, geometry)
            .partial_cmp(&normalized_position(b, geometry))
            .unwrap_or(Ordering::Equal)
    });
}

fn normalized_position(element: &Element, geometry: SlideGeometry) -> (f64, f64) {
    let top = match geometry.height {
        Some(height) if height != 0.0 => element.top / height,
        _ => element.top,
    };
    let left = match geometry.width {
        Some(width) if width != 0.0 => element.left / width,
        _ => element.left,
    };
    (top, left)
}

/// Extract one slide's canonical text sequence: flatten, order, and strip
/// boilerplate.
pub fn extract_slide_texts(
    slide: &Slide,
    geometry: SlideGeometry,
    page_title: &str,
    heuristics: &ImageHeuristics,
    boilerplate: &BoilerplateRules,
    trace: &mut dyn TraceSink,
) -> Vec<String> {
    let mut elements = flatten_slide(slide, geometry, heuristics, trace);
    sort_reading_order(&mut elements, geometry);

    let texts: Vec<String> = elements.into_iter().map(|el| el.text).collect();
    boilerplate.filter(texts, page_title)
}
