//! PPTX file parser implementation.

use slidegen_core::{Error, Presentation, Result, Shape, ShapeKind, Slide, SlideGeometry};

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader into a presentation.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Presentation> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let geometry = self.slide_geometry(&mut archive);
        let mut presentation = Presentation::new(geometry);

        for slide_path in self.slide_order(&mut archive)? {
            let content = self.read_file_from_archive(&mut archive, &slide_path)?;
            let mut slide = Slide::new();
            for shape in extract_shape_tree(&content)? {
                slide.add_shape(shape);
            }
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Read the slide size from `ppt/presentation.xml`.
    ///
    /// A missing or size-less presentation part leaves the geometry
    /// unknown; the visibility filter then passes everything through.
    fn slide_geometry<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> SlideGeometry {
        let content = match self.read_file_from_archive(archive, "ppt/presentation.xml") {
            Ok(content) => content,
            Err(e) => {
                log::warn!("presentation.xml unreadable ({}); slide size unknown", e);
                return SlideGeometry::default();
            }
        };

        match parse_slide_size(&content) {
            Some((width, height)) => SlideGeometry::new(width, height),
            None => {
                log::warn!("presentation.xml carries no sldSz; slide size unknown");
                SlideGeometry::default()
            }
        }
    }

    /// Get the ordered list of slide paths from the presentation
    /// relationships.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = "ppt/_rels/presentation.xml.rels";

        let rels_content = self.read_file_from_archive(archive, rels_path)?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => {
                                rel_type = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Id" => {
                                id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    // Slide relationships only; layouts and masters also
                    // contain "/slide" in their type.
                    if rel_type.contains("/slide")
                        && !rel_type.contains("slideLayout")
                        && !rel_type.contains("slideMaster")
                    {
                        let order_num =
                            extract_slide_number(&id).or_else(|| extract_slide_number(&target));
                        let full_path = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("ppt/{}", target)
                        };
                        slides.push((full_path, order_num));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Partially built shape while its XML element is still open.
#[derive(Debug)]
struct ShapeBuilder {
    kind: BuilderKind,
    left: f64,
    top: f64,
    width: Option<f64>,
    height: Option<f64>,
    text: String,
    children: Vec<Shape>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BuilderKind {
    /// `sp` - a text frame.
    TextFrame,
    /// `pic` - a picture.
    Picture,
    /// `grpSp` - a group of child shapes.
    Group,
    /// `graphicFrame` - a table when a `tbl` appears, otherwise opaque.
    Frame,
    /// `cxnSp` and friends - tracked only so their transforms do not leak
    /// into an enclosing shape.
    Other,
}

impl ShapeBuilder {
    fn new(kind: BuilderKind) -> Self {
        Self {
            kind,
            left: 0.0,
            top: 0.0,
            width: None,
            height: None,
            text: String::new(),
            children: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn build(self) -> Shape {
        let kind = match self.kind {
            BuilderKind::TextFrame => ShapeKind::TextFrame(self.text),
            BuilderKind::Picture => ShapeKind::Picture,
            BuilderKind::Group => ShapeKind::Group(self.children),
            BuilderKind::Frame => {
                if self.rows.is_empty() {
                    ShapeKind::Other
                } else {
                    ShapeKind::Table(self.rows)
                }
            }
            BuilderKind::Other => ShapeKind::Other,
        };

        Shape {
            kind,
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

fn builder_kind(local: &[u8]) -> Option<BuilderKind> {
    match local {
        b"sp" => Some(BuilderKind::TextFrame),
        b"pic" => Some(BuilderKind::Picture),
        b"grpSp" => Some(BuilderKind::Group),
        b"graphicFrame" => Some(BuilderKind::Frame),
        b"cxnSp" => Some(BuilderKind::Other),
        _ => None,
    }
}

/// Extract the shape tree from slide XML.
///
/// Walks the `spTree` with an explicit builder stack: shape elements push a
/// builder, transforms and text accumulate into the innermost open builder,
/// and closing a shape attaches it to its parent group or the top level.
/// Group children keep their group-relative coordinates; offset composition
/// happens later in the extraction pipeline.
pub fn extract_shape_tree(xml_content: &str) -> Result<Vec<Shape>> {
    let mut top_level: Vec<Shape> = Vec::new();
    let mut stack: Vec<ShapeBuilder> = Vec::new();

    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut in_paragraph = false;
    let mut in_cell = false;
    let mut current_row: Vec<String> = Vec::new();
    let mut current_cell = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(kind) = builder_kind(local) {
                    stack.push(ShapeBuilder::new(kind));
                    continue;
                }

                match local {
                    b"off" | b"ext" => apply_transform(local, e, stack.last_mut()),
                    b"tbl" => {
                        // Marks the enclosing graphicFrame as a table; rows
                        // collect below.
                    }
                    b"tr" => {
                        current_row = Vec::new();
                    }
                    b"tc" => {
                        in_cell = true;
                        current_cell = String::new();
                    }
                    b"p" => {
                        // Paragraph boundaries become newlines.
                        in_paragraph = true;
                        if in_cell {
                            if !current_cell.is_empty() {
                                current_cell.push('\n');
                            }
                        } else if let Some(top) = stack.last_mut() {
                            if top.kind == BuilderKind::TextFrame && !top.text.is_empty() {
                                top.text.push('\n');
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"off" || local == b"ext" {
                    apply_transform(local, e, stack.last_mut());
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    if in_cell {
                        current_cell.push_str(&text);
                    } else if let Some(top) = stack.last_mut() {
                        if top.kind == BuilderKind::TextFrame {
                            top.text.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if builder_kind(local).is_some() {
                    if let Some(builder) = stack.pop() {
                        let shape = builder.build();
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(shape),
                            None => top_level.push(shape),
                        }
                    }
                    continue;
                }

                match local {
                    b"tc" => {
                        in_cell = false;
                        current_row.push(std::mem::take(&mut current_cell));
                    }
                    b"tr" => {
                        if let Some(top) = stack.last_mut() {
                            top.rows.push(std::mem::take(&mut current_row));
                        }
                    }
                    b"p" => {
                        in_paragraph = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
            }
            _ => {}
        }
    }

    Ok(top_level)
}

fn apply_transform(
    local: &[u8],
    e: &quick_xml::events::BytesStart<'_>,
    builder: Option<&mut ShapeBuilder>,
) {
    // Transforms outside any shape (the spTree's own xfrm) are ignored.
    let Some(builder) = builder else {
        return;
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        let Ok(value) = value.parse::<f64>() else {
            continue;
        };

        match (local, attr.key.as_ref()) {
            (b"off", b"x") => builder.left = value,
            (b"off", b"y") => builder.top = value,
            (b"ext", b"cx") => builder.width = Some(value),
            (b"ext", b"cy") => builder.height = Some(value),
            _ => {}
        }
    }
}

/// Read the slide size from presentation XML (`sldSz` `cx`/`cy`).
pub fn parse_slide_size(xml_content: &str) -> Option<(f64, f64)> {
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldSz" =>
            {
                let mut cx = None;
                let mut cy = None;

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"cx" => cx = value.parse::<f64>().ok(),
                        b"cy" => cy = value.parse::<f64>().ok(),
                        _ => {}
                    }
                }

                if let (Some(cx), Some(cy)) = (cx, cy) {
                    return Some((cx, cy));
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_parse_slide_size() {
        let xml = r#"<p:presentation xmlns:p="ns"><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#;
        assert_eq!(parse_slide_size(xml), Some((9144000.0, 6858000.0)));
    }

    #[test]
    fn test_parse_slide_size_missing() {
        let xml = r#"<p:presentation xmlns:p="ns"></p:presentation>"#;
        assert_eq!(parse_slide_size(xml), None);
    }

    #[test]
    fn test_text_frame_with_bounding_box() {
        let xml = r#"
            <p:spTree>
              <p:sp>
                <p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm></p:spPr>
                <p:txBody><a:p><a:r><a:t>Hello</a:t></a:r></a:p></p:txBody>
              </p:sp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].left, 100.0);
        assert_eq!(shapes[0].top, 200.0);
        assert_eq!(shapes[0].width, Some(300.0));
        assert_eq!(shapes[0].height, Some(400.0));
        match &shapes[0].kind {
            ShapeKind::TextFrame(text) => assert_eq!(text, "Hello"),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_paragraphs_join_with_newline() {
        let xml = r#"
            <p:spTree>
              <p:sp>
                <p:txBody>
                  <a:p><a:r><a:t>line one</a:t></a:r></a:p>
                  <a:p><a:r><a:t>line two</a:t></a:r></a:p>
                </p:txBody>
              </p:sp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        match &shapes[0].kind {
            ShapeKind::TextFrame(text) => assert_eq!(text, "line one\nline two"),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_runs_within_a_paragraph_concatenate() {
        let xml = r#"
            <p:spTree>
              <p:sp>
                <p:txBody><a:p><a:r><a:t>Hel</a:t></a:r><a:r><a:t>lo</a:t></a:r></a:p></p:txBody>
              </p:sp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        match &shapes[0].kind {
            ShapeKind::TextFrame(text) => assert_eq!(text, "Hello"),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_picture_shape() {
        let xml = r#"
            <p:spTree>
              <p:pic>
                <p:spPr><a:xfrm><a:off x="10" y="20"/><a:ext cx="30" cy="40"/></a:xfrm></p:spPr>
              </p:pic>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert!(matches!(shapes[0].kind, ShapeKind::Picture));
        assert_eq!(shapes[0].left, 10.0);
    }

    #[test]
    fn test_group_keeps_relative_child_coordinates() {
        let xml = r#"
            <p:spTree>
              <p:grpSp>
                <p:grpSpPr><a:xfrm><a:off x="1000" y="2000"/><a:ext cx="5000" cy="5000"/></a:xfrm></p:grpSpPr>
                <p:sp>
                  <p:spPr><a:xfrm><a:off x="10" y="20"/><a:ext cx="30" cy="40"/></a:xfrm></p:spPr>
                  <p:txBody><a:p><a:r><a:t>child</a:t></a:r></a:p></p:txBody>
                </p:sp>
              </p:grpSp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].left, 1000.0);
        assert_eq!(shapes[0].top, 2000.0);

        match &shapes[0].kind {
            ShapeKind::Group(children) => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].left, 10.0);
                assert_eq!(children[0].top, 20.0);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_groups() {
        let xml = r#"
            <p:spTree>
              <p:grpSp>
                <p:grpSpPr><a:xfrm><a:off x="100" y="100"/></a:xfrm></p:grpSpPr>
                <p:grpSp>
                  <p:grpSpPr><a:xfrm><a:off x="10" y="10"/></a:xfrm></p:grpSpPr>
                  <p:sp><p:txBody><a:p><a:r><a:t>leaf</a:t></a:r></a:p></p:txBody></p:sp>
                </p:grpSp>
              </p:grpSp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        let ShapeKind::Group(outer) = &shapes[0].kind else {
            panic!("expected outer group");
        };
        let ShapeKind::Group(inner) = &outer[0].kind else {
            panic!("expected inner group");
        };
        assert!(matches!(&inner[0].kind, ShapeKind::TextFrame(t) if t == "leaf"));
    }

    #[test]
    fn test_table_cells_row_major() {
        let xml = r#"
            <p:spTree>
              <p:graphicFrame>
                <p:xfrm><a:off x="50" y="60"/><a:ext cx="400" cy="200"/></p:xfrm>
                <a:graphic><a:graphicData>
                  <a:tbl>
                    <a:tr>
                      <a:tc><a:txBody><a:p><a:r><a:t>a</a:t></a:r></a:p></a:txBody></a:tc>
                      <a:tc><a:txBody><a:p><a:r><a:t>b</a:t></a:r></a:p></a:txBody></a:tc>
                    </a:tr>
                    <a:tr>
                      <a:tc><a:txBody><a:p><a:r><a:t>c</a:t></a:r></a:p></a:txBody></a:tc>
                      <a:tc><a:txBody></a:txBody></a:tc>
                    </a:tr>
                  </a:tbl>
                </a:graphicData></a:graphic>
              </p:graphicFrame>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].left, 50.0);

        match &shapes[0].kind {
            ShapeKind::Table(rows) => {
                assert_eq!(
                    rows,
                    &vec![
                        vec!["a".to_string(), "b".to_string()],
                        vec!["c".to_string(), "".to_string()],
                    ]
                );
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_graphic_frame_without_table_is_other() {
        let xml = r#"
            <p:spTree>
              <p:graphicFrame>
                <p:xfrm><a:off x="1" y="2"/></p:xfrm>
                <a:graphic><a:graphicData><c:chart/></a:graphicData></a:graphic>
              </p:graphicFrame>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert!(matches!(shapes[0].kind, ShapeKind::Other));
    }

    #[test]
    fn test_connector_transform_does_not_leak_into_group() {
        let xml = r#"
            <p:spTree>
              <p:grpSp>
                <p:grpSpPr><a:xfrm><a:off x="100" y="100"/></a:xfrm></p:grpSpPr>
                <p:cxnSp>
                  <p:spPr><a:xfrm><a:off x="9999" y="9999"/></a:xfrm></p:spPr>
                </p:cxnSp>
              </p:grpSp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes[0].left, 100.0);
        assert_eq!(shapes[0].top, 100.0);

        match &shapes[0].kind {
            ShapeKind::Group(children) => {
                assert!(matches!(children[0].kind, ShapeKind::Other));
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_sp_tree_transform_is_ignored() {
        // The spTree carries its own xfrm; with no shape open it must not
        // end up anywhere.
        let xml = r#"
            <p:spTree>
              <p:grpSpPr><a:xfrm><a:off x="7" y="7"/></a:xfrm></p:grpSpPr>
              <p:sp><p:txBody><a:p><a:r><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes[0].left, 0.0);
        assert_eq!(shapes[0].top, 0.0);
    }

    #[test]
    fn test_shape_without_transform_defaults_to_origin_unknown_extent() {
        let xml = r#"
            <p:spTree>
              <p:sp><p:txBody><a:p><a:r><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>
            </p:spTree>"#;

        let shapes = extract_shape_tree(xml).unwrap();
        assert_eq!(shapes[0].left, 0.0);
        assert_eq!(shapes[0].width, None);
        assert_eq!(shapes[0].height, None);
    }
}
