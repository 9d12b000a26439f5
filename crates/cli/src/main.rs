//! CLI tool for converting presentation slides to HTML fragments.

use anyhow::{Context, Result};
use clap::Parser;
use slidegen_core::{
    ConvertOptions, GenerationRequest, NullTrace, RuleStore, SlideConverter, SlideRange, TraceSink,
};
use slidegen_openai::OpenAiClient;
use slidegen_pptx::PptxParser;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Convert a slide range from a .pptx file into an HTML fragment.
#[derive(Parser, Debug)]
#[command(name = "slidegen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input presentation (.pptx)
    input: PathBuf,

    /// First slide of the range (1-based, inclusive)
    #[arg(short, long)]
    start: usize,

    /// Last slide of the range (1-based, inclusive)
    #[arg(short, long)]
    end: usize,

    /// Page title, used for boilerplate filtering and template substitution
    #[arg(short, long)]
    title: String,

    /// Explicit part name (repeatable); omit to auto-match from slide text
    #[arg(long = "part")]
    parts: Vec<String>,

    /// Output base name, used for file naming and the image-naming directive
    #[arg(long)]
    output_name: Option<String>,

    /// Directory holding rules.txt, parts_list.json, and part rule files
    #[arg(long, default_value = "rules")]
    rules_dir: PathBuf,

    /// HTML template with {contents} and {pagettl} placeholders
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result to stdout instead of writing a file
    #[arg(short, long)]
    print: bool,

    /// Directory for diagnostic traces (disabled when omitted)
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Generation model override
    #[arg(long)]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY is not set; the generation service needs it")?;

    let range = SlideRange::new(args.start, args.end)?;

    ensure_pptx(&args.input)?;
    log::debug!("Parsing {}", args.input.display());
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let presentation = PptxParser::new()
        .parse(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    if args.verbose {
        eprintln!("  Found {} slides", presentation.slide_count());
    }

    let store = RuleStore::new(&args.rules_dir);

    let mut client = OpenAiClient::new(api_key);
    if let Some(model) = &args.model {
        client = client.with_model(model.clone());
    }

    let options = ConvertOptions {
        parts: if args.parts.is_empty() {
            None
        } else {
            Some(args.parts.clone())
        },
        output_name: args.output_name.clone(),
    };

    let mut trace: Box<dyn TraceSink> = match &args.debug_dir {
        Some(dir) => Box::new(FileTrace::create(dir)?),
        None => Box::new(NullTrace),
    };

    let fragment = SlideConverter::new().convert(
        &presentation,
        range,
        &args.title,
        &options,
        &store,
        &client,
        trace.as_mut(),
    )?;

    let result = match &args.template {
        Some(path) => {
            let template = fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            template
                .replace("{contents}", &fragment)
                .replace("{pagettl}", &args.title)
        }
        None => fragment,
    };

    if args.print {
        print!("{}", result);
    } else {
        let output_path = output_path(&args.input, args.output_name.as_deref(), args.output.as_ref())?;
        write_output(&output_path, &result)?;
        println!("Written to: {}", output_path.display());
    }

    Ok(())
}

/// Reject inputs that are not ZIP containers before parsing.
fn ensure_pptx(path: &Path) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .with_context(|| "Failed to read file header")?;

    // PPTX is a ZIP file (PK\x03\x04)
    if magic != [0x50, 0x4B, 0x03, 0x04] {
        anyhow::bail!("{} is not a .pptx file", path.display());
    }

    Ok(())
}

/// Determine the output path for the generated HTML.
fn output_path(
    input_path: &Path,
    output_name: Option<&str>,
    output_dir: Option<&PathBuf>,
) -> Result<PathBuf> {
    let stem = output_name.map(|n| n.to_string()).unwrap_or_else(|| {
        input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    });

    let output_filename = format!("{}.html", stem);

    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

/// File-backed diagnostic sink: traversal notes, the extracted text list,
/// and the exact generation request/response land in the debug directory.
struct FileTrace {
    notes: File,
    dir: PathBuf,
}

impl FileTrace {
    fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;
        let notes = File::create(dir.join("trace.txt"))
            .with_context(|| "Failed to create trace.txt")?;

        Ok(Self {
            notes,
            dir: dir.to_path_buf(),
        })
    }
}

impl TraceSink for FileTrace {
    fn note(&mut self, line: &str) {
        // Observational only; a failed write never disturbs the pipeline.
        let _ = writeln!(self.notes, "{}", line);
    }

    fn extracted(&mut self, texts: &[String]) {
        let rendered = serde_json::to_string_pretty(texts).unwrap_or_default();
        let _ = fs::write(self.dir.join("extracted.json"), rendered);
    }

    fn request(&mut self, request: &GenerationRequest) {
        let rendered = format!(
            "=== system ===\n{}\n\n=== prompt ===\n{}\n",
            request.system_instruction, request.user_prompt
        );
        let _ = fs::write(self.dir.join("request.txt"), rendered);
    }

    fn response(&mut self, response: &str) {
        let _ = fs::write(self.dir.join("response.txt"), response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_prefers_output_name() {
        let path = output_path(Path::new("decks/site.pptx"), Some("dayservice"), None).unwrap();
        assert_eq!(path, Path::new("decks/dayservice.html"));
    }

    #[test]
    fn test_output_path_falls_back_to_input_stem() {
        let path = output_path(Path::new("decks/site.pptx"), None, None).unwrap();
        assert_eq!(path, Path::new("decks/site.html"));
    }

    #[test]
    fn test_output_path_uses_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let path = output_path(Path::new("site.pptx"), None, Some(&out)).unwrap();
        assert_eq!(path, out.join("site.html"));
        assert!(out.is_dir());
    }

    #[test]
    fn test_file_trace_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut trace = FileTrace::create(dir.path()).unwrap();

        trace.note("shape seen");
        trace.extracted(&["a".to_string(), "b".to_string()]);
        trace.response("<div/>");

        let notes = fs::read_to_string(dir.path().join("trace.txt")).unwrap();
        assert!(notes.contains("shape seen"));

        let extracted = fs::read_to_string(dir.path().join("extracted.json")).unwrap();
        assert!(extracted.contains("\"a\""));

        assert_eq!(
            fs::read_to_string(dir.path().join("response.txt")).unwrap(),
            "<div/>"
        );
    }

    #[test]
    fn test_ensure_pptx_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_deck.pptx");
        fs::write(&path, b"plain text").unwrap();

        assert!(ensure_pptx(&path).is_err());
    }
}
