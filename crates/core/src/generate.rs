//! Classification dispatch: ruleset composition, request building, and the
//! generation-service seam.
//!
//! The dispatcher does not parse, validate, or retry; the service response
//! is returned verbatim (trimmed) and failures propagate unchanged.

use serde::Serialize;

use crate::error::Result;
use crate::trace::TraceSink;

/// Fixed system instruction for the generation service.
pub const SYSTEM_INSTRUCTION: &str =
    "あなたはパワーポイントスライドをHTML断片に変換するアシスタントです。";

/// One request to the generation service.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// System-level instruction establishing the assistant role.
    pub system_instruction: String,

    /// The composed ruleset plus the extracted text list.
    pub user_prompt: String,
}

/// The external text-generation service.
///
/// One synchronous call, treated as an opaque black box: no schema is
/// assumed on the output beyond "is text".
pub trait Generator {
    /// Send the request and return the raw response text.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Compose the full ruleset: base rules, then each matched part's rules
/// each preceded by a newline separator, then the image-naming directive
/// when an output base name is supplied.
pub fn compose_ruleset(base_rules: &str, part_rules: &[String], output_name: Option<&str>) -> String {
    let mut ruleset = base_rules.to_string();

    for rule in part_rules {
        if !rule.is_empty() {
            ruleset.push('\n');
            ruleset.push_str(rule);
        }
    }

    if let Some(name) = output_name {
        ruleset.push_str(&format!(
            "\n\n【画像ファイル名の設定】\n- output_filename = {name}\n- 画像ファイル名は「{{output_filename}}_img{{連番}}.jpg」の形式を使用してください。"
        ));
    }

    ruleset
}

/// Build the request payload from the ordered text list and the ruleset.
///
/// The text list is rendered as a JSON array so the prompt is deterministic
/// for identical input.
pub fn build_request(texts: &[String], ruleset: &str) -> Result<GenerationRequest> {
    let list = serde_json::to_string(texts)?;

    let user_prompt = format!(
        "{ruleset}\n\nスライドの要素リスト：\n{list}\n\n上記の内容をもとに、ルールに従ってHTML断片を生成してください。"
    );

    Ok(GenerationRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_prompt,
    })
}

/// Dispatch the extracted texts to the generation service and return its
/// response trimmed.
pub fn classify(
    texts: &[String],
    ruleset: &str,
    generator: &dyn Generator,
    trace: &mut dyn TraceSink,
) -> Result<String> {
    let request = build_request(texts, ruleset)?;
    trace.request(&request);

    let response = generator.generate(&request)?;
    let response = response.trim().to_string();
    trace.response(&response);

    Ok(response)
}
