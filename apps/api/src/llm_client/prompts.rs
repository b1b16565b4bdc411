// Prompt constants and builders for the ai-edit flow.

use crate::document::ResumeData;
use crate::llm_client::LlmError;

/// System prompt for the edit flow: JSON-only, path-edit output.
pub const EDIT_SYSTEM: &str = "You are an expert resume editor. \
    You MUST respond with a valid JSON array only. \
    Each element is an object {\"path\": string, \"value\": any} describing \
    one edit to the resume document, where path uses dot/bracket notation \
    such as `basics.headline` or `sections.experience.items[0].summary`. \
    Never change item `id` fields, `metadata.layout`, or whole sections. \
    Do NOT use markdown code fences. \
    Do NOT include explanations.";

/// Builds the user prompt: the instruction plus the current document.
pub fn build_edit_prompt(data: &ResumeData, instruction: &str) -> Result<String, LlmError> {
    let document = serde_json::to_string_pretty(data)?;
    Ok(format!(
        "Instruction:\n{instruction}\n\nCurrent resume document:\n{document}\n\n\
         Return the minimal list of path edits that carries out the instruction."
    ))
}
