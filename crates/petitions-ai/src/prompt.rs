//! Request wording and response parsing for environmental classification.

use petitions_core::ClassificationResult;
use serde::Deserialize;

const INSTRUCTIONS: &str = "\
Evaluate, from the text of a list of petitions made to the UK Parliament, whether each one is environmental in nature.
Environmental petitions are those related to climate change, net zero, carbon emissions, air pollution, water pollution, wildlife, ecology, forests, hunting, active travel, cycling, footpaths, etc.
The input is a JSON encoded list of strings.
Return a JSON list with one object per input item, in the same order, each with the structure {\"result\": bool, \"explanation\": str, \"stub\": str (first ten characters of the petition)}.
JSON bools are true and false, not True and False.
The input and the output must have the same length.

Petition names:
";

const OUTPUT_MARKER: &str = "\n\nOutput:\n";

#[derive(Deserialize)]
struct ResponseItem {
    result: bool,
    explanation: String,
}

/// The request text for one batch: instructions, the batch as a JSON array,
/// and an output cue.
pub fn build_prompt(batch: &[&str]) -> String {
    // Serializing a slice of &str cannot fail.
    let list = serde_json::to_string(batch).unwrap_or_else(|_| "[]".to_string());
    format!("{INSTRUCTIONS}{list}{OUTPUT_MARKER}")
}

/// Strip a Markdown code fence around a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a service reply into exactly `expected` verdicts, or describe why it
/// is unusable.
pub fn parse_response(raw: &str, expected: usize) -> Result<Vec<ClassificationResult>, String> {
    let items: Vec<ResponseItem> =
        serde_json::from_str(strip_code_blocks(raw)).map_err(|e| format!("invalid JSON: {e}"))?;
    if items.len() != expected {
        return Err(format!("expected {expected} results, got {}", items.len()));
    }
    Ok(items
        .into_iter()
        .map(|item| ClassificationResult {
            is_environmental: item.result,
            explanation: item.explanation,
        })
        .collect())
}

/// The batch a prompt built by [`build_prompt`] carries.
#[cfg(test)]
pub(crate) fn batch_in_prompt(prompt: &str) -> Vec<String> {
    let list = prompt
        .strip_prefix(INSTRUCTIONS)
        .and_then(|rest| rest.strip_suffix(OUTPUT_MARKER))
        .unwrap_or("[]");
    serde_json::from_str(list).unwrap_or_default()
}
