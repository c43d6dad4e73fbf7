//! Prompt construction for the comparison completion.
//!
//! The prompt pins the exact JSON output schema (six fixed rows plus a recap),
//! embeds every option verbatim, and states the behavioral rules the schema
//! validator later relies on.

use crate::types::{ComparisonOption, NO_CLEAR_WINNER, PLACEHOLDER, RowName};

/// Build the single user-role instruction sent to the completion API.
pub fn build_prompt(options: &[ComparisonOption]) -> String {
    let count = options.len();
    let row_list = RowName::ALL
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let names = options
        .iter()
        .map(|o| serde_json::Value::from(o.name.as_str()).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let rows_example = RowName::ALL
        .iter()
        .map(|r| {
            format!(
                "    {{\"attribute\": \"{}\", \"values\": [{}]}}",
                r.as_str(),
                vec!["[\"...\"]"; count].join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let options_block = options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("Option {} — {}:\n{}", i + 1, o.name, o.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a formatting engine. Build a clean side-by-side comparison table and a short recap.

Return ONLY valid JSON (no code fences, no commentary) in this exact shape:
{{
  "rows": [
{rows_example}
  ],
  "recap": {{
    "bottomLine": "one sentence",
    "suggestion": "<option name or {NO_CLEAR_WINNER}>",
    "confidence": "low | medium | high",
    "why": ["..."],
    "keyDifferences": ["..."]
  }}
}}

Rules:
- rows must be exactly, in this order: {row_list}
- every "values" array must have exactly {count} entries, one per option, in the order given below
- each entry is an array of short bullet-style phrases (no line breaks inside a phrase)
- if something is unknown or not stated, use ["{PLACEHOLDER}"]
- Do NOT invent facts. Use only the text provided for each option.
- "suggestion" must be exactly one of {names}, or "{NO_CLEAR_WINNER}"
- if the better choice is ambiguous from the provided text alone, set "suggestion" to "{NO_CLEAR_WINNER}" and "confidence" to "low"

OPTIONS ({count}):
{options_block}"#
    )
}
