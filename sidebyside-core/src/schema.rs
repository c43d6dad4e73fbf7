//! Validation of the model's completion against the comparison schema.
//!
//! The completion is untrusted: it must be a JSON object with a `rows` array
//! naming only the six fixed attributes (each at most once) and with no more
//! cells than submitted options, plus an optional `recap` whose suggestion and
//! confidence are members of their allowed sets. Anything else is a
//! [`SchemaError`]. Short or missing rows are allowed; the renderer fills
//! them with placeholders.

use crate::error::SchemaError;
use crate::types::{
    Cell, ComparisonOption, ComparisonResult, Confidence, NO_CLEAR_WINNER, PLACEHOLDER, Recap,
    RowName, Suggestion,
};
use serde_json::{Map, Value};

/// Parse and validate completion content for the given options.
pub fn parse_completion(
    content: &str,
    options: &[ComparisonOption],
) -> Result<ComparisonResult, SchemaError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(content)).map_err(|e| SchemaError::NotJson {
            message: e.to_string(),
        })?;

    let obj = value.as_object().ok_or(SchemaError::MissingRows)?;
    let rows = obj
        .get("rows")
        .and_then(Value::as_array)
        .ok_or(SchemaError::MissingRows)?;

    let mut result = ComparisonResult::default();
    for (index, row) in rows.iter().enumerate() {
        let (name, cells) = parse_row(index, row, options.len())?;
        if result.rows.insert(name, cells).is_some() {
            return Err(SchemaError::DuplicateRow {
                attribute: name.as_str().to_string(),
            });
        }
    }

    result.recap = match obj.get("recap") {
        None | Some(Value::Null) => None,
        Some(Value::Object(recap)) => Some(parse_recap(recap, options)?),
        Some(_) => return Err(SchemaError::MalformedRecap { field: "recap" }),
    };

    Ok(result)
}

/// Remove a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_row(
    index: usize,
    row: &Value,
    option_count: usize,
) -> Result<(RowName, Vec<Cell>), SchemaError> {
    let attribute = row
        .get("attribute")
        .and_then(Value::as_str)
        .ok_or(SchemaError::MalformedRow { index })?;
    let name = RowName::from_attribute(attribute).ok_or_else(|| SchemaError::UnknownRow {
        attribute: attribute.to_string(),
    })?;

    let values = match row.get("values") {
        None | Some(Value::Null) => return Ok((name, Vec::new())),
        Some(Value::Array(values)) => values,
        Some(_) => return Err(SchemaError::MalformedRow { index }),
    };
    if values.len() > option_count {
        return Err(SchemaError::TooManyValues {
            attribute: attribute.to_string(),
            actual: values.len(),
            expected: option_count,
        });
    }

    let cells = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            parse_cell(v).ok_or_else(|| SchemaError::InvalidCell {
                attribute: attribute.to_string(),
                index: i,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name, cells))
}

/// A cell is an array of phrases, a single `"; "`-separated string, or null.
fn parse_cell(value: &Value) -> Option<Cell> {
    let phrases: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(';').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(
        phrases
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && p != PLACEHOLDER)
            .collect(),
    )
}

fn parse_recap(
    recap: &Map<String, Value>,
    options: &[ComparisonOption],
) -> Result<Recap, SchemaError> {
    let bottom_line = match recap.get("bottomLine") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(_) => return Err(SchemaError::MalformedRecap { field: "bottomLine" }),
    };

    let raw_suggestion = recap
        .get("suggestion")
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or(SchemaError::MalformedRecap { field: "suggestion" })?;
    // An exact option name wins over the fallback phrase.
    let suggestion = if options.iter().any(|o| o.name == raw_suggestion) {
        Suggestion::Option(raw_suggestion.to_string())
    } else if raw_suggestion.eq_ignore_ascii_case(NO_CLEAR_WINNER) {
        Suggestion::NoClearWinner
    } else {
        return Err(SchemaError::UnknownSuggestion {
            value: raw_suggestion.to_string(),
        });
    };

    let raw_confidence = recap
        .get("confidence")
        .and_then(Value::as_str)
        .ok_or(SchemaError::MalformedRecap { field: "confidence" })?;
    let mut confidence = Confidence::parse(&raw_confidence.trim().to_ascii_lowercase())
        .ok_or_else(|| SchemaError::InvalidConfidence {
            value: raw_confidence.to_string(),
        })?;
    // The fallback suggestion always carries low confidence.
    if suggestion == Suggestion::NoClearWinner {
        confidence = Confidence::Low;
    }

    Ok(Recap {
        bottom_line,
        suggestion,
        confidence,
        why: phrase_list(recap, "why")?,
        key_differences: phrase_list(recap, "keyDifferences")?,
    })
}

fn phrase_list(recap: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, SchemaError> {
    match recap.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or(SchemaError::MalformedRecap { field })
            })
            .filter(|p| p.as_ref().map_or(true, |s| !s.is_empty()))
            .collect(),
        Some(_) => Err(SchemaError::MalformedRecap { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn opts(names: &[&str]) -> Vec<ComparisonOption> {
        names
            .iter()
            .map(|n| ComparisonOption {
                name: n.to_string(),
                text: format!("{n} text"),
                url: None,
            })
            .collect()
    }

    #[test]
    fn test_parse_full_payload() {
        let content = json!({
            "rows": [
                {"attribute": "Pros", "values": [["cheap", "fast"], ["durable"]]},
                {"attribute": "Core Use Case", "values": ["commuting; errands", ["—"]]}
            ],
            "recap": {
                "bottomLine": "A for speed.",
                "suggestion": "A",
                "confidence": "medium",
                "why": ["faster"],
                "keyDifferences": ["speed vs durability"]
            }
        })
        .to_string();

        let result = parse_completion(&content, &opts(&["A", "B"])).unwrap();
        assert_eq!(
            result.rows[&RowName::Pros],
            vec![vec!["cheap".to_string(), "fast".into()], vec!["durable".into()]]
        );
        assert_eq!(
            result.rows[&RowName::CoreUseCase],
            vec![vec!["commuting".to_string(), "errands".into()], vec![]]
        );
        let recap = result.recap.unwrap();
        assert_eq!(recap.suggestion, Suggestion::Option("A".into()));
        assert_eq!(recap.confidence, Confidence::Medium);
        assert_eq!(recap.bottom_line.as_deref(), Some("A for speed."));
        assert_eq!(recap.key_differences, vec!["speed vs durability".to_string()]);
    }

    #[test]
    fn test_option_named_like_fallback_can_be_suggested() {
        let content = json!({
            "rows": [],
            "recap": {"suggestion": "No Clear Winner", "confidence": "high"}
        })
        .to_string();
        let recap = parse_completion(&content, &opts(&["No Clear Winner", "B"]))
            .unwrap()
            .recap
            .unwrap();
        assert_eq!(recap.suggestion, Suggestion::Option("No Clear Winner".into()));
        assert_eq!(recap.confidence, Confidence::High);

        // Without such an option the phrase is still the fallback.
        let recap = parse_completion(&content, &opts(&["A", "B"]))
            .unwrap()
            .recap
            .unwrap();
        assert_eq!(recap.suggestion, Suggestion::NoClearWinner);
        assert_eq!(recap.confidence, Confidence::Low);
    }

    #[test]
    fn test_short_and_missing_rows_allowed() {
        let content = r#"{"rows": [{"attribute": "Cons", "values": [["pricey"]]}]}"#;
        let result = parse_completion(content, &opts(&["A", "B", "C"])).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(result.cell(RowName::Cons, 1).is_none());
        assert!(result.recap.is_none());
    }

    #[test]
    fn test_code_fence_stripped() {
        let content = "```json\n{\"rows\": []}\n```";
        assert!(parse_completion(content, &opts(&["A", "B"])).is_ok());
    }

    #[test]
    fn test_not_json() {
        let err = parse_completion("Sure! Here is your table:", &opts(&["A", "B"])).unwrap_err();
        assert!(matches!(err, SchemaError::NotJson { .. }));
    }

    #[test]
    fn test_missing_rows() {
        assert_eq!(
            parse_completion("{\"table\": []}", &opts(&["A", "B"])).unwrap_err(),
            SchemaError::MissingRows
        );
        assert_eq!(
            parse_completion("[1, 2]", &opts(&["A", "B"])).unwrap_err(),
            SchemaError::MissingRows
        );
    }

    #[test]
    fn test_unknown_row_rejected() {
        let content = r#"{"rows": [{"attribute": "Price", "values": []}]}"#;
        assert_eq!(
            parse_completion(content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::UnknownRow {
                attribute: "Price".into()
            }
        );
    }

    #[test]
    fn test_duplicate_row_rejected() {
        let content = r#"{"rows": [
            {"attribute": "Pros", "values": []},
            {"attribute": "Pros", "values": []}
        ]}"#;
        assert!(matches!(
            parse_completion(content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::DuplicateRow { .. }
        ));
    }

    #[test]
    fn test_too_many_values_rejected() {
        let content = r#"{"rows": [{"attribute": "Pros", "values": ["a", "b", "c"]}]}"#;
        assert_eq!(
            parse_completion(content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::TooManyValues {
                attribute: "Pros".into(),
                actual: 3,
                expected: 2
            }
        );
    }

    #[test]
    fn test_invalid_cell_rejected() {
        let content = r#"{"rows": [{"attribute": "Pros", "values": [42]}]}"#;
        assert!(matches!(
            parse_completion(content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::InvalidCell { index: 0, .. }
        ));
        let nested = r#"{"rows": [{"attribute": "Pros", "values": [["ok", 1]]}]}"#;
        assert!(parse_completion(nested, &opts(&["A", "B"])).is_err());
    }

    #[test]
    fn test_recap_unknown_suggestion_rejected() {
        let content = json!({
            "rows": [],
            "recap": {"suggestion": "Option Z", "confidence": "high"}
        })
        .to_string();
        assert_eq!(
            parse_completion(&content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::UnknownSuggestion {
                value: "Option Z".into()
            }
        );
    }

    #[test]
    fn test_recap_invalid_confidence_rejected() {
        let content = json!({
            "rows": [],
            "recap": {"suggestion": "A", "confidence": "certain"}
        })
        .to_string();
        assert!(matches!(
            parse_completion(&content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::InvalidConfidence { .. }
        ));
    }

    #[test]
    fn test_no_clear_winner_forces_low_confidence() {
        let content = json!({
            "rows": [],
            "recap": {"suggestion": "no clear winner", "confidence": "High"}
        })
        .to_string();
        let recap = parse_completion(&content, &opts(&["A", "B"]))
            .unwrap()
            .recap
            .unwrap();
        assert_eq!(recap.suggestion, Suggestion::NoClearWinner);
        assert_eq!(recap.confidence, Confidence::Low);
    }

    #[test]
    fn test_recap_malformed_lists() {
        let content = json!({
            "rows": [],
            "recap": {"suggestion": "A", "confidence": "low", "why": "because"}
        })
        .to_string();
        assert_eq!(
            parse_completion(&content, &opts(&["A", "B"])).unwrap_err(),
            SchemaError::MalformedRecap { field: "why" }
        );
    }
}
