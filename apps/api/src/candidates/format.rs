//! Formatting rules that turn loosely typed view values into display fields.
//!
//! Every function here is total: malformed input degrades to `None` or `0`,
//! never to an error, so one bad column cannot drop a candidate.

use serde_json::Value;

const SKILL_SEPARATOR: &str = ", ";

/// Loose truthiness: null, `false`, zero, and empty strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Display form of a value. Strings are returned verbatim; arrays and objects
/// become compact JSON.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Normalizes a skills column to `"A, B, C"`.
///
/// Accepts a native array, a JSON-encoded array string, or plain text. A
/// bracketed string that is not valid JSON falls back to stripping the outer
/// brackets and every quote character.
pub fn format_skills(raw: Option<&Value>) -> Option<String> {
    let raw = raw.filter(|v| !v.is_null())?;

    if let Value::Array(items) = raw {
        return Some(join_skills(items));
    }

    let text = to_text(raw)?;
    let text = text.trim();
    if !looks_like_list(text) {
        return Some(text.to_string());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(join_skills(&items)),
        Ok(_) => Some(text.to_string()),
        Err(_) => Some(
            text.trim_matches(|c: char| c == '[' || c == ']')
                .chars()
                .filter(|c| *c != '"' && *c != '\'')
                .collect(),
        ),
    }
}

/// `[...]`, or an opening bracket whose closing one was lost to truncation
/// upstream. Text such as `[Lead] Python` is prose, not a list.
fn looks_like_list(text: &str) -> bool {
    text.starts_with('[') && (text.ends_with(']') || !text.contains(']'))
}

fn join_skills(items: &[Value]) -> String {
    items
        .iter()
        .filter(|item| is_truthy(item))
        .filter_map(to_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(SKILL_SEPARATOR)
}

/// Parses an availability percentage. Tries integer, then float truncated
/// toward zero; anything else is `0`. Not clamped to 0–100.
pub fn parse_availability(raw: Option<&Value>) -> i64 {
    match raw {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(b)) => i64::from(*b),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate_float))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_float))
                .unwrap_or(0)
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => 0,
    }
}

pub(crate) fn truncate_float(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX is not exactly representable; the upper bound must be exclusive.
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Combines the CPD and SFIA gradings into a single label, falling back to
/// the department when neither is set.
pub fn format_grade_display(
    cpd: Option<&Value>,
    sfia: Option<&Value>,
    department: Option<&Value>,
) -> Option<String> {
    let cpd = cpd.filter(|v| is_truthy(v)).and_then(to_text);
    let sfia = sfia.filter(|v| is_truthy(v)).and_then(to_text);

    match (cpd, sfia) {
        (Some(cpd), Some(sfia)) => Some(format!("{cpd} / SFIA{sfia}")),
        (Some(cpd), None) => Some(cpd),
        (None, Some(sfia)) => Some(format!("SFIA{sfia}")),
        (None, None) => department.and_then(to_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skills(v: Value) -> Option<String> {
        format_skills(Some(&v))
    }

    #[test]
    fn test_skills_null_is_null() {
        assert_eq!(format_skills(None), None);
        assert_eq!(skills(Value::Null), None);
    }

    #[test]
    fn test_skills_array_trims_and_skips_empty() {
        assert_eq!(
            skills(json!(["Python", "  Go  ", "", null])),
            Some("Python, Go".to_string())
        );
    }

    #[test]
    fn test_skills_array_skips_falsy_non_strings() {
        assert_eq!(skills(json!([0, 3, false, "Rust"])), Some("3, Rust".to_string()));
    }

    #[test]
    fn test_skills_json_encoded_array() {
        assert_eq!(
            skills(json!(r#"["React","TypeScript"]"#)),
            Some("React, TypeScript".to_string())
        );
    }

    #[test]
    fn test_skills_json_array_with_padding_around_brackets() {
        assert_eq!(
            skills(json!(r#"  [" SQL ", "dbt"]  "#)),
            Some("SQL, dbt".to_string())
        );
    }

    #[test]
    fn test_skills_bad_json_falls_back_to_stripping() {
        assert_eq!(skills(json!("[bad json")), Some("bad json".to_string()));
    }

    #[test]
    fn test_skills_single_quoted_list_falls_back_to_stripping() {
        assert_eq!(
            skills(json!("['Java', 'Spring']")),
            Some("Java, Spring".to_string())
        );
    }

    #[test]
    fn test_skills_closing_bracket_alone_is_plain_text() {
        assert_eq!(
            skills(json!("C++ [advanced]")),
            Some("C++ [advanced]".to_string())
        );
    }

    #[test]
    fn test_skills_inner_closing_bracket_is_plain_text() {
        assert_eq!(
            skills(json!("[Lead] Python developer")),
            Some("[Lead] Python developer".to_string())
        );
        assert_eq!(
            skills(json!(" [Lead] Python developer ")),
            Some("[Lead] Python developer".to_string())
        );
    }

    #[test]
    fn test_skills_plain_text_is_trimmed() {
        assert_eq!(
            skills(json!("  Kubernetes, Terraform ")),
            Some("Kubernetes, Terraform".to_string())
        );
    }

    #[test]
    fn test_skills_empty_json_array() {
        assert_eq!(skills(json!("[]")), Some(String::new()));
    }

    #[test]
    fn test_availability_integer_forms() {
        assert_eq!(parse_availability(Some(&json!(80))), 80);
        assert_eq!(parse_availability(Some(&json!("42"))), 42);
        assert_eq!(parse_availability(Some(&json!(" 42 "))), 42);
    }

    #[test]
    fn test_availability_truncates_floats() {
        assert_eq!(parse_availability(Some(&json!("75.9"))), 75);
        assert_eq!(parse_availability(Some(&json!(75.9))), 75);
        assert_eq!(parse_availability(Some(&json!("-2.5"))), -2);
    }

    #[test]
    fn test_availability_defaults_to_zero() {
        assert_eq!(parse_availability(None), 0);
        assert_eq!(parse_availability(Some(&Value::Null)), 0);
        assert_eq!(parse_availability(Some(&json!("n/a"))), 0);
        assert_eq!(parse_availability(Some(&json!("inf"))), 0);
        assert_eq!(parse_availability(Some(&json!([50]))), 0);
    }

    #[test]
    fn test_availability_is_not_clamped() {
        assert_eq!(parse_availability(Some(&json!(140))), 140);
        assert_eq!(parse_availability(Some(&json!("-10"))), -10);
    }

    #[test]
    fn test_availability_from_bool() {
        assert_eq!(parse_availability(Some(&json!(true))), 1);
        assert_eq!(parse_availability(Some(&json!(false))), 0);
    }

    #[test]
    fn test_grade_cpd_and_sfia() {
        assert_eq!(
            format_grade_display(Some(&json!("Senior")), Some(&json!("5")), Some(&json!("Eng"))),
            Some("Senior / SFIA5".to_string())
        );
    }

    #[test]
    fn test_grade_sfia_only() {
        assert_eq!(
            format_grade_display(None, Some(&json!("4")), Some(&json!("Eng"))),
            Some("SFIA4".to_string())
        );
        assert_eq!(
            format_grade_display(Some(&json!("")), Some(&json!(4)), None),
            Some("SFIA4".to_string())
        );
    }

    #[test]
    fn test_grade_cpd_only() {
        assert_eq!(
            format_grade_display(Some(&json!("Consultant")), None, Some(&json!("Eng"))),
            Some("Consultant".to_string())
        );
    }

    #[test]
    fn test_grade_falls_back_to_department() {
        assert_eq!(
            format_grade_display(None, None, Some(&json!("Eng"))),
            Some("Eng".to_string())
        );
        assert_eq!(format_grade_display(None, Some(&json!(0)), None), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!(" ")));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_to_text_forms() {
        assert_eq!(to_text(&json!("x")), Some("x".to_string()));
        assert_eq!(to_text(&json!(12)), Some("12".to_string()));
        assert_eq!(to_text(&json!(true)), Some("true".to_string()));
        assert_eq!(to_text(&json!(["a"])), Some(r#"["a"]"#.to_string()));
        assert_eq!(to_text(&Value::Null), None);
    }
}
