//! Candidate normalization: maps rows of the candidate view, whose column names
//! have drifted over time, onto the fixed [`CanonicalCandidate`] shape.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::candidates::format::{
    format_grade_display, format_skills, parse_availability, to_text, truncate_float,
};
use crate::db::{QueryParams, RowFetcher};
use crate::errors::AppError;
use crate::models::candidate::{CanonicalCandidate, RawRow};

pub const DEFAULT_LIMIT: i64 = 500;
pub const DEFAULT_OFFSET: i64 = 0;

// Fallback columns, most preferred first.
const NAME_COLUMNS: &[&str] = &["full_name", "user_name", "name"];
const SKILLS_COLUMNS: &[&str] = &["skills", "key_qualifications", "technologies"];
const AVAILABILITY_COLUMNS: &[&str] = &[
    "avg_availability_30d",
    "availability",
    "latest_percent_available",
];
const CPD_COLUMNS: &[&str] = &["cpd_label", "cpd", "cpd_level"];
const SFIA_COLUMNS: &[&str] = &["sfia_level", "sfia"];
const DEPARTMENT_COLUMNS: &[&str] = &["department", "grade", "job_grade", "level"];
const EMAIL_COLUMNS: &[&str] = &["email", "user_email"];
const COUNTRY_COLUMNS: &[&str] = &["country", "location", "city", "region"];
const CV_TITLE_COLUMNS: &[&str] = &["latest_cv_title", "cv_title"];
const CLEARANCE_COLUMNS: &[&str] = &["clearance", "sc_clearance", "security_clearance"];

/// A window into the candidate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// `view` is interpolated, so it must already be a validated identifier
/// (see `Config::from_lookup`). Paging values are always bound.
pub fn build_list_query(view: &str) -> String {
    format!("SELECT * FROM {view} LIMIT :limit OFFSET :offset")
}

/// Fetches one page of the candidate view and normalizes every row.
///
/// Fetch errors propagate unchanged; no partial list is ever returned.
pub async fn list_candidates(
    fetcher: &dyn RowFetcher,
    view: &str,
    page: Page,
) -> Result<Vec<CanonicalCandidate>, AppError> {
    let sql = build_list_query(view);
    let mut params = QueryParams::new();
    params.insert("limit".into(), json!(page.limit));
    params.insert("offset".into(), json!(page.offset));

    let rows = fetcher.fetch(&sql, &params).await?;
    info!(
        limit = page.limit,
        offset = page.offset,
        rows = rows.len(),
        "Fetched candidate rows"
    );

    Ok(rows.iter().map(normalize_row).collect())
}

/// Resolves one raw row into a canonical candidate. Never fails; fields that
/// cannot be resolved or parsed come out as `None` (or `0` for availability).
pub fn normalize_row(row: &RawRow) -> CanonicalCandidate {
    let name = row.pick(NAME_COLUMNS).and_then(to_text);
    let department = format_grade_display(
        row.pick(CPD_COLUMNS),
        row.pick(SFIA_COLUMNS),
        row.pick(DEPARTMENT_COLUMNS),
    );

    let candidate = CanonicalCandidate {
        user_id: row.get("user_id").and_then(user_id),
        full_name: name.clone(),
        user_name: name,
        email: row.pick(EMAIL_COLUMNS).and_then(to_text),
        department,
        country: row.pick(COUNTRY_COLUMNS).and_then(to_text),
        latest_cv_title: row.pick(CV_TITLE_COLUMNS).and_then(to_text),
        skills: format_skills(row.pick(SKILLS_COLUMNS)),
        availability: parse_availability(row.pick(AVAILABILITY_COLUMNS)),
        clearance: row.pick(CLEARANCE_COLUMNS).and_then(to_text),
    };

    if candidate.user_id.is_none() {
        debug!("Candidate row without a usable user_id");
    }
    candidate
}

/// Integers pass through; integral floats and integer strings are converted.
/// Any other id (fractional, out of range, non-numeric text) becomes null.
fn user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(truncate_float)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
