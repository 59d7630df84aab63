use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::candidates::normalizer::{list_candidates, Page, DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::errors::AppError;
use crate::models::candidate::CanonicalCandidate;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    fn into_page(self) -> Result<Page, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        let offset = self.offset.unwrap_or(DEFAULT_OFFSET);
        if limit < 0 {
            return Err(AppError::Validation(format!(
                "limit must not be negative (got {limit})"
            )));
        }
        if offset < 0 {
            return Err(AppError::Validation(format!(
                "offset must not be negative (got {offset})"
            )));
        }
        Ok(Page { limit, offset })
    }
}

/// GET /api/all-candidates
pub async fn handle_all_candidates(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<CanonicalCandidate>>, AppError> {
    let page = query.into_page()?;
    let candidates =
        list_candidates(state.fetcher.as_ref(), &state.config.candidate_view, page).await?;
    Ok(Json(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_uses_defaults() {
        assert_eq!(PageQuery::default().into_page().unwrap(), Page::default());
    }

    #[test]
    fn test_negative_values_rejected() {
        let bad_limit = PageQuery {
            limit: Some(-1),
            offset: None,
        };
        assert!(matches!(bad_limit.into_page(), Err(AppError::Validation(_))));

        let bad_offset = PageQuery {
            limit: None,
            offset: Some(-5),
        };
        assert!(matches!(bad_offset.into_page(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_no_upper_bound_on_limit() {
        let page = PageQuery {
            limit: Some(100_000),
            offset: Some(0),
        }
        .into_page()
        .unwrap();
        assert_eq!(page.limit, 100_000);
    }
}
