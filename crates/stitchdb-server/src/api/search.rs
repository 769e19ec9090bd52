use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use stitchdb_core::Supplier;
use stitchdb_engine::{SearchQuery, SearchResults, SortMode};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub q: String,
    /// Comma-separated supplier names.
    pub suppliers: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SearchParams {
    fn into_query(self, request_id: &str) -> Result<SearchQuery, ApiError> {
        let suppliers = match &self.suppliers {
            None => None,
            Some(raw) => {
                let mut parsed = Vec::new();
                for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    let supplier = token.parse::<Supplier>().map_err(|e| {
                        ApiError::new(request_id.to_string(), "invalid_request", e)
                    })?;
                    if !parsed.contains(&supplier) {
                        parsed.push(supplier);
                    }
                }
                Some(parsed)
            }
        };
        let sort = match &self.sort {
            None => SortMode::Relevance,
            Some(raw) => raw
                .parse::<SortMode>()
                .map_err(|e| ApiError::new(request_id.to_string(), "invalid_request", e))?,
        };

        let mut query = SearchQuery::new(self.q);
        query.suppliers = suppliers;
        query.sort = sort;
        query.in_stock_only = self.in_stock;
        if let Some(limit) = self.limit {
            query.limit = limit.clamp(1, MAX_LIMIT);
        }
        query.offset = self.offset.unwrap_or(0);
        Ok(query)
    }
}

pub(super) async fn run_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchResults>>, ApiError> {
    let query = params.into_query(&req_id.0)?;
    let results = state
        .ranker
        .search(&query)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: results,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(q: &str) -> SearchParams {
        SearchParams {
            q: q.to_string(),
            suppliers: None,
            sort: None,
            in_stock: false,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn defaults_map_to_relevance_sort() {
        let query = params("PC54").into_query("req-1").unwrap();
        assert_eq!(query.query, "PC54");
        assert_eq!(query.sort, SortMode::Relevance);
        assert!(query.suppliers.is_none());
        assert_eq!(query.limit, 25);
    }

    #[test]
    fn supplier_list_parses_and_dedupes() {
        let mut p = params("tee");
        p.suppliers = Some("sanmar, ss, sanmar".to_string());
        let query = p.into_query("req-1").unwrap();
        assert_eq!(
            query.suppliers,
            Some(vec![Supplier::Sanmar, Supplier::SsActivewear])
        );
    }

    #[test]
    fn unknown_supplier_or_sort_is_invalid_request() {
        let mut p = params("tee");
        p.suppliers = Some("acme".to_string());
        let err = p.into_query("req-1").unwrap_err();
        assert_eq!(err.error.code, "invalid_request");

        let mut p = params("tee");
        p.sort = Some("alphabetical".to_string());
        let err = p.into_query("req-1").unwrap_err();
        assert_eq!(err.error.code, "invalid_request");
    }

    #[test]
    fn limit_is_clamped() {
        let mut p = params("tee");
        p.limit = Some(10_000);
        assert_eq!(p.into_query("req-1").unwrap().limit, MAX_LIMIT);
    }
}
