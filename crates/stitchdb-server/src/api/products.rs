use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use stitchdb_core::Supplier;
use stitchdb_engine::{build_matrix, flatten_rows, ProductBundle, StockMatrix};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// The bundle plus a ready-to-render warehouse × size grid per supplier.
#[derive(Debug, Serialize)]
pub(super) struct BundleData {
    #[serde(flatten)]
    bundle: ProductBundle,
    matrices: Vec<SupplierMatrix>,
}

#[derive(Debug, Serialize)]
pub(super) struct SupplierMatrix {
    supplier: Supplier,
    matrix: StockMatrix,
}

/// An identifier that resolves to nothing still returns a bundle: empty, no
/// canonical summary, HTTP 200. The UI treats that as "no results", not an
/// error.
pub(super) async fn get_bundle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<BundleData>>, ApiError> {
    let bundle = state
        .loader
        .load_bundle(&identifier)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let resolver = state.loader.resolver();
    let matrices = bundle
        .suppliers
        .iter()
        .map(|view| {
            let lines = flatten_rows(&view.inventory);
            let catalog_sizes: Vec<String> =
                view.product.sizes.iter().map(|s| s.code.clone()).collect();
            SupplierMatrix {
                supplier: view.supplier,
                matrix: build_matrix(
                    &lines,
                    &view.warehouses,
                    &catalog_sizes,
                    resolver,
                    Some(view.supplier),
                ),
            }
        })
        .collect();

    Ok(Json(ApiResponse {
        data: BundleData { bundle, matrices },
        meta: ResponseMeta::new(req_id.0),
    }))
}
