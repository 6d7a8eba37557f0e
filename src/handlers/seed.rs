use crate::{services::seed::SeedSummary, ApiResponse, ApiResult, AppState};
use axum::{extract::State, response::Json};

/// Insert the sample clients and qualities that are not present yet
#[utoipa::path(
    post,
    path = "/api/v1/seed",
    responses(
        (status = 200, description = "Rows inserted by this run", body = ApiResponse<SeedSummary>)
    ),
    tag = "Seed"
)]
pub async fn seed_sample_data(State(state): State<AppState>) -> ApiResult<SeedSummary> {
    let summary = state.services.seed.seed().await?;
    Ok(Json(ApiResponse {
        message: Some(format!(
            "Seeded {} clients and {} qualities",
            summary.clients, summary.qualities
        )),
        ..ApiResponse::success(summary)
    }))
}
