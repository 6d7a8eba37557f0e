use super::common::{created_response, no_content_response};
use crate::{
    entities::quality, errors::ServiceError, services::qualities::QualityInput, ApiResponse,
    ApiResult, AppState, ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

/// List yarn qualities ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/qualities",
    params(ListQuery),
    responses(
        (status = 200, description = "Qualities", body = ApiResponse<Vec<quality::Model>>)
    ),
    tag = "Qualities"
)]
pub async fn list_qualities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<quality::Model>> {
    let qualities = state
        .services
        .qualities
        .list_qualities(query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(qualities)))
}

#[utoipa::path(
    get,
    path = "/api/v1/qualities/{id}",
    params(("id" = i32, Path, description = "Quality ID")),
    responses(
        (status = 200, description = "Quality", body = ApiResponse<quality::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Qualities"
)]
pub async fn get_quality(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<quality::Model> {
    let quality = state.services.qualities.get_quality(id).await?;
    Ok(Json(ApiResponse::success(quality)))
}

#[utoipa::path(
    post,
    path = "/api/v1/qualities",
    request_body = QualityInput,
    responses(
        (status = 201, description = "Quality created", body = ApiResponse<quality::Model>),
        (status = 400, description = "Invalid or duplicate quality", body = crate::errors::ErrorResponse)
    ),
    tag = "Qualities"
)]
pub async fn create_quality(
    State(state): State<AppState>,
    Json(payload): Json<QualityInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.qualities.create_quality(payload).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/v1/qualities/{id}",
    params(("id" = i32, Path, description = "Quality ID")),
    request_body = QualityInput,
    responses(
        (status = 200, description = "Quality updated", body = ApiResponse<quality::Model>),
        (status = 400, description = "Invalid or duplicate quality", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Qualities"
)]
pub async fn update_quality(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<QualityInput>,
) -> ApiResult<quality::Model> {
    let updated = state.services.qualities.update_quality(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a quality that no report header or item refers to
#[utoipa::path(
    delete,
    path = "/api/v1/qualities/{id}",
    params(("id" = i32, Path, description = "Quality ID")),
    responses(
        (status = 204, description = "Quality deleted"),
        (status = 400, description = "Quality is used by reports", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Qualities"
)]
pub async fn delete_quality(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.qualities.delete_quality(id).await?;
    Ok(no_content_response())
}

pub fn quality_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_qualities).post(create_quality))
        .route(
            "/:id",
            get(get_quality).put(update_quality).delete(delete_quality),
        )
}
