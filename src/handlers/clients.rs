use super::common::{created_response, no_content_response};
use crate::{
    entities::client, errors::ServiceError, services::clients::ClientInput, ApiResponse,
    ApiResult, AppState, ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

/// List clients ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(ListQuery),
    responses(
        (status = 200, description = "Clients", body = ApiResponse<Vec<client::Model>>)
    ),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<client::Model>> {
    let clients = state
        .services
        .clients
        .list_clients(query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(clients)))
}

/// Get a client by id
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = ApiResponse<client::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<client::Model> {
    let client = state.services.clients.get_client(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    request_body = ClientInput,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<client::Model>),
        (status = 400, description = "Invalid or duplicate client", body = crate::errors::ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<ClientInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.clients.create_client(payload).await?;
    Ok(created_response(created))
}

/// Replace a client's name and address
#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    params(("id" = i32, Path, description = "Client ID")),
    request_body = ClientInput,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<client::Model>),
        (status = 400, description = "Invalid or duplicate client", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ClientInput>,
) -> ApiResult<client::Model> {
    let updated = state.services.clients.update_client(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a client that no report refers to
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 400, description = "Client is used by reports", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.clients.delete_client(id).await?;
    Ok(no_content_response())
}

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
}
