use super::common::{
    created_response, empty_string_as_none, header_safe_file_name, no_content_response,
};
use crate::{
    errors::ServiceError,
    export::ExportFormat,
    services::{
        exports::{ExportDocument, RenderedExport},
        reports::{parse_date, ReportDetail, ReportFilter, ReportPayload, ReportView},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Report list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Only reports for this client
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client_id: Option<i32>,
    /// Header quality or any item quality
    #[serde(default)]
    pub quality_name: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<String>,
    /// Substring of client name, quality name or challan number
    #[serde(default, alias = "searchTerm")]
    pub q: Option<String>,
}

impl ReportQuery {
    fn into_filter(self) -> Result<ReportFilter, ServiceError> {
        let date = |field: &str, raw: Option<String>| -> Result<_, ServiceError> {
            match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(value) => parse_date(field, value).map(Some),
                None => Ok(None),
            }
        };

        Ok(ReportFilter {
            client_id: self.client_id,
            quality_name: self.quality_name,
            start_date: date("startDate", self.start_date)?,
            end_date: date("endDate", self.end_date)?,
            search: self.q,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `html` (default), `json` (alias `excel`) or `csv`
    pub format: Option<String>,
}

impl ExportQuery {
    fn format(&self) -> Result<ExportFormat, ServiceError> {
        match self.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            None => Ok(ExportFormat::default()),
            Some(raw) => raw.parse::<ExportFormat>().map_err(|_| {
                ServiceError::BadRequest(format!("Unsupported export format: {}", raw))
            }),
        }
    }
}

/// List reports, newest first
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Matching reports", body = ApiResponse<Vec<ReportView>>),
        (status = 400, description = "Malformed filter", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<ReportView>> {
    let filter = query.into_filter()?;
    let reports = state.services.reports.search_reports(filter).await?;
    Ok(Json(ApiResponse::success(reports)))
}

/// Get a report with its client and items
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = i32, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = ApiResponse<ReportDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ReportDetail> {
    let report = state.services.reports.get_report(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Create a report and its items
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = ReportPayload,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportDetail>),
        (status = 400, description = "Invalid report", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<ReportPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.reports.create_report(payload).await?;
    Ok(created_response(created))
}

/// Replace a report's header and items
#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}",
    params(("id" = i32, Path, description = "Report ID")),
    request_body = ReportPayload,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportDetail>),
        (status = 400, description = "Invalid report", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ReportPayload>,
) -> ApiResult<ReportDetail> {
    let updated = state.services.reports.update_report(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    params(("id" = i32, Path, description = "Report ID")),
    responses(
        (status = 204, description = "Report and items deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.reports.delete_report(id).await?;
    Ok(no_content_response())
}

/// Export a report as printable HTML, spreadsheet JSON or CSV
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}/export",
    params(("id" = i32, Path, description = "Report ID"), ExportQuery),
    responses(
        (status = 200, description = "Rendered report", content(
            (String = "text/html"),
            (ApiResponse<ExportDocument> = "application/json"),
            (String = "text/csv")
        )),
        (status = 400, description = "Unsupported format", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reports"
)]
pub async fn export_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ServiceError> {
    let format = query.format()?;

    let response = match state.services.exports.export_report(id, format).await? {
        RenderedExport::Html(page) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            page,
        )
            .into_response(),
        RenderedExport::Json(document) => Json(ApiResponse::success(*document)).into_response(),
        RenderedExport::Csv { file_name, body } => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                header_safe_file_name(&file_name)
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
    };

    Ok(response)
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route(
            "/:id",
            get(get_report).put(update_report).delete(delete_report),
        )
        .route("/:id/export", get(export_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case(None, ExportFormat::Html)]
    #[case(Some(""), ExportFormat::Html)]
    #[case(Some("HTML"), ExportFormat::Html)]
    #[case(Some("excel"), ExportFormat::Json)]
    #[case(Some("json"), ExportFormat::Json)]
    #[case(Some("csv"), ExportFormat::Csv)]
    fn export_formats(#[case] raw: Option<&str>, #[case] expected: ExportFormat) {
        let query = ExportQuery {
            format: raw.map(str::to_string),
        };
        assert_eq!(query.format().unwrap(), expected);
    }

    #[test]
    fn unknown_export_format_is_a_bad_request() {
        let query = ExportQuery {
            format: Some("pdf".into()),
        };
        assert!(matches!(query.format(), Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn query_dates_become_filter_bounds() {
        let filter = ReportQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some(" ".into()),
            q: Some("101".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.end_date, None);
        assert_eq!(filter.search.as_deref(), Some("101"));

        let bad = ReportQuery {
            end_date: Some("2024/01/31".into()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
