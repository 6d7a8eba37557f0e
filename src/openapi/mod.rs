use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Packing Report API",
        version = "0.1.0",
        description = r#"
# Packing Report / Delivery Challan API

Keeps the client and yarn quality registers, records packing reports with
bag-level weights and renders them as printable challans or spreadsheet rows.

## Conventions

- JSON bodies use camelCase field names
- Successful responses are wrapped in `{ success, data, message, errors, meta }`
- Weights are decimal strings with three places, e.g. `"25.500"`
- Dates are `YYYY-MM-DD`

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Validation error",
  "details": ["items[0].gross_weight: must be greater than 0"],
  "requestId": "2f6c1c8e-9c1f-4d8e-8b7a-0f3c2f4f6a11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Clients", description = "Client register"),
        (name = "Qualities", description = "Yarn quality register"),
        (name = "Reports", description = "Packing reports, items and exports"),
        (name = "Seed", description = "Sample data")
    ),
    paths(
        // Clients
        crate::handlers::clients::list_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::create_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,

        // Qualities
        crate::handlers::qualities::list_qualities,
        crate::handlers::qualities::get_quality,
        crate::handlers::qualities::create_quality,
        crate::handlers::qualities::update_quality,
        crate::handlers::qualities::delete_quality,

        // Reports
        crate::handlers::reports::list_reports,
        crate::handlers::reports::get_report,
        crate::handlers::reports::create_report,
        crate::handlers::reports::update_report,
        crate::handlers::reports::delete_report,
        crate::handlers::reports::export_report,

        // Seed
        crate::handlers::seed::seed_sample_data,
    ),
    components(
        schemas(
            crate::ListQuery,
            crate::entities::client::Model,
            crate::entities::quality::Model,
            crate::entities::report_item::Model,
            crate::services::clients::ClientInput,
            crate::services::qualities::QualityInput,
            crate::services::reports::ReportPayload,
            crate::services::reports::ReportHeaderInput,
            crate::services::reports::ReportItemInput,
            crate::services::reports::ReportView,
            crate::services::reports::ReportDetail,
            crate::services::exports::ExportDocument,
            crate::services::seed::SeedSummary,
            crate::export::WeightTotals,
            crate::export::QualityGroup,
            crate::health::HealthReport,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
