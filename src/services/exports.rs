use super::publish;
use crate::{
    config::ExportConfig,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    export::{html, sheet, ExportFormat, ReportAggregate},
    services::reports::{load_report_bundle, ReportDetail},
};
use metrics::{counter, histogram};
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Structured export for spreadsheet clients: the report, its groups and the sheet rows
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub file_name: String,
    pub report: ReportDetail,
    #[serde(flatten)]
    pub aggregate: ReportAggregate,
    /// Cell rows in sheet order, ready to write one row per line
    pub sheet: Vec<Vec<String>>,
}

/// A rendered export, ready to be written to a response
#[derive(Debug, Clone)]
pub enum RenderedExport {
    Html(String),
    Json(Box<ExportDocument>),
    Csv { file_name: String, body: Vec<u8> },
}

/// Renders reports as printable HTML, JSON sheet data or CSV
#[derive(Clone)]
pub struct ExportService {
    db_pool: Arc<DbPool>,
    letterhead: ExportConfig,
    event_sender: Option<Arc<EventSender>>,
}

impl ExportService {
    pub fn new(
        db_pool: Arc<DbPool>,
        letterhead: ExportConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            letterhead,
            event_sender,
        }
    }

    #[instrument(skip(self), fields(format = %format))]
    pub async fn export_report(
        &self,
        id: i32,
        format: ExportFormat,
    ) -> Result<RenderedExport, ServiceError> {
        let started = Instant::now();
        let bundle = load_report_bundle(&*self.db_pool, id).await?;
        let aggregate = ReportAggregate::from_items(&bundle.items);

        let rendered = match format {
            ExportFormat::Html => {
                RenderedExport::Html(html::render(&bundle, &aggregate, &self.letterhead)?)
            }
            ExportFormat::Json => {
                let sheet = sheet::build_rows(&bundle, &aggregate, &self.letterhead);
                let file_name =
                    sheet::file_name(&bundle.client.name, bundle.report.report_date, "xlsx");
                RenderedExport::Json(Box::new(ExportDocument {
                    file_name,
                    report: bundle.into(),
                    aggregate,
                    sheet,
                }))
            }
            ExportFormat::Csv => {
                let rows = sheet::build_rows(&bundle, &aggregate, &self.letterhead);
                RenderedExport::Csv {
                    file_name: sheet::file_name(
                        &bundle.client.name,
                        bundle.report.report_date,
                        "csv",
                    ),
                    body: sheet::to_csv(&rows)?,
                }
            }
        };

        let format_name = format.to_string();
        histogram!("packing_exports.render_duration", started.elapsed(), "format" => format_name.clone());
        counter!("packing_exports.rendered", 1, "format" => format_name.clone());
        info!(report_id = id, format = %format_name, "Report exported");
        publish(
            &self.event_sender,
            Event::ReportExported {
                report_id: id,
                format: format_name,
            },
        )
        .await;

        Ok(rendered)
    }
}
