pub mod clients;
pub mod common;
pub mod qualities;
pub mod reports;
pub mod seed;

use crate::config::ExportConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    clients::ClientService, exports::ExportService, qualities::QualityService,
    reports::ReportService, seed::SeedService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub clients: Arc<ClientService>,
    pub qualities: Arc<QualityService>,
    pub reports: Arc<ReportService>,
    pub exports: Arc<ExportService>,
    pub seed: Arc<SeedService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        letterhead: ExportConfig,
    ) -> Self {
        Self {
            clients: Arc::new(ClientService::new(db_pool.clone(), event_sender.clone())),
            qualities: Arc::new(QualityService::new(db_pool.clone(), event_sender.clone())),
            reports: Arc::new(ReportService::new(db_pool.clone(), event_sender.clone())),
            exports: Arc::new(ExportService::new(
                db_pool.clone(),
                letterhead,
                event_sender.clone(),
            )),
            seed: Arc::new(SeedService::new(db_pool, event_sender)),
        }
    }
}
