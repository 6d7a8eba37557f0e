use super::publish;
use crate::{
    db::{commit, db_failure, DbPool},
    entities::{client, quality},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// Sample clients as `(name, address)`
pub const SAMPLE_CLIENTS: [(&str, &str); 5] = [
    (
        "3AT INDIA INC",
        "123 Industrial Area, Phase 1, New Delhi - 110001, India",
    ),
    (
        "ABDUL SAMAD SHABAN",
        "45 Cotton Street, Mumbai - 400001, India",
    ),
    (
        "DICITEX FURNISHING PVT LTD",
        "Plot No. 15, MIDC, Andheri East, Mumbai - 400093, India",
    ),
    (
        "EASTERN SILK INDUSTRIES LIMITED",
        "7 Silk Center, Bangalore - 560001, India",
    ),
    (
        "FAZE THREE LTD",
        "29 Textile Park, Surat - 395003, Gujarat, India",
    ),
];

/// Sample qualities as `(name, denier, blend, shade)`
pub const SAMPLE_QUALITIES: [(&str, i32, &str, &str); 4] = [
    ("Rct 277", 200, "2000", "S001"),
    ("Plt 193", 150, "1500", "S002"),
    ("Vct 452", 300, "3000", "S003"),
    ("Kct 385", 250, "2500", "S004"),
];

/// Rows inserted by one seeding run; existing names are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub clients: u64,
    pub qualities: u64,
}

/// Loads the sample clients and qualities
#[derive(Clone)]
pub struct SeedService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SeedService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Inserts whichever sample rows are missing. Safe to run repeatedly.
    #[instrument(skip(self))]
    pub async fn seed(&self) -> Result<SeedSummary, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(db_failure("begin_seed"))?;
        let mut summary = SeedSummary::default();

        for (name, address) in SAMPLE_CLIENTS {
            let existing = client::Entity::find()
                .filter(client::Column::Name.eq(name))
                .one(&txn)
                .await
                .map_err(db_failure("seed_find_client"))?;
            if existing.is_some() {
                debug!(name, "Client already present");
                continue;
            }

            client::ActiveModel {
                name: Set(name.to_string()),
                address: Set(address.to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_failure("seed_insert_client"))?;
            summary.clients += 1;
        }

        for (name, denier, blend, shade) in SAMPLE_QUALITIES {
            let existing = quality::Entity::find()
                .filter(quality::Column::Name.eq(name))
                .one(&txn)
                .await
                .map_err(db_failure("seed_find_quality"))?;
            if existing.is_some() {
                debug!(name, "Quality already present");
                continue;
            }

            quality::ActiveModel {
                name: Set(name.to_string()),
                denier: Set(denier),
                blend: Set(blend.to_string()),
                shade_number: Set(Some(shade.to_string())),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_failure("seed_insert_quality"))?;
            summary.qualities += 1;
        }

        commit(txn, "seed").await?;

        info!(
            clients = summary.clients,
            qualities = summary.qualities,
            "Sample data seeded"
        );
        publish(
            &self.event_sender,
            Event::SeedApplied {
                clients: summary.clients,
                qualities: summary.qualities,
            },
        )
        .await;

        Ok(summary)
    }
}
