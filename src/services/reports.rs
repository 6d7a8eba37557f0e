use super::{not_blank, publish, substring_pattern, trimmed};
use crate::{
    db::{commit, db_failure, DbPool},
    entities::{client, report, report_item},
    errors::{field_messages, ServiceError},
    events::{Event, EventSender},
    export::{net_weight, WeightTotals},
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Weights are stored as `decimal(10, 3)`.
pub const WEIGHT_SCALE: u32 = 3;

/// Largest weight a `decimal(10, 3)` column holds.
pub fn max_weight() -> Decimal {
    Decimal::new(9_999_999_999, WEIGHT_SCALE)
}

fn round_weight(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(WEIGHT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Header of a report as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportHeaderInput {
    #[validate(range(min = 1, message = "Client is required"))]
    pub client_id: i32,

    /// Next free number (max + 1) when omitted
    #[serde(default)]
    #[validate(range(min = 1, message = "Challan number must be at least 1"))]
    pub challan_no: Option<i32>,

    #[schema(value_type = String, format = Date, example = "2024-03-05")]
    pub report_date: NaiveDate,

    #[validate(
        length(min = 1, max = 50, message = "Quality name must be 1 to 50 characters"),
        custom = "not_blank"
    )]
    pub quality_name: String,

    #[validate(range(min = 1, message = "Denier must be at least 1"))]
    pub denier: i32,

    #[validate(
        length(min = 1, max = 50, message = "Blend must be 1 to 50 characters"),
        custom = "not_blank"
    )]
    pub blend: String,

    #[validate(range(min = 1, message = "Lot number must be at least 1"))]
    pub lot_number: i32,

    #[serde(default)]
    #[validate(length(max = 50, message = "Shade number must be at most 50 characters"))]
    pub shade_number: Option<String>,

    #[serde(default)]
    #[validate(length(max = 30, message = "Vehicle number must be at most 30 characters"))]
    pub vehicle_no: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100, message = "Driver name must be at most 100 characters"))]
    pub driver_name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Destination must be at most 200 characters"))]
    pub destination: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Purpose must be at most 200 characters"))]
    pub purpose: Option<String>,

    /// Optional client-side totals; when present they must agree with the items
    #[serde(default)]
    pub total_bags: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub total_gross_weight: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub total_tare_weight: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub total_net_weight: Option<Decimal>,
    #[serde(default)]
    pub total_cones: Option<i32>,
}

impl ReportHeaderInput {
    fn normalized(self) -> Self {
        Self {
            quality_name: self.quality_name.trim().to_string(),
            blend: self.blend.trim().to_string(),
            shade_number: trimmed(self.shade_number),
            vehicle_no: trimmed(self.vehicle_no),
            driver_name: trimmed(self.driver_name),
            destination: trimmed(self.destination),
            purpose: trimmed(self.purpose),
            ..self
        }
    }

    fn declared_total_problems(&self, computed: &WeightTotals) -> Vec<String> {
        let mut problems = Vec::new();

        if let Some(bags) = self.total_bags {
            if bags != computed.bags {
                problems.push(format!(
                    "report.total_bags: expected {} (number of items)",
                    computed.bags
                ));
            }
        }
        for (field, declared, actual) in [
            ("total_gross_weight", self.total_gross_weight, computed.gross_weight),
            ("total_tare_weight", self.total_tare_weight, computed.tare_weight),
            ("total_net_weight", self.total_net_weight, computed.net_weight),
        ] {
            if let Some(declared) = declared {
                if round_weight(declared) != round_weight(actual) {
                    problems.push(format!(
                        "report.{}: expected {} (sum of items)",
                        field,
                        round_weight(actual)
                    ));
                }
            }
        }
        if let Some(cones) = self.total_cones {
            if cones != computed.cones {
                problems.push(format!(
                    "report.total_cones: expected {} (sum of items)",
                    computed.cones
                ));
            }
        }
        problems
    }
}

/// One bag line. Quality fields left out inherit the header's.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportItemInput {
    #[validate(range(min = 1, message = "Bag number must be at least 1"))]
    pub bag_no: i32,

    #[schema(value_type = String, example = "25.500")]
    pub gross_weight: Decimal,

    #[schema(value_type = String, example = "1.250")]
    pub tare_weight: Decimal,

    /// Ignored for storage; checked against gross - tare when supplied
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub net_weight: Option<Decimal>,

    #[validate(range(min = 1, max = 100000, message = "Cones must be between 1 and 100000"))]
    pub cones: i32,

    #[serde(default)]
    #[validate(length(max = 50, message = "Quality name must be at most 50 characters"))]
    pub quality_name: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "Denier must be at least 1"))]
    pub denier: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 50, message = "Blend must be at most 50 characters"))]
    pub blend: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "Lot number must be at least 1"))]
    pub lot_number: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 50, message = "Shade number must be at most 50 characters"))]
    pub shade_number: Option<String>,
}

impl ReportItemInput {
    fn weight_problems(&self, prefix: &str) -> Vec<String> {
        let mut problems = Vec::new();
        let max = max_weight();
        // Checked as stored, after rounding to the column scale
        let gross = round_weight(self.gross_weight);
        let tare = round_weight(self.tare_weight);

        if gross <= Decimal::ZERO {
            problems.push(format!("{}.gross_weight: must be greater than 0", prefix));
        } else if gross > max {
            problems.push(format!("{}.gross_weight: must be at most {}", prefix, max));
        }
        if tare < Decimal::ZERO {
            problems.push(format!("{}.tare_weight: must not be negative", prefix));
        } else if tare > max {
            problems.push(format!("{}.tare_weight: must be at most {}", prefix, max));
        }
        if let Some(declared) = self.net_weight {
            let expected = net_weight(gross, tare);
            if round_weight(declared) != expected {
                problems.push(format!(
                    "{}.net_weight: expected {} (gross - tare)",
                    prefix, expected
                ));
            }
        }
        problems
    }
}

/// Body of `POST /reports` and `PUT /reports/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportPayload {
    pub report: ReportHeaderInput,
    pub items: Vec<ReportItemInput>,
}

impl ReportPayload {
    /// Collects every field problem of the header and items in one error.
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut problems = Vec::new();

        if let Err(errors) = self.report.validate() {
            problems.extend(field_messages(&errors, Some("report")));
        }
        if self.items.is_empty() {
            problems.push("items: At least one item is required".to_string());
        }
        for (index, item) in self.items.iter().enumerate() {
            let prefix = format!("items[{}]", index);
            if let Err(errors) = item.validate() {
                problems.extend(field_messages(&errors, Some(&prefix)));
            }
            problems.extend(item.weight_problems(&prefix));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidFields(problems))
        }
    }
}

/// Item with its effective quality and server-computed net weight
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedItem {
    bag_no: i32,
    quality_name: String,
    denier: i32,
    blend: String,
    lot_number: i32,
    shade_number: Option<String>,
    gross_weight: Decimal,
    tare_weight: Decimal,
    net_weight: Decimal,
    cones: i32,
}

impl ResolvedItem {
    fn resolve(item: &ReportItemInput, header: &ReportHeaderInput) -> Self {
        let gross_weight = round_weight(item.gross_weight);
        let tare_weight = round_weight(item.tare_weight);

        Self {
            bag_no: item.bag_no,
            quality_name: trimmed(item.quality_name.clone())
                .unwrap_or_else(|| header.quality_name.clone()),
            denier: item.denier.unwrap_or(header.denier),
            blend: trimmed(item.blend.clone()).unwrap_or_else(|| header.blend.clone()),
            lot_number: item.lot_number.unwrap_or(header.lot_number),
            shade_number: trimmed(item.shade_number.clone()).or_else(|| header.shade_number.clone()),
            gross_weight,
            tare_weight,
            net_weight: net_weight(gross_weight, tare_weight),
            cones: item.cones,
        }
    }

    fn into_active_model(self, report_id: i32) -> report_item::ActiveModel {
        report_item::ActiveModel {
            report_id: Set(report_id),
            bag_no: Set(self.bag_no),
            quality_name: Set(self.quality_name),
            denier: Set(self.denier),
            blend: Set(self.blend),
            lot_number: Set(self.lot_number),
            shade_number: Set(self.shade_number),
            gross_weight: Set(self.gross_weight),
            tare_weight: Set(self.tare_weight),
            net_weight: Set(self.net_weight),
            cones: Set(self.cones),
            ..Default::default()
        }
    }
}

/// Report totals share the item columns' limits; cone and bag counts must fit `i32`.
fn total_limit_problems(items: &[ResolvedItem]) -> Vec<String> {
    let mut problems = Vec::new();
    let max = max_weight();

    let gross: Decimal = items.iter().map(|i| i.gross_weight).sum();
    let tare: Decimal = items.iter().map(|i| i.tare_weight).sum();
    for (field, total) in [("total_gross_weight", gross), ("total_tare_weight", tare)] {
        if total > max {
            problems.push(format!(
                "report.{}: sum of items must be at most {}",
                field, max
            ));
        }
    }

    let cones: i64 = items.iter().map(|i| i64::from(i.cones)).sum();
    if cones > i64::from(i32::MAX) {
        problems.push(format!(
            "report.total_cones: sum of items must be at most {}",
            i32::MAX
        ));
    }
    if i32::try_from(items.len()).is_err() {
        problems.push("items: too many items".to_string());
    }
    problems
}

fn totals_of(items: &[ResolvedItem]) -> WeightTotals {
    let mut totals = WeightTotals::default();
    for item in items {
        totals.record(item.gross_weight, item.tare_weight, item.net_weight, item.cones);
    }
    totals
}

/// Validated, normalized payload with totals worked out
struct PreparedReport {
    header: ReportHeaderInput,
    items: Vec<ResolvedItem>,
    totals: WeightTotals,
}

impl PreparedReport {
    fn prepare(payload: ReportPayload) -> Result<Self, ServiceError> {
        payload.check()?;
        let header = payload.report.normalized();
        let items: Vec<ResolvedItem> = payload
            .items
            .iter()
            .map(|item| ResolvedItem::resolve(item, &header))
            .collect();

        let problems = total_limit_problems(&items);
        if !problems.is_empty() {
            return Err(ServiceError::InvalidFields(problems));
        }
        let totals = totals_of(&items);

        let problems = header.declared_total_problems(&totals);
        if !problems.is_empty() {
            return Err(ServiceError::InvalidFields(problems));
        }

        Ok(Self {
            header,
            items,
            totals,
        })
    }

    fn fill_header(&self, active: &mut report::ActiveModel, challan_no: i32) {
        let header = &self.header;
        active.client_id = Set(header.client_id);
        active.challan_no = Set(challan_no);
        active.report_date = Set(header.report_date);
        active.quality_name = Set(header.quality_name.clone());
        active.denier = Set(header.denier);
        active.blend = Set(header.blend.clone());
        active.lot_number = Set(header.lot_number);
        active.shade_number = Set(header.shade_number.clone());
        active.vehicle_no = Set(header.vehicle_no.clone());
        active.driver_name = Set(header.driver_name.clone());
        active.destination = Set(header.destination.clone());
        active.purpose = Set(header.purpose.clone());
        active.total_bags = Set(self.totals.bags);
        active.total_gross_weight = Set(self.totals.gross_weight);
        active.total_tare_weight = Set(self.totals.tare_weight);
        active.total_net_weight = Set(self.totals.net_weight);
        active.total_cones = Set(self.totals.cones);
    }
}

/// Filters accepted by the report listing; all optional and combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub client_id: Option<i32>,
    /// Matches the header quality or the quality of any item
    pub quality_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Substring of client name, header quality name or challan number
    pub search: Option<String>,
}

impl ReportFilter {
    fn check_range(&self) -> Result<(), ServiceError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(ServiceError::ValidationError(
                "startDate must not be after endDate".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Parses a `YYYY-MM-DD` query value.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::ValidationError(format!("Invalid {}: expected YYYY-MM-DD", field))
    })
}

/// Report header with its client's name (and address on single-report reads)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: i32,
    pub client_id: i32,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    pub challan_no: i32,
    #[schema(value_type = String, format = Date)]
    pub report_date: NaiveDate,
    pub quality_name: String,
    pub denier: i32,
    pub blend: String,
    pub lot_number: i32,
    pub shade_number: Option<String>,
    pub vehicle_no: Option<String>,
    pub driver_name: Option<String>,
    pub destination: Option<String>,
    pub purpose: Option<String>,
    pub total_bags: i32,
    #[schema(value_type = String)]
    pub total_gross_weight: Decimal,
    #[schema(value_type = String)]
    pub total_tare_weight: Decimal,
    #[schema(value_type = String)]
    pub total_net_weight: Decimal,
    pub total_cones: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReportView {
    pub fn new(model: report::Model, client_name: String, client_address: Option<String>) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            client_name,
            client_address,
            challan_no: model.challan_no,
            report_date: model.report_date,
            quality_name: model.quality_name,
            denier: model.denier,
            blend: model.blend,
            lot_number: model.lot_number,
            shade_number: model.shade_number,
            vehicle_no: model.vehicle_no,
            driver_name: model.driver_name,
            destination: model.destination,
            purpose: model.purpose,
            total_bags: model.total_bags,
            total_gross_weight: model.total_gross_weight,
            total_tare_weight: model.total_tare_weight,
            total_net_weight: model.total_net_weight,
            total_cones: model.total_cones,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A report with its items in bag order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub report: ReportView,
    pub items: Vec<report_item::Model>,
}

/// Everything an export needs about one report
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub report: report::Model,
    pub client: client::Model,
    pub items: Vec<report_item::Model>,
}

impl From<ReportBundle> for ReportDetail {
    fn from(bundle: ReportBundle) -> Self {
        let client = bundle.client;
        Self {
            report: ReportView::new(bundle.report, client.name, Some(client.address)),
            items: bundle.items,
        }
    }
}

/// Loads a report, its client and its items ordered by bag number.
pub async fn load_report_bundle<C>(db: &C, id: i32) -> Result<ReportBundle, ServiceError>
where
    C: ConnectionTrait,
{
    let (report, client) = report::Entity::find_by_id(id)
        .find_also_related(client::Entity)
        .one(db)
        .await
        .map_err(db_failure("load_report"))?
        .ok_or_else(|| ServiceError::NotFound("Report not found".to_string()))?;

    let client = client.ok_or_else(|| {
        ServiceError::InternalError(format!(
            "report {} references missing client {}",
            id, report.client_id
        ))
    })?;

    let items = report_item::Entity::find()
        .filter(report_item::Column::ReportId.eq(id))
        .order_by_asc(report_item::Column::BagNo)
        .order_by_asc(report_item::Column::Id)
        .all(db)
        .await
        .map_err(db_failure("load_report_items"))?;

    Ok(ReportBundle {
        report,
        client,
        items,
    })
}

async fn ensure_client(txn: &DatabaseTransaction, client_id: i32) -> Result<(), ServiceError> {
    let found = client::Entity::find_by_id(client_id)
        .one(txn)
        .await
        .map_err(db_failure("find_report_client"))?;
    match found {
        Some(_) => Ok(()),
        None => Err(ServiceError::ValidationError("Client not found".to_string())),
    }
}

/// `max(challan_no) + 1`, or 1 for the first report.
async fn next_challan_no<C>(db: &C) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    let max = report::Entity::find()
        .select_only()
        .column_as(report::Column::ChallanNo.max(), "max_challan")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await
        .map_err(db_failure("max_challan_no"))?
        .flatten();

    Ok(max.unwrap_or(0) + 1)
}

async fn insert_items(
    txn: &DatabaseTransaction,
    report_id: i32,
    items: Vec<ResolvedItem>,
) -> Result<(), ServiceError> {
    let models: Vec<report_item::ActiveModel> = items
        .into_iter()
        .map(|item| item.into_active_model(report_id))
        .collect();

    report_item::Entity::insert_many(models)
        .exec(txn)
        .await
        .map_err(db_failure("insert_report_items"))?;
    Ok(())
}

/// Packing reports and their items
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists reports newest first, narrowed by `filter`.
    #[instrument(skip(self))]
    pub async fn search_reports(
        &self,
        filter: ReportFilter,
    ) -> Result<Vec<ReportView>, ServiceError> {
        filter.check_range()?;

        let mut query = report::Entity::find().find_also_related(client::Entity);

        if let Some(client_id) = filter.client_id {
            query = query.filter(report::Column::ClientId.eq(client_id));
        }
        if let Some(quality) = filter.quality_name.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let item_reports = Query::select()
                .column(report_item::Column::ReportId)
                .from(report_item::Entity)
                .and_where(report_item::Column::QualityName.eq(quality))
                .to_owned();
            query = query.filter(
                Condition::any()
                    .add(report::Column::QualityName.eq(quality))
                    .add(report::Column::Id.in_subquery(item_reports)),
            );
        }
        if let Some(start) = filter.start_date {
            query = query.filter(report::Column::ReportDate.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(report::Column::ReportDate.lte(end));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::col((client::Entity, client::Column::Name))
                            .like(substring_pattern(term)),
                    )
                    .add(
                        Expr::col((report::Entity, report::Column::QualityName))
                            .like(substring_pattern(term)),
                    )
                    .add(
                        Expr::expr(Expr::cust(r#"CAST("reports"."challan_no" AS TEXT)"#))
                            .like(substring_pattern(term)),
                    ),
            );
        }

        let rows = query
            .order_by_desc(report::Column::ReportDate)
            .order_by_desc(report::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(db_failure("search_reports"))?;

        Ok(rows
            .into_iter()
            .map(|(report, client)| {
                let client_name = client.map(|c| c.name).unwrap_or_default();
                ReportView::new(report, client_name, None)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_report(&self, id: i32) -> Result<ReportDetail, ServiceError> {
        load_report_bundle(&*self.db_pool, id).await.map(Into::into)
    }

    /// Creates the header and all items in one transaction.
    #[instrument(skip(self, payload), fields(client_id = payload.report.client_id, items = payload.items.len()))]
    pub async fn create_report(&self, payload: ReportPayload) -> Result<ReportDetail, ServiceError> {
        let prepared = PreparedReport::prepare(payload)?;
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(db_failure("begin_create_report"))?;
        ensure_client(&txn, prepared.header.client_id).await?;

        let challan_no = match prepared.header.challan_no {
            Some(challan_no) => challan_no,
            None => next_challan_no(&txn).await?,
        };

        let mut active = report::ActiveModel {
            ..Default::default()
        };
        prepared.fill_header(&mut active, challan_no);
        let saved = active
            .insert(&txn)
            .await
            .map_err(db_failure("insert_report"))?;

        let item_count = prepared.items.len();
        insert_items(&txn, saved.id, prepared.items).await?;
        commit(txn, "create_report").await?;

        counter!("packing_reports.created", 1);
        info!(report_id = saved.id, challan_no, items = item_count, "Report created");
        publish(
            &self.event_sender,
            Event::ReportCreated {
                report_id: saved.id,
                challan_no,
                items: item_count,
            },
        )
        .await;

        self.get_report(saved.id).await
    }

    /// Replaces the header and all items of an existing report in one transaction.
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn update_report(
        &self,
        id: i32,
        payload: ReportPayload,
    ) -> Result<ReportDetail, ServiceError> {
        let prepared = PreparedReport::prepare(payload)?;
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(db_failure("begin_update_report"))?;
        let existing = report::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_failure("find_report"))?
            .ok_or_else(|| ServiceError::NotFound("Report not found".to_string()))?;
        ensure_client(&txn, prepared.header.client_id).await?;

        let challan_no = prepared.header.challan_no.unwrap_or(existing.challan_no);
        let mut active: report::ActiveModel = existing.into();
        prepared.fill_header(&mut active, challan_no);
        active
            .update(&txn)
            .await
            .map_err(db_failure("update_report"))?;

        report_item::Entity::delete_many()
            .filter(report_item::Column::ReportId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_failure("delete_report_items"))?;
        let item_count = prepared.items.len();
        insert_items(&txn, id, prepared.items).await?;
        commit(txn, "update_report").await?;

        info!(report_id = id, items = item_count, "Report updated");
        publish(
            &self.event_sender,
            Event::ReportUpdated {
                report_id: id,
                items: item_count,
            },
        )
        .await;

        self.get_report(id).await
    }

    /// Deletes the items, then the header.
    #[instrument(skip(self))]
    pub async fn delete_report(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(db_failure("begin_delete_report"))?;

        report::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_failure("find_report"))?
            .ok_or_else(|| ServiceError::NotFound("Report not found".to_string()))?;

        let removed = report_item::Entity::delete_many()
            .filter(report_item::Column::ReportId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_failure("delete_report_items"))?;
        report::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_failure("delete_report"))?;
        commit(txn, "delete_report").await?;

        info!(report_id = id, items = removed.rows_affected, "Report deleted");
        publish(&self.event_sender, Event::ReportDeleted(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn header() -> ReportHeaderInput {
        ReportHeaderInput {
            client_id: 1,
            challan_no: None,
            report_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            quality_name: "Rct 277".into(),
            denier: 200,
            blend: "2000".into(),
            lot_number: 7,
            shade_number: Some("S001".into()),
            vehicle_no: None,
            driver_name: None,
            destination: None,
            purpose: None,
            total_bags: None,
            total_gross_weight: None,
            total_tare_weight: None,
            total_net_weight: None,
            total_cones: None,
        }
    }

    fn item(bag_no: i32, gross: Decimal, tare: Decimal) -> ReportItemInput {
        ReportItemInput {
            bag_no,
            gross_weight: gross,
            tare_weight: tare,
            net_weight: None,
            cones: 12,
            quality_name: None,
            denier: None,
            blend: None,
            lot_number: None,
            shade_number: None,
        }
    }

    #[test]
    fn items_inherit_header_quality() {
        let header = header();
        let mut override_item = item(2, dec!(20), dec!(1));
        override_item.quality_name = Some("Plt 193".into());
        override_item.denier = Some(150);

        let inherited = ResolvedItem::resolve(&item(1, dec!(25), dec!(1)), &header);
        let overridden = ResolvedItem::resolve(&override_item, &header);

        assert_eq!(inherited.quality_name, "Rct 277");
        assert_eq!(inherited.shade_number.as_deref(), Some("S001"));
        assert_eq!(overridden.quality_name, "Plt 193");
        assert_eq!(overridden.denier, 150);
        assert_eq!(overridden.blend, "2000");
    }

    #[test]
    fn net_weight_is_computed_and_clamped() {
        let header = header();
        let resolved = ResolvedItem::resolve(&item(1, dec!(1.0), dec!(1.5)), &header);
        assert_eq!(resolved.net_weight, Decimal::ZERO);
        let resolved = ResolvedItem::resolve(&item(1, dec!(25.1235), dec!(1)), &header);
        assert_eq!(resolved.gross_weight, dec!(25.124));
        assert_eq!(resolved.net_weight, dec!(24.124));
    }

    #[rstest]
    #[case(item(1, dec!(0), dec!(0)), "items[0].gross_weight")]
    #[case(item(1, dec!(-3), dec!(0)), "items[0].gross_weight")]
    #[case(item(1, dec!(10000000), dec!(0)), "items[0].gross_weight")]
    #[case(item(1, dec!(10), dec!(-1)), "items[0].tare_weight")]
    #[case(item(0, dec!(10), dec!(1)), "items[0].bag_no")]
    fn invalid_items_are_reported_with_index(#[case] bad: ReportItemInput, #[case] field: &str) {
        let payload = ReportPayload {
            report: header(),
            items: vec![bad],
        };
        match payload.check() {
            Err(ServiceError::InvalidFields(problems)) => {
                assert!(
                    problems.iter().any(|p| p.starts_with(field)),
                    "{:?} should mention {}",
                    problems,
                    field
                );
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let payload = ReportPayload {
            report: header(),
            items: vec![],
        };
        assert!(matches!(payload.check(), Err(ServiceError::InvalidFields(p)) if p[0].starts_with("items")));
    }

    #[test]
    fn mismatched_net_weight_is_rejected() {
        let mut bad = item(1, dec!(25), dec!(1));
        bad.net_weight = Some(dec!(25));
        let payload = ReportPayload {
            report: header(),
            items: vec![bad],
        };
        assert!(payload.check().is_err());

        let mut good = item(1, dec!(25), dec!(1));
        good.net_weight = Some(dec!(24.000));
        let payload = ReportPayload {
            report: header(),
            items: vec![good],
        };
        assert!(payload.check().is_ok());
    }

    #[test]
    fn declared_totals_must_match_items() {
        let mut report = header();
        report.total_bags = Some(2);
        report.total_net_weight = Some(dec!(48.0));
        let payload = ReportPayload {
            report: report.clone(),
            items: vec![item(1, dec!(25), dec!(1)), item(2, dec!(25), dec!(1))],
        };
        assert!(PreparedReport::prepare(payload).is_ok());

        report.total_cones = Some(1);
        let payload = ReportPayload {
            report,
            items: vec![item(1, dec!(25), dec!(1)), item(2, dec!(25), dec!(1))],
        };
        match PreparedReport::prepare(payload) {
            Err(ServiceError::InvalidFields(problems)) => {
                assert_eq!(problems, vec!["report.total_cones: expected 24 (sum of items)"]);
            }
            _ => panic!("expected totals mismatch"),
        }
    }

    #[test]
    fn huge_cone_counts_are_rejected() {
        let mut first = item(1, dec!(25), dec!(1));
        first.cones = 2_000_000_000;
        let mut second = item(2, dec!(25), dec!(1));
        second.cones = 2_000_000_000;
        let payload = ReportPayload {
            report: header(),
            items: vec![first, second],
        };
        match PreparedReport::prepare(payload) {
            Err(ServiceError::InvalidFields(problems)) => {
                assert!(problems.iter().any(|p| p.starts_with("items[0].cones")));
                assert!(problems.iter().any(|p| p.starts_with("items[1].cones")));
            }
            _ => panic!("expected cone limits to be enforced"),
        }

        // Sums past i32 are reported rather than wrapped
        let header = header();
        let mut resolved = ResolvedItem::resolve(&item(1, dec!(25), dec!(1)), &header);
        resolved.cones = i32::MAX;
        let problems = total_limit_problems(&[resolved.clone(), resolved]);
        assert_eq!(
            problems,
            vec![format!("report.total_cones: sum of items must be at most {}", i32::MAX)]
        );
    }

    #[test]
    fn totals_must_fit_the_weight_columns() {
        let payload = ReportPayload {
            report: header(),
            items: vec![
                item(1, dec!(6000000), dec!(1)),
                item(2, dec!(6000000), dec!(1)),
            ],
        };
        match PreparedReport::prepare(payload) {
            Err(ServiceError::InvalidFields(problems)) => {
                assert_eq!(
                    problems,
                    vec!["report.total_gross_weight: sum of items must be at most 9999999.999"]
                );
            }
            _ => panic!("expected total weight limit"),
        }

        let payload = ReportPayload {
            report: header(),
            items: vec![item(1, dec!(5000000), dec!(1)), item(2, dec!(4999999), dec!(1))],
        };
        assert!(PreparedReport::prepare(payload).is_ok());
    }

    #[test]
    fn gross_weight_is_checked_after_rounding() {
        let payload = ReportPayload {
            report: header(),
            items: vec![item(1, dec!(0.0004), dec!(0))],
        };
        match payload.check() {
            Err(ServiceError::InvalidFields(problems)) => {
                assert_eq!(problems, vec!["items[0].gross_weight: must be greater than 0"]);
            }
            other => panic!("expected rounded gross to be rejected, got {:?}", other),
        }

        let payload = ReportPayload {
            report: header(),
            items: vec![item(1, dec!(0.0005), dec!(0))],
        };
        assert!(payload.check().is_ok());
    }

    #[test]
    fn date_parsing_and_range_checks() {
        assert_eq!(
            parse_date("startDate", "2024-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert!(parse_date("startDate", "31/01/2024").is_err());

        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(filter.check_range().is_err());
        let same_day = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(same_day.check_range().is_ok());
    }
}
