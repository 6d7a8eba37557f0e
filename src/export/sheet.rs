//! Row-oriented rendition of a report, shaped like the delivery challan spreadsheet.
//! The same rows back the JSON (`excel`) export and the CSV download.

use super::{format_weight, ReportAggregate, WeightTotals};
use crate::config::ExportConfig;
use crate::errors::ServiceError;
use crate::services::reports::ReportBundle;
use chrono::NaiveDate;
use csv::WriterBuilder;

pub const SHEET_TITLE: &str = "DELIVERY CHALLAN CUM PACKING LIST";
pub const COLUMNS: [&str; 6] = [
    "Sr. No.",
    "Bag No.",
    "Gross Weight (kg)",
    "Tare Weight (kg)",
    "Net Weight (kg)",
    "Cones",
];

pub type Row = Vec<String>;

fn labelled(label: &str, value: impl Into<String>) -> Row {
    vec![label.to_string(), value.into()]
}

fn totals_row(label: &str, totals: &WeightTotals, decimals: u32) -> Row {
    vec![
        label.to_string(),
        String::new(),
        format_weight(totals.gross_weight, decimals),
        format_weight(totals.tare_weight, decimals),
        format_weight(totals.net_weight, decimals),
        totals.cones.to_string(),
    ]
}

/// Lays the report out as spreadsheet rows: letterhead, details, item table, totals.
pub fn build_rows(bundle: &ReportBundle, aggregate: &ReportAggregate, letterhead: &ExportConfig) -> Vec<Row> {
    let report = &bundle.report;
    let decimals = letterhead.weight_decimals;
    let mut rows: Vec<Row> = Vec::with_capacity(32 + aggregate.line_count() + aggregate.groups.len() * 2);

    rows.push(vec![letterhead.company_name.clone()]);
    if !letterhead.company_address.is_empty() {
        rows.push(vec![format!("FACTORY ADDRESS: {}", letterhead.company_address)]);
    }
    if !letterhead.company_gstin.is_empty() {
        rows.push(vec![format!("GST NO: {}", letterhead.company_gstin)]);
    }
    rows.push(Vec::new());
    rows.push(vec![SHEET_TITLE.to_string()]);
    rows.push(Vec::new());

    rows.push(vec!["Shipping Address:".to_string()]);
    rows.push(labelled("Client Name:", bundle.client.name.as_str()));
    rows.push(labelled("Client Address:", bundle.client.address.as_str()));
    rows.push(Vec::new());
    rows.push(labelled("Date:", report.report_date.format("%d/%m/%Y").to_string()));
    rows.push(labelled("Challan No:", report.challan_no.to_string()));
    rows.push(labelled("Quality Name:", report.quality_name.as_str()));
    rows.push(labelled(
        "Shade Number:",
        report.shade_number.clone().unwrap_or_default(),
    ));
    rows.push(labelled("Denier:", report.denier.to_string()));
    rows.push(labelled("Blend:", report.blend.as_str()));
    rows.push(labelled("Lot Number:", report.lot_number.to_string()));
    for (label, value) in [
        ("Vehicle No:", &report.vehicle_no),
        ("Driver Name:", &report.driver_name),
        ("Destination:", &report.destination),
        ("Purpose:", &report.purpose),
    ] {
        if let Some(value) = value {
            rows.push(labelled(label, value.as_str()));
        }
    }
    rows.push(Vec::new());
    rows.push(vec!["Item Details:".to_string()]);
    rows.push(Vec::new());

    rows.push(COLUMNS.iter().map(|c| c.to_string()).collect());
    for group in &aggregate.groups {
        rows.push(vec![group.label.clone()]);
        for line in &group.lines {
            let item = &line.item;
            rows.push(vec![
                line.serial_no.to_string(),
                item.bag_no.to_string(),
                format_weight(item.gross_weight, decimals),
                format_weight(item.tare_weight, decimals),
                format_weight(item.net_weight, decimals),
                item.cones.to_string(),
            ]);
        }
        rows.push(totals_row("Subtotal", &group.subtotal, decimals));
    }
    rows.push(Vec::new());
    rows.push(totals_row("Total", &aggregate.grand_total, decimals));
    rows
}

/// `Delivery_Challan_{first 10 chars of client}_{dd-mm-yyyy}.{extension}`
pub fn file_name(client_name: &str, report_date: NaiveDate, extension: &str) -> String {
    let client: String = client_name
        .chars()
        .take(10)
        .map(|c| if matches!(c, '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!(
        "Delivery_Challan_{}_{}.{}",
        client,
        report_date.format("%d-%m-%Y"),
        extension
    )
}

/// Prefixes cells a spreadsheet would evaluate as formulas.
fn harden_fields(fields: &mut [String]) {
    for f in fields {
        let s = f.trim_start();
        if let Some(ch) = s.chars().next() {
            if matches!(ch, '=' | '+' | '-' | '@') {
                f.insert(0, '\'');
            }
        }
    }
}

/// Writes rows as CSV. Rows may have different lengths.
pub fn to_csv(rows: &[Row]) -> Result<Vec<u8>, ServiceError> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(vec![]);

    for row in rows {
        let mut row = row.clone();
        harden_fields(&mut row);
        wtr.write_record(&row)
            .map_err(|e| ServiceError::InternalError(format!("csv write failed: {}", e)))?;
    }

    wtr.into_inner()
        .map_err(|e| ServiceError::InternalError(format!("csv flush failed: {}", e)))
}
