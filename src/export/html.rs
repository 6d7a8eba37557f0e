//! Printable packing report / delivery challan, rendered from
//! `templates/challan.html.tera` with HTML autoescaping.

use super::{format_weight, ReportAggregate, WeightTotals};
use crate::config::ExportConfig;
use crate::entities::client;
use crate::errors::ServiceError;
use crate::services::reports::ReportBundle;
use serde::Serialize;
use tera::{Context, Tera};

/// The `.html` suffix turns on Tera's autoescaping for this template.
const TEMPLATE_NAME: &str = "challan.html";
const TEMPLATE: &str = include_str!("../../templates/challan.html.tera");

const SIGNATURES: [&str; 3] = ["Prepared By", "Checked By", "Authorized Signatory"];

#[derive(Serialize)]
struct TotalsCells {
    gross: String,
    tare: String,
    net: String,
    cones: i32,
}

impl TotalsCells {
    fn new(totals: &WeightTotals, decimals: u32) -> Self {
        Self {
            gross: format_weight(totals.gross_weight, decimals),
            tare: format_weight(totals.tare_weight, decimals),
            net: format_weight(totals.net_weight, decimals),
            cones: totals.cones,
        }
    }
}

#[derive(Serialize)]
struct LineRow {
    serial_no: usize,
    bag_no: i32,
    gross: String,
    tare: String,
    net: String,
    cones: i32,
}

#[derive(Serialize)]
struct GroupRows {
    label: String,
    lines: Vec<LineRow>,
    subtotal: TotalsCells,
}

#[derive(Serialize)]
struct Field<'a> {
    label: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct ChallanPage<'a> {
    letterhead: &'a ExportConfig,
    challan_no: i32,
    report_date: String,
    client: &'a client::Model,
    /// Transport details in two columns; empty when none were recorded
    transport: Vec<Vec<Field<'a>>>,
    groups: Vec<GroupRows>,
    grand_total: TotalsCells,
    signatures: [&'static str; 3],
}

fn template_error(e: tera::Error) -> ServiceError {
    ServiceError::InternalError(format!("challan template: {}", e))
}

fn engine() -> Result<Tera, ServiceError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html"]);
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(template_error)?;
    Ok(tera)
}

fn page<'a>(
    bundle: &'a ReportBundle,
    aggregate: &ReportAggregate,
    letterhead: &'a ExportConfig,
) -> ChallanPage<'a> {
    let report = &bundle.report;
    let decimals = letterhead.weight_decimals;

    let transport = [
        ("Vehicle No", report.vehicle_no.as_deref()),
        ("Driver Name", report.driver_name.as_deref()),
        ("Destination", report.destination.as_deref()),
        ("Purpose", report.purpose.as_deref()),
    ];
    let transport: Vec<Vec<Field<'a>>> = if transport.iter().any(|(_, value)| value.is_some()) {
        transport
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .map(|(label, value)| Field {
                        label: *label,
                        value: value.unwrap_or(""),
                    })
                    .collect()
            })
            .collect()
    } else {
        Vec::new()
    };

    let groups = aggregate
        .groups
        .iter()
        .map(|group| GroupRows {
            label: group.label.clone(),
            lines: group
                .lines
                .iter()
                .map(|line| LineRow {
                    serial_no: line.serial_no,
                    bag_no: line.item.bag_no,
                    gross: format_weight(line.item.gross_weight, decimals),
                    tare: format_weight(line.item.tare_weight, decimals),
                    net: format_weight(line.item.net_weight, decimals),
                    cones: line.item.cones,
                })
                .collect(),
            subtotal: TotalsCells::new(&group.subtotal, decimals),
        })
        .collect();

    ChallanPage {
        letterhead,
        challan_no: report.challan_no,
        report_date: report.report_date.format("%d/%m/%Y").to_string(),
        client: &bundle.client,
        transport,
        groups,
        grand_total: TotalsCells::new(&aggregate.grand_total, decimals),
        signatures: SIGNATURES,
    }
}

/// Renders a complete standalone HTML document for printing or saving as PDF.
pub fn render(
    bundle: &ReportBundle,
    aggregate: &ReportAggregate,
    letterhead: &ExportConfig,
) -> Result<String, ServiceError> {
    let context = Context::from_serialize(page(bundle, aggregate, letterhead))
        .map_err(template_error)?;
    engine()?
        .render(TEMPLATE_NAME, &context)
        .map_err(template_error)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::{client, report};
    use crate::export::tests::item;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    pub(crate) fn bundle() -> ReportBundle {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let items = vec![
            item(1, 1, "Rct 277", dec!(25.5), dec!(1.25)),
            item(2, 2, "Rct 277", dec!(26), dec!(1.25)),
            item(3, 3, "Plt 193", dec!(20.125), dec!(0.5)),
        ];
        let totals: crate::export::WeightTotals = items.iter().collect();
        ReportBundle {
            report: report::Model {
                id: 1,
                client_id: 3,
                challan_no: 101,
                report_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                quality_name: "Rct 277".into(),
                denier: 200,
                blend: "2000".into(),
                lot_number: 7,
                shade_number: None,
                vehicle_no: Some("GJ05 AB 1234".into()),
                driver_name: None,
                destination: Some("Surat".into()),
                purpose: None,
                total_bags: totals.bags,
                total_gross_weight: totals.gross_weight,
                total_tare_weight: totals.tare_weight,
                total_net_weight: totals.net_weight,
                total_cones: totals.cones,
                created_at,
                updated_at: None,
            },
            client: client::Model {
                id: 3,
                name: "Tom & Jerry <Textiles>".into(),
                address: "29 Textile Park, Surat".into(),
                created_at,
                updated_at: None,
            },
            items,
        }
    }

    #[test]
    fn markup_in_stored_text_is_escaped() {
        let mut bundle = bundle();
        bundle.client.address = r#"<script>alert("x")</script>"#.into();
        bundle.report.driver_name = Some("O'Neil & Sons".into());
        let aggregate = ReportAggregate::from_items(&bundle.items);
        let html = render(&bundle, &aggregate, &ExportConfig::default()).unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("O'Neil & Sons"));
        assert!(html.contains("&amp; Sons"));
    }

    #[test]
    fn challan_number_is_in_the_title() {
        let bundle = bundle();
        let aggregate = ReportAggregate::from_items(&bundle.items);
        let html = render(&bundle, &aggregate, &ExportConfig::default()).unwrap();
        assert!(html.contains("<title>Packing Report #101</title>"));
    }

    #[test]
    fn document_contains_layout_sections() {
        let bundle = bundle();
        let aggregate = ReportAggregate::from_items(&bundle.items);
        let html = render(&bundle, &aggregate, &ExportConfig::default()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("PACKING REPORT / DELIVERY CHALLAN"));
        assert!(html.contains("MYCITIUS TEX PRIVATE LIMITED"));
        assert!(html.contains("05/03/2024"));
        assert!(html.contains("Tom &amp; Jerry &lt;Textiles&gt;"));
        assert!(html.contains("Rct 277 - 200 - 2000 - Lot: 7"));
        assert_eq!(html.matches("class=\"subtotal-row\"").count(), 2);
        assert!(html.contains("GRAND TOTAL"));
        assert!(html.contains("71.625"));
        assert!(html.contains("68.625"));
        assert!(html.contains("GJ05 AB 1234"));
        for label in SIGNATURES {
            assert!(html.contains(label));
        }
    }

    #[test]
    fn transport_block_is_omitted_when_empty() {
        let mut bundle = bundle();
        bundle.report.vehicle_no = None;
        bundle.report.destination = None;
        let aggregate = ReportAggregate::from_items(&bundle.items);
        let html = render(&bundle, &aggregate, &ExportConfig::default()).unwrap();
        assert!(!html.contains("Vehicle No"));
    }

    #[test]
    fn weight_decimals_follow_configuration() {
        let bundle = bundle();
        let aggregate = ReportAggregate::from_items(&bundle.items);
        let config = ExportConfig {
            weight_decimals: 1,
            ..ExportConfig::default()
        };
        let html = render(&bundle, &aggregate, &config).unwrap();
        assert!(html.contains(">25.5<"));
        assert!(!html.contains("25.500"));
    }
}
