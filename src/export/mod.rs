//! Report aggregation shared by every export format.
//!
//! Items are split into runs of consecutive bags with the same quality name. The
//! split is positional: a quality that reappears after another one starts a new
//! group, so callers that want one group per quality must order items first.

pub mod html;
pub mod sheet;

use crate::entities::report_item;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Output formats accepted by the export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    #[strum(serialize = "html")]
    Html,
    #[strum(to_string = "json", serialize = "excel")]
    Json,
    #[strum(serialize = "csv")]
    Csv,
}

/// Net weight of a bag; never negative.
pub fn net_weight(gross: Decimal, tare: Decimal) -> Decimal {
    (gross - tare).max(Decimal::ZERO)
}

/// Rounds half away from zero and pads to exactly `decimals` places.
pub fn format_weight(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", decimals as usize, rounded)
}

/// Bag count, weight and cone sums over a set of items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeightTotals {
    pub bags: i32,
    pub gross_weight: Decimal,
    pub tare_weight: Decimal,
    pub net_weight: Decimal,
    pub cones: i32,
}

/// Counts saturate at `i32::MAX` instead of wrapping.
impl WeightTotals {
    pub fn record(&mut self, gross: Decimal, tare: Decimal, net: Decimal, cones: i32) {
        self.bags = self.bags.saturating_add(1);
        self.gross_weight += gross;
        self.tare_weight += tare;
        self.net_weight += net;
        self.cones = self.cones.saturating_add(cones);
    }

    pub fn merge(&mut self, other: &WeightTotals) {
        self.bags = self.bags.saturating_add(other.bags);
        self.gross_weight += other.gross_weight;
        self.tare_weight += other.tare_weight;
        self.net_weight += other.net_weight;
        self.cones = self.cones.saturating_add(other.cones);
    }
}

impl<'a> FromIterator<&'a report_item::Model> for WeightTotals {
    fn from_iter<I: IntoIterator<Item = &'a report_item::Model>>(iter: I) -> Self {
        let mut totals = WeightTotals::default();
        for item in iter {
            totals.record(item.gross_weight, item.tare_weight, item.net_weight, item.cones);
        }
        totals
    }
}

/// An item with its running serial number across the whole report
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportLine {
    pub serial_no: usize,
    pub item: report_item::Model,
}

/// A run of consecutive items sharing a quality name
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityGroup {
    pub quality_name: String,
    pub denier: i32,
    pub blend: String,
    pub lot_number: i32,
    pub shade_number: Option<String>,
    /// `quality - denier - blend - Lot: n[ - Shade: s]`
    pub label: String,
    pub lines: Vec<ExportLine>,
    pub subtotal: WeightTotals,
}

impl QualityGroup {
    fn start(first: &report_item::Model) -> Self {
        Self {
            quality_name: first.quality_name.clone(),
            denier: first.denier,
            blend: first.blend.clone(),
            lot_number: first.lot_number,
            shade_number: first.shade_number.clone(),
            label: group_label(first),
            lines: Vec::new(),
            subtotal: WeightTotals::default(),
        }
    }

    fn push(&mut self, serial_no: usize, item: &report_item::Model) {
        self.subtotal
            .record(item.gross_weight, item.tare_weight, item.net_weight, item.cones);
        self.lines.push(ExportLine {
            serial_no,
            item: item.clone(),
        });
    }
}

fn group_label(item: &report_item::Model) -> String {
    let mut label = format!(
        "{} - {} - {} - Lot: {}",
        item.quality_name, item.denier, item.blend, item.lot_number
    );
    if let Some(shade) = item.shade_number.as_deref().filter(|s| !s.is_empty()) {
        label.push_str(" - Shade: ");
        label.push_str(shade);
    }
    label
}

/// Grouped items with subtotals and the grand total
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportAggregate {
    pub groups: Vec<QualityGroup>,
    pub grand_total: WeightTotals,
}

impl ReportAggregate {
    /// Groups `items` in the order given.
    pub fn from_items(items: &[report_item::Model]) -> Self {
        let mut groups: Vec<QualityGroup> = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let continues_run = groups
                .last()
                .map_or(false, |group| group.quality_name == item.quality_name);
            if !continues_run {
                groups.push(QualityGroup::start(item));
            }
            if let Some(group) = groups.last_mut() {
                group.push(index + 1, item);
            }
        }

        let mut grand_total = WeightTotals::default();
        for group in &groups {
            grand_total.merge(&group.subtotal);
        }

        Self {
            groups,
            grand_total,
        }
    }

    pub fn line_count(&self) -> usize {
        self.groups.iter().map(|g| g.lines.len()).sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    pub(crate) fn item(id: i32, bag_no: i32, quality: &str, gross: Decimal, tare: Decimal) -> report_item::Model {
        report_item::Model {
            id,
            report_id: 1,
            bag_no,
            quality_name: quality.to_string(),
            denier: 200,
            blend: "2000".to_string(),
            lot_number: 7,
            shade_number: None,
            gross_weight: gross,
            tare_weight: tare,
            net_weight: net_weight(gross, tare),
            cones: 12,
        }
    }

    #[test]
    fn net_weight_clamps_at_zero() {
        assert_eq!(net_weight(dec!(25.500), dec!(1.250)), dec!(24.250));
        assert_eq!(net_weight(dec!(1.000), dec!(1.500)), Decimal::ZERO);
    }

    #[test]
    fn format_weight_pads_and_rounds() {
        assert_eq!(format_weight(dec!(24.25), 3), "24.250");
        assert_eq!(format_weight(dec!(0.0005), 3), "0.001");
        assert_eq!(format_weight(dec!(10.25), 1), "10.3");
        assert_eq!(format_weight(dec!(7), 0), "7");
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!(ExportFormat::from_str("html").unwrap(), ExportFormat::Html);
        assert_eq!(ExportFormat::from_str("EXCEL").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_str("json").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_str("csv").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::from_str("pdf").is_err());
        assert_eq!(ExportFormat::default(), ExportFormat::Html);
    }

    #[test]
    fn runs_split_when_quality_changes() {
        let items = vec![
            item(1, 1, "Rct 277", dec!(25), dec!(1)),
            item(2, 2, "Rct 277", dec!(26), dec!(1)),
            item(3, 3, "Plt 193", dec!(20), dec!(0.5)),
            item(4, 4, "Rct 277", dec!(24), dec!(1)),
        ];
        let aggregate = ReportAggregate::from_items(&items);

        let names: Vec<_> = aggregate
            .groups
            .iter()
            .map(|g| g.quality_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rct 277", "Plt 193", "Rct 277"]);
        assert_eq!(aggregate.groups[0].subtotal.bags, 2);
        assert_eq!(aggregate.groups[0].subtotal.net_weight, dec!(49));
        assert_eq!(aggregate.groups[2].lines[0].serial_no, 4);
        assert_eq!(aggregate.grand_total.gross_weight, dec!(95));
        assert_eq!(aggregate.grand_total.net_weight, dec!(91.5));
        assert_eq!(aggregate.grand_total.cones, 48);
        assert_eq!(aggregate.line_count(), 4);
    }

    #[test]
    fn cone_counts_saturate_instead_of_wrapping() {
        let mut totals = WeightTotals::default();
        totals.record(dec!(10), dec!(1), dec!(9), 2_000_000_000);
        totals.record(dec!(10), dec!(1), dec!(9), 2_000_000_000);
        assert_eq!(totals.cones, i32::MAX);

        let mut merged = totals;
        merged.merge(&totals);
        assert_eq!(merged.cones, i32::MAX);
        assert_eq!(merged.bags, 4);
    }

    #[test]
    fn empty_items_produce_empty_aggregate() {
        let aggregate = ReportAggregate::from_items(&[]);
        assert!(aggregate.groups.is_empty());
        assert_eq!(aggregate.grand_total, WeightTotals::default());
    }

    #[test]
    fn label_includes_shade_only_when_present() {
        let mut first = item(1, 1, "Vct 452", dec!(10), dec!(1));
        assert_eq!(group_label(&first), "Vct 452 - 200 - 2000 - Lot: 7");
        first.shade_number = Some("S003".into());
        assert_eq!(group_label(&first), "Vct 452 - 200 - 2000 - Lot: 7 - Shade: S003");
    }
}
