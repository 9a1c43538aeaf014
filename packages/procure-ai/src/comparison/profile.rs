//! Which fields of a record the comparison sees.

use serde_json::Map;

use crate::comparison::sanitize::sanitize;
use crate::error::SanitizeError;
use crate::types::{ComparableRecord, FieldValue, SourceRecord};

const QUOTE_FIELDS: &[&str] = &[
    "rfq_number",
    "vendor_name",
    "part_number",
    "serial_number",
    "part_description",
    "condition_code",
    "unit_of_measure",
    "quantity",
    "price",
    "currency",
    "pricing_type",
    "pricing_method",
    "core_due",
    "core_change",
    "payment_terms",
    "minimum_order_quantity",
    "lead_time",
    "delivery_terms",
    "warranty",
    "quote_expiration_date",
    "certifications",
    "trace_to",
    "tag_type",
    "tagged_by",
    "tagged_date",
    "vendor_comments",
];

const FUEL_BID_FIELDS: &[&str] = &[
    "vendor_name",
    "title",
    "round",
    "price_type",
    "uom",
    "currency",
    "payment_terms",
    "base_unit_price",
    "index_name",
    "index_location",
    "differential",
    "differential_unit",
    "formula_notes",
    "into_plane_fee",
    "handling_fee",
    "other_fee",
    "other_fee_description",
    "includes_taxes",
    "includes_airport_fees",
    "density_at_15c",
    "normalized_unit_price_usd_per_usg",
    "terms",
];

/// Field selection and naming for one kind of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonProfile {
    /// Plural noun used in the prompt ("quotes", "fuel bids")
    pub item_label: String,
    /// Fields copied into each comparable record, in order
    pub focus_fields: Vec<String>,
    /// Fields used to derive an id for records without one
    pub vendor_field: String,
    pub part_field: String,
}

impl ComparisonProfile {
    pub fn new(
        item_label: impl Into<String>,
        focus_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            item_label: item_label.into(),
            focus_fields: focus_fields.into_iter().map(Into::into).collect(),
            vendor_field: "vendor_name".to_string(),
            part_field: "part_number".to_string(),
        }
    }

    pub fn with_id_fields(mut self, vendor: impl Into<String>, part: impl Into<String>) -> Self {
        self.vendor_field = vendor.into();
        self.part_field = part.into();
        self
    }

    /// Parts quotes for one RFQ.
    pub fn quotes() -> Self {
        Self::new("quotes", QUOTE_FIELDS.iter().copied())
    }

    /// Fuel supply bids for one tender.
    pub fn fuel_bids() -> Self {
        Self::new("fuel bids", FUEL_BID_FIELDS.iter().copied())
            .with_id_fields("vendor_name", "title")
    }

    /// Stable id: the record's own, else `idx_{n}_{vendor}_{part}` with a
    /// 1-based position.
    pub fn record_id(&self, position: usize, record: &SourceRecord) -> String {
        if let Some(id) = record.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        let label = |field: &str, fallback: &str| {
            record
                .get(field)
                .and_then(FieldValue::as_label)
                .unwrap_or_else(|| fallback.to_string())
        };
        format!(
            "idx_{}_{}_{}",
            position + 1,
            label(&self.vendor_field, "unknown"),
            label(&self.part_field, "na")
        )
    }

    /// Project and sanitize one record. Absent focus fields become null.
    pub fn project(
        &self,
        position: usize,
        record: &SourceRecord,
    ) -> Result<ComparableRecord, SanitizeError> {
        let id = self.record_id(position, record);
        let mut fields = Map::with_capacity(self.focus_fields.len());
        for name in &self.focus_fields {
            let value = match record.get(name) {
                Some(value) => sanitize(name, value)?,
                None => serde_json::Value::Null,
            };
            fields.insert(name.clone(), value);
        }
        Ok(ComparableRecord { id, fields })
    }
}

impl Default for ComparisonProfile {
    fn default() -> Self {
        Self::quotes()
    }
}
