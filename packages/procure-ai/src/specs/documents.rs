//! Typed shapes of the procurement documents the extraction agents fill.
//!
//! Field descriptions double as extraction instructions: they are carried
//! into the JSON Schema the remote agent receives.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Draft-07 schema for `T` with every subschema inlined.
pub fn document_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let mut value = serde_json::to_value(generator.into_root_schema_for::<T>()).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("definitions");
    }
    value
}

/// The company that issued a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vendor {
    /// Vendor company name as printed on the document
    pub name: Option<String>,
    /// Postal address of the vendor
    pub address: Option<String>,
    /// Person signing or sending the document
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Aircraft part information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Part {
    /// Primary manufacturer part number (Part No., PN, P/N). If several are separated by a slash, take the first.
    pub part_number: Option<String>,
    /// Alternate part number if listed (Alt Part No., APN). If slash separated, take the second.
    pub alt_part_number: Option<String>,
    /// Part serial number (Serial No, SN, Serial)
    pub serial_number: Option<String>,
    /// Technical description near the part number, exactly as shown (e.g. 'LAP ASSY', 'CONTROL UNIT')
    pub description: Option<String>,
    /// Part condition exactly as written. Common codes: FN, NE, NS, OH, SV, RP, AR, BER, US, MOD.
    pub condition_code: Option<String>,
    /// Certifications listed for this part (e.g. 'FAA 8130-3', 'EASA Form 1'). Ignore general disclaimers.
    #[serde(default)]
    pub certifications: Vec<String>,
    /// Certification document type on the physical part label
    pub tag_type: Option<String>,
    /// Company that applied the tag
    pub tagged_by: Option<String>,
    /// Date the tag was applied
    pub tagged_date: Option<String>,
    /// Traceability reference (airline, fleet, removal source)
    pub trace_to: Option<String>,
}

/// One vendor quote for a part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Quote {
    /// Quote number (Quote ID, Quote No., Quote), exactly as shown
    pub quote_number: Option<String>,
    /// RFQ reference (RFQ ID, Quote Ref, Your Ref). Do not confuse with the quote number.
    pub rfq_number: Option<String>,
    /// The physical part being offered
    pub part: Part,
    /// Minimum order quantity, numeric value only
    #[schemars(range(min = 1))]
    pub minimum_order_quantity: Option<u32>,
    /// Quantity offered (Qty, Quantity), numeric value only
    #[schemars(range(min = 1))]
    pub quantity: Option<u32>,
    /// Units as written (EA, Each, Set, Pair, Box)
    pub unit_of_measure: Option<String>,
    /// Quoted price per unit
    #[schemars(range(min = 0))]
    pub unit_price: Option<f64>,
    #[schemars(range(min = 0))]
    pub additional_charges: Option<f64>,
    #[schemars(range(min = 0))]
    pub total_price: Option<f64>,
    /// Currency (USD, EUR, GBP, $, £, €)
    pub currency: Option<String>,
    /// Price type, full phrase (outright, exchange, flat exchange, loan)
    pub price_type: Option<String>,
    /// Charge if the exchange core is not returned, numeric value only
    #[schemars(range(min = 0))]
    pub core_charge: Option<f64>,
    /// Pricing method, full phrase (Flat Rate, Cost + OHC, T&M, Fixed Exchange)
    pub cost_method: Option<String>,
    /// Date the core must be returned
    pub core_due: Option<String>,
    /// Payment terms as written
    pub payment_terms: Option<String>,
    /// Delivery terms including location codes (EXW, FOB, DDP, FCA VNO)
    pub delivery_terms: Option<String>,
    /// Lead time exactly as found (Stock, 2 days, 72 hours, Backorder)
    pub lead_time: Option<String>,
    /// Warranty terms as written
    pub warranty: Option<String>,
    /// Supplier comments as written, including non-numeric price notes like 'Make Offer'
    pub supplier_comments: Option<String>,
    /// Quote expiration date as written
    pub quote_expiration_date: Option<String>,
}

/// Everything extracted from one vendor quote document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuoteDocument {
    /// Vendor responses in the document. Several quotes for the same part are kept separate. Buyer RFQ sections are ignored.
    pub quotes: Vec<Quote>,
    /// Vendor information for the whole document
    pub vendor: Vendor,
}

/// A buyer's request for quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rfq {
    /// RFQ identifier ('RFQ ID', 'RFQ No.', 'RFQ'), exactly as shown
    pub rfq_number: Option<String>,
    pub part: Part,
    /// Urgency (routine, critical, AOG)
    pub priority: Option<String>,
    /// Quantity from the Qty column, numeric value only
    #[schemars(range(min = 1))]
    pub quantity_requested: Option<u32>,
    /// Unit of measure (U/M, UOM). Never a number.
    pub unit_of_measure: Option<String>,
    /// Requested price type (Outright, Exchange, Fixed)
    pub price_type: Option<String>,
    /// Special instructions or notes from the buyer
    pub buyer_comments: Option<String>,
}

/// Key/value label for search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TagItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FormulaVariable {
    pub name: String,
    pub value: f64,
}

/// A typed value inside a [`Term`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermValue {
    Money {
        amount: f64,
        /// ISO 4217 code
        currency: String,
    },
    Percentage {
        /// 0 to 100
        value: f64,
    },
    Number {
        value: f64,
    },
    Boolean {
        value: bool,
    },
    Text {
        value: String,
    },
    Duration {
        days: i64,
    },
    Date {
        value: NaiveDate,
    },
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Rate {
        amount: f64,
        currency: Option<String>,
        numerator_unit: Option<String>,
        denominator_unit: Option<String>,
        /// Human-readable form
        formula: Option<String>,
    },
    Formula {
        expression: String,
        #[serde(default)]
        variables: Vec<FormulaVariable>,
    },
}

/// Where in the document a term came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SourceRef {
    pub page: Option<u32>,
    /// `[start_char, end_char]`
    pub span: Option<Vec<u32>>,
    pub snippet: Option<String>,
}

/// One typed fact with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Term {
    /// Stable key, e.g. 'payment_terms_days'
    pub key: String,
    pub value: TermValue,
    pub section: Option<String>,
    pub source: Option<SourceRef>,
}

/// A fuel supplier's response to a tender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FuelBid {
    /// Supplier submitting this bid
    pub vendor: Vendor,
    /// Title or reference name of the bid
    pub title: Option<String>,
    /// Bid round number if there are several rounds
    pub round: Option<u32>,
    /// Date the bid was submitted
    pub bid_submitted_at: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_address: Option<String>,
    pub vendor_contact_name: Option<String>,
    pub vendor_contact_email: Option<String>,
    pub vendor_contact_phone: Option<String>,
    /// Supplier notes about the bid
    pub vendor_comments: Option<String>,
    /// 'fixed' for set prices, 'index_formula' for market-indexed pricing
    pub price_type: Option<String>,
    /// Unit of measure: USG, L, m3 or MT
    pub uom: Option<String>,
    /// ISO 4217 currency code
    pub currency: Option<String>,
    /// Payment terms as stated (e.g. 'Net 30 days')
    pub payment_terms: Option<String>,
    /// Fixed price per unit, numeric value only
    pub base_unit_price: Option<f64>,
    /// Pricing index (e.g. 'Platts Jet A-1 Med', 'Argus')
    pub index_name: Option<String>,
    /// Market location of the index
    pub index_location: Option<String>,
    /// Plus or minus adjustment to the index price
    pub differential: Option<f64>,
    /// Unit of the differential (e.g. 'USD_per_USG', 'cents_per_gallon')
    pub differential_unit: Option<String>,
    /// Notes on the pricing formula
    pub formula_notes: Option<String>,
    pub into_plane_fee: Option<f64>,
    pub handling_fee: Option<f64>,
    pub other_fee: Option<f64>,
    pub other_fee_description: Option<String>,
    pub includes_taxes: Option<bool>,
    pub includes_airport_fees: Option<bool>,
    /// Density at 15°C in kg/m³, for mass-based pricing
    pub density_at_15c: Option<f64>,
    /// Computed unit price in USD per US gallon
    pub normalized_unit_price_usd_per_usg: Option<f64>,
    /// One to three sentences on the bid's material commercial and technical points. No speculation.
    pub ai_summary: Option<String>,
    /// Typed facts for anything that needs arithmetic, validation or precise comparison
    #[serde(default)]
    pub terms: Vec<Term>,
    /// Short labels for search; not a substitute for terms
    pub tags: Option<Vec<TagItem>>,
}

/// Contract category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FuelSupply,
    GroundHandling,
    Maintenance,
    PartsSupply,
    Lease,
    Service,
    Other,
}

/// A supply or service agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    pub vendor: Vendor,
    pub buyer_name: Option<String>,
    pub title: Option<String>,
    pub contract_type: Option<ContractType>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub summary: Option<String>,
    #[serde(default)]
    pub terms: Vec<Term>,
    pub tags: Option<Vec<TagItem>>,
}

/// A supplier invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Supplier issuing the invoice
    pub vendor: Vendor,
    /// Free-text notes from the vendor
    pub vendor_comments: Option<String>,
    /// Official invoice number from the document header
    pub invoice_number: Option<String>,
    /// Date issued ('Invoice Date', 'Issued On')
    pub invoice_date: Option<NaiveDate>,
    /// received, approved, paid or disputed
    pub status: Option<String>,
    /// Three to six sentences: vendor, period, major charges, total
    pub summary: Option<String>,
    /// How the totals were computed: quantities, rates, surcharges, credits, taxes
    pub charges_narrative: Option<String>,
    /// Discrepancies, exceptions or potential disputes
    pub disputes_notes: Option<String>,
    /// Metadata for filtering (e.g. vatRate, costCenter)
    pub tags: Option<BTreeMap<String, String>>,
    /// Start of the billing period
    pub period_start: Option<NaiveDate>,
    /// End of the billing period
    pub period_end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::validate_json;
    use serde_json::json;

    #[test]
    fn test_document_schema_is_self_contained() {
        let schema = document_schema::<QuoteDocument>();
        let text = schema.to_string();

        assert!(!text.contains("$ref"));
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["properties"]["quotes"]["type"], "array");
        assert!(schema["properties"]["quotes"]["items"]["properties"]["part"].is_object());
    }

    #[test]
    fn test_quote_payload_validates_and_parses() {
        let payload = json!({
            "quotes": [{
                "quote_number": "Q-1001",
                "rfq_number": "RS225",
                "part": {"part_number": "8061-536-001", "condition_code": "SV", "certifications": ["FAA 8130-3"]},
                "quantity": 2,
                "unit_price": 1450.0,
                "currency": "USD",
                "lead_time": "Stock"
            }],
            "vendor": {"name": "Acme Aero"}
        });

        validate_json(&document_schema::<QuoteDocument>(), &payload).unwrap();
        let doc: QuoteDocument = serde_json::from_value(payload).unwrap();
        assert_eq!(doc.quotes[0].part.certifications, vec!["FAA 8130-3"]);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let payload = json!({"quotes": [{"part": {}, "quantity": 0}], "vendor": {}});
        let err = validate_json(&document_schema::<QuoteDocument>(), &payload).unwrap_err();
        assert!(err.contains("quantity"));
    }

    #[test]
    fn test_term_values_are_tagged() {
        let term: Term = serde_json::from_value(json!({
            "key": "into_plane_fee",
            "value": {"type": "rate", "amount": 0.02, "currency": "USD", "numerator_unit": "USD", "denominator_unit": "USG", "formula": null},
            "section": "Fees",
            "source": {"page": 2, "span": null, "snippet": "ITP fee 2c/USG"}
        }))
        .unwrap();

        assert!(matches!(term.value, TermValue::Rate { amount, .. } if amount == 0.02));
    }

    #[test]
    fn test_invoice_uses_camel_case_keys() {
        let invoice: Invoice = serde_json::from_value(json!({
            "vendor": {"name": "FuelCo"},
            "invoiceNumber": "INV-7",
            "invoiceDate": "2025-02-01",
            "periodEnd": "2025-01-31"
        }))
        .unwrap();

        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-7"));
        assert_eq!(invoice.period_end, NaiveDate::from_ymd_opt(2025, 1, 31));
    }
}
