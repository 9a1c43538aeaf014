//! Built-in extraction specs, one per document kind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::specs::documents::{document_schema, Contract, FuelBid, Invoice, QuoteDocument, Rfq};
use crate::specs::prompts;
use crate::types::ExtractionAgentSpec;

/// Procurement document types with a dedicated extraction agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quote,
    Rfq,
    FuelBid,
    Contract,
    Invoice,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        Self::Quote,
        Self::Rfq,
        Self::FuelBid,
        Self::Contract,
        Self::Invoice,
    ];

    /// Agent name on the extraction service.
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Quote => "fleet-ai-quote-extractor",
            Self::Rfq => "fleet-ai-rfq-extractor",
            Self::FuelBid => "fleet-ai-fuel-bid-extractor",
            Self::Contract => "fleet-ai-contract-extractor",
            Self::Invoice => "fleet-ai-invoice-extractor",
        }
    }

    /// Label used in logs and user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Quote => "Quote",
            Self::Rfq => "RFQ",
            Self::FuelBid => "Fuel Bid",
            Self::Contract => "Contract",
            Self::Invoice => "Invoice",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Rfq => "rfq",
            Self::FuelBid => "fuel_bid",
            Self::Contract => "contract",
            Self::Invoice => "invoice",
        }
    }

    /// The spec with its schema, prompt and default allow-lists.
    pub fn spec(self) -> ExtractionAgentSpec {
        let (schema, prompt) = match self {
            Self::Quote => (document_schema::<QuoteDocument>(), prompts::QUOTE_EXTRACTOR),
            Self::Rfq => (document_schema::<Rfq>(), prompts::RFQ_EXTRACTOR),
            Self::FuelBid => (document_schema::<FuelBid>(), prompts::FUEL_BID_EXTRACTOR),
            Self::Contract => (document_schema::<Contract>(), prompts::CONTRACT_EXTRACTOR),
            Self::Invoice => (document_schema::<Invoice>(), prompts::INVOICE_EXTRACTOR),
        };
        let spec = ExtractionAgentSpec::new(self.agent_name(), self.label(), schema, prompt);

        // Fuel bids arrive as PDF or Word 2007+ only
        match self {
            Self::FuelBid => spec.with_allowed_types(
                [".pdf", ".docx"],
                [
                    "application/pdf",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                ],
            ),
            _ => spec,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "quote" | "quotes" => Ok(Self::Quote),
            "rfq" => Ok(Self::Rfq),
            "fuel_bid" | "fuelbid" => Ok(Self::FuelBid),
            "contract" => Ok(Self::Contract),
            "invoice" => Ok(Self::Invoice),
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

/// Specs keyed by document kind.
///
/// Built once at startup; the allow-lists can be overridden from
/// configuration.
#[derive(Debug, Clone)]
pub struct DocumentSpecRegistry {
    specs: BTreeMap<DocumentKind, ExtractionAgentSpec>,
}

impl DocumentSpecRegistry {
    /// Every built-in kind.
    pub fn builtin() -> Self {
        Self {
            specs: DocumentKind::ALL.iter().map(|k| (*k, k.spec())).collect(),
        }
    }

    /// Replace the allow-lists of every kind that uses the defaults.
    pub fn with_allowed_types(mut self, extensions: &[String], mime_types: &[String]) -> Self {
        for (kind, spec) in self.specs.iter_mut() {
            if *kind != DocumentKind::FuelBid {
                *spec = spec
                    .clone()
                    .with_allowed_types(extensions.iter().cloned(), mime_types.iter().cloned());
            }
        }
        self
    }

    /// Override one kind's spec.
    pub fn insert(&mut self, kind: DocumentKind, spec: ExtractionAgentSpec) {
        self.specs.insert(kind, spec);
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&ExtractionAgentSpec> {
        self.specs.get(&kind)
    }

    pub fn all(&self) -> impl Iterator<Item = &ExtractionAgentSpec> {
        self.specs.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.specs.keys().copied()
    }
}

impl Default for DocumentSpecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_kind() {
        let registry = DocumentSpecRegistry::builtin();
        assert_eq!(registry.all().count(), 5);

        let quote = registry.get(DocumentKind::Quote).unwrap();
        assert_eq!(quote.name, "fleet-ai-quote-extractor");
        assert_eq!(quote.label, "Quote");
        assert!(quote.system_prompt.contains("aviation quote documents"));
        assert!(quote.schema["properties"]["quotes"].is_object());
    }

    #[test]
    fn test_fuel_bid_only_accepts_pdf_and_docx() {
        let spec = DocumentKind::FuelBid.spec();
        assert_eq!(spec.allowed_extensions, vec![".pdf", ".docx"]);

        let registry = DocumentSpecRegistry::builtin()
            .with_allowed_types(&[".pdf".to_string()], &["application/pdf".to_string()]);
        assert_eq!(registry.get(DocumentKind::Rfq).unwrap().allowed_extensions, vec![".pdf"]);
        assert_eq!(
            registry.get(DocumentKind::FuelBid).unwrap().allowed_extensions,
            vec![".pdf", ".docx"]
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("fuel-bid".parse::<DocumentKind>(), Ok(DocumentKind::FuelBid));
        assert_eq!("RFQ".parse::<DocumentKind>(), Ok(DocumentKind::Rfq));
        assert!("purchase_order".parse::<DocumentKind>().is_err());
        assert_eq!(DocumentKind::FuelBid.to_string(), "fuel_bid");
    }
}
