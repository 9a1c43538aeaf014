//! Built-in procurement document specs.

pub mod documents;
pub mod prompts;
mod registry;

pub use documents::{
    document_schema, Contract, ContractType, FuelBid, Invoice, Part, Quote, QuoteDocument, Rfq,
    Term, TermValue, Vendor,
};
pub use registry::{DocumentKind, DocumentSpecRegistry};
