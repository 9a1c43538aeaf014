//! Comparison of procurement records.
//!
//! Records are projected onto a [`ComparisonProfile`], sanitized to plain
//! JSON, scored by a generation provider against a fixed rubric, and the
//! reply is repaired so its totals and winner can be trusted.

mod engine;
mod profile;
mod prompt;
mod repair;
mod sanitize;

pub use engine::ComparisonEngine;
pub use profile::ComparisonProfile;
pub use prompt::CRITERIA;
pub use sanitize::sanitize;
