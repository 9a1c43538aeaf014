//! Comparison output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Winner id used when nothing was compared.
pub const NO_WINNER: &str = "none";

/// Per-item scores, each criterion on a 0 to 10 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreCard {
    pub price: f64,
    pub delivery: f64,
    pub lead_time: f64,
    pub quality: f64,
    pub service: f64,
    /// Sum of the five criteria
    pub total: f64,
}

impl ScoreCard {
    pub fn criteria_sum(&self) -> f64 {
        self.price + self.delivery + self.lead_time + self.quality + self.service
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemAssessment {
    /// Must be one of the compared item ids
    pub id: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub scorecard: ScoreCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Winner {
    /// Must be one of the compared item ids
    pub id: String,
    pub reason: String,
    /// 0.0 to 1.0
    pub confidence: f64,
}

/// Ranked assessment of a set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonResult {
    pub comparison_analysis: String,
    pub items: Vec<ItemAssessment>,
    pub winner: Winner,
    pub summary: String,
}
