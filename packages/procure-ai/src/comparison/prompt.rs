//! Scoring rubric prompt.

use crate::types::ComparableRecord;

/// Scorecard criteria, in prompt order.
pub const CRITERIA: [&str; 5] = ["price", "delivery", "lead_time", "quality", "service"];

pub fn system_message(item_label: &str) -> String {
    format!(
        "You are an expert {item_label} analyst. Be precise and objective. \
         If data is missing, say 'unknown'. Do not invent values."
    )
}

/// User message: criteria, the records as JSON, and the output rules.
pub fn user_message(item_label: &str, records: &[ComparableRecord]) -> serde_json::Result<String> {
    let records_json = serde_json::to_string(records)?;
    let ids = records
        .iter()
        .map(|r| format!("\"{}\"", r.id))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "Compare the following {item_label} and produce a structured result.\n\n\
         Criteria to compare: {criteria}\n\n\
         Items JSON:\n{records_json}\n\n\
         Rules:\n\
         - Assess every item once; items[].id must be the item's id.\n\
         - Score each criterion with a number between 0 and 10. Higher is better.\n\
         - scorecard.total must equal the sum of the five criteria.\n\
         - winner.id must be one of: {ids}.\n\
         - winner.confidence is a number between 0 and 1.\n\
         - Where data is missing write 'unknown'; do not guess values.\n\
         - Output JSON only, no markdown, no commentary.",
        criteria = CRITERIA.join(", "),
    ))
}
