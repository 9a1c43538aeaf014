//! Post-generation fixes that make a comparison result trustworthy.

use tracing::warn;

use crate::types::{ComparisonResult, ScoreCard, Winner};

const TOTAL_TOLERANCE: f64 = 1e-6;

/// Winner used when the model's pick is not among the compared ids.
pub fn fallback_winner(ids: &[String], reason: impl Into<String>) -> Winner {
    Winner {
        id: ids.first().cloned().unwrap_or_else(|| crate::types::NO_WINNER.to_string()),
        reason: reason.into(),
        confidence: 0.0,
    }
}

/// Clamp scores, recompute totals, clamp confidence, and replace an
/// unknown winner.
pub fn repair(result: &mut ComparisonResult, ids: &[String]) {
    for item in &mut result.items {
        repair_scorecard(&item.id, &mut item.scorecard);
    }

    let confidence = clamp(result.winner.confidence, 0.0, 1.0);
    if confidence != result.winner.confidence {
        warn!(
            reported = result.winner.confidence,
            clamped = confidence,
            "Winner confidence out of range"
        );
        result.winner.confidence = confidence;
    }

    if !ids.iter().any(|id| *id == result.winner.id) {
        warn!(winner = %result.winner.id, "Winner is not a compared item, using fallback");
        let reason = format!(
            "Winner adjusted: model chose '{}', which is not among the compared items",
            result.winner.id
        );
        result.winner = fallback_winner(ids, reason);
    }
}

fn repair_scorecard(id: &str, card: &mut ScoreCard) {
    for score in [
        &mut card.price,
        &mut card.delivery,
        &mut card.lead_time,
        &mut card.quality,
        &mut card.service,
    ] {
        let clamped = clamp(*score, 0.0, 10.0);
        if clamped != *score {
            warn!(item = id, reported = *score, clamped, "Criterion score out of range");
            *score = clamped;
        }
    }

    let sum = card.criteria_sum();
    if !card.total.is_finite() || (card.total - sum).abs() > TOTAL_TOLERANCE {
        warn!(item = id, reported = card.total, recomputed = sum, "Scorecard total recomputed");
        card.total = sum;
    }
}

/// Clamp into `[lo, hi]`; non-finite values go to `lo`.
fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemAssessment;

    fn result(winner: &str, card: ScoreCard, confidence: f64) -> ComparisonResult {
        ComparisonResult {
            comparison_analysis: "analysis".into(),
            items: vec![ItemAssessment {
                id: "q1".into(),
                strengths: vec![],
                weaknesses: vec![],
                scorecard: card,
            }],
            winner: Winner {
                id: winner.into(),
                reason: "cheapest".into(),
                confidence,
            },
            summary: "summary".into(),
        }
    }

    fn ids() -> Vec<String> {
        vec!["q1".into(), "q2".into()]
    }

    #[test]
    fn test_total_is_recomputed() {
        let card = ScoreCard {
            price: 8.0,
            delivery: 7.0,
            lead_time: 6.0,
            quality: 9.0,
            service: 5.0,
            total: 40.0,
        };
        let mut r = result("q1", card, 0.8);
        repair(&mut r, &ids());
        assert_eq!(r.items[0].scorecard.total, 35.0);
    }

    #[test]
    fn test_total_within_tolerance_is_kept() {
        let card = ScoreCard {
            price: 0.1,
            delivery: 0.2,
            lead_time: 0.0,
            quality: 0.0,
            service: 0.0,
            total: 0.3,
        };
        let mut r = result("q1", card, 0.8);
        repair(&mut r, &ids());
        assert_eq!(r.items[0].scorecard.total, 0.3);
    }

    #[test]
    fn test_scores_and_confidence_are_clamped() {
        let card = ScoreCard {
            price: 14.0,
            delivery: -2.0,
            lead_time: f64::NAN,
            quality: 10.0,
            service: 3.0,
            total: 0.0,
        };
        let mut r = result("q2", card, 1.7);
        repair(&mut r, &ids());

        let card = r.items[0].scorecard;
        assert_eq!((card.price, card.delivery, card.lead_time), (10.0, 0.0, 0.0));
        assert_eq!(card.total, 23.0);
        assert_eq!(r.winner.confidence, 1.0);
        assert_eq!(r.winner.id, "q2");
    }

    #[test]
    fn test_unknown_winner_falls_back_to_first_id() {
        let mut r = result("quote-from-nowhere", ScoreCard::default(), 0.9);
        repair(&mut r, &ids());

        assert_eq!(r.winner.id, "q1");
        assert_eq!(r.winner.confidence, 0.0);
        assert!(r.winner.reason.contains("adjusted"));
    }
}
