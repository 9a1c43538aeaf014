//! Integration tests for comparison and generation.
//!
//! These tests verify the comparison workflow end to end:
//! 1. Project stored records onto a profile
//! 2. Sanitize decimals and nested values into plain JSON
//! 3. Score with a provider picked from the registry
//! 4. Repair totals, confidence and winner

use std::sync::Arc;

use futures::StreamExt;
use procure_ai::testing::{MemoryRecordSource, MockProvider, MockProviderCall};
use procure_ai::types::NO_WINNER;
use procure_ai::{
    ComparisonEngine, ComparisonProfile, GenerationAdapter, GenerationRequest, ProviderRegistry,
    RetryPolicy, SourceRecord, Usage,
};
use rust_decimal::Decimal;
use serde_json::json;

fn fuel_bids() -> Vec<SourceRecord> {
    vec![
        SourceRecord::new()
            .with_id("bid-1")
            .field("vendor_name", "World Fuel")
            .field("title", "KMSP Q3")
            .field("base_unit_price", Decimal::new(2875, 3))
            .field("includes_taxes", false),
        SourceRecord::new()
            .field("vendor_name", "Avfuel")
            .field("title", "KMSP Q3")
            .field("differential", Decimal::new(-12, 2))
            .field("index_name", "Platts Gulf Coast")
            .field("terms", json!([{"name": "Payment", "value": "Net 30"}])),
    ]
}

fn reply() -> String {
    json!({
        "comparison_analysis": "Avfuel tracks the index closely",
        "items": [
            {"id": "bid-1", "strengths": ["fixed price"], "weaknesses": ["taxes excluded"],
             "scorecard": {"price": 6, "delivery": 8, "lead_time": 7, "quality": 8, "service": 12, "total": 50}},
            {"id": "idx_2_Avfuel_KMSP Q3", "strengths": ["index-linked"], "weaknesses": [],
             "scorecard": {"price": 8, "delivery": 8, "lead_time": 7, "quality": 8, "service": 8, "total": 39}}
        ],
        "winner": {"id": "Avfuel", "reason": "lowest differential", "confidence": 1.4},
        "summary": "Avfuel"
    })
    .to_string()
}

fn registry(mock: MockProvider) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new().with_retry(RetryPolicy::none());
    registry.register(Arc::new(MockProvider::named("offline").with_health(false)), true);
    registry.register(Arc::new(mock), false);
    registry
}

#[tokio::test]
async fn test_fuel_bid_comparison_is_repaired() {
    let mock = MockProvider::named("openai").with_text(reply());
    let registry = registry(mock.clone());
    registry.initialize().await;

    let adapter = registry.adapter(None).unwrap();
    assert_eq!(adapter.provider_name(), "openai");

    let engine = ComparisonEngine::new(adapter).with_profile(ComparisonProfile::fuel_bids());
    let result = engine.compare(&fuel_bids()).await;

    let ids: Vec<&str> = result.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["bid-1", "idx_2_Avfuel_KMSP Q3"]);

    for item in &result.items {
        let card = item.scorecard;
        assert!((card.total - card.criteria_sum()).abs() < 1e-6);
        assert!(card.service <= 10.0);
    }

    assert_eq!(result.winner.id, "bid-1");
    assert_eq!(result.winner.confidence, 0.0);
    assert!(result.winner.reason.contains("adjusted"));

    match &mock.calls()[0] {
        MockProviderCall::Complete { messages, .. } => {
            let prompt = &messages[1].content;
            assert!(prompt.contains("2.875"));
            assert!(prompt.contains("-0.12"));
            assert!(prompt.contains("Net 30"));
            assert!(prompt.contains("fuel bids"));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_compare_for_unknown_parent_makes_no_call() {
    let mock = MockProvider::new();
    let engine = ComparisonEngine::new(
        GenerationAdapter::new(Arc::new(mock.clone())).with_retry(RetryPolicy::none()),
    );
    let source = MemoryRecordSource::new().with_records("rfq-1", fuel_bids());

    let result = engine.compare_for(&source, "rfq-404").await;

    assert_eq!(result.winner.id, NO_WINNER);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_streaming_through_registry() {
    let mock = MockProvider::named("openai")
        .with_stream_deltas(["Once", " upon", " a time"])
        .with_stream_usage(Usage::new(4, 3));
    let registry = registry(mock);
    registry.initialize().await;

    let adapter = registry.adapter(Some("openai")).unwrap();
    let results: Vec<_> = adapter
        .stream_generate(None, GenerationRequest::prompt("tell me a story"))
        .collect()
        .await;

    let contents: Vec<String> = results
        .iter()
        .map(|r| r.as_ref().unwrap().content.clone())
        .collect();
    assert_eq!(contents, ["Once", "Once upon", "Once upon a time"]);

    let last = results.last().unwrap().as_ref().unwrap();
    assert!(last.is_final);
    assert_eq!(last.usage.total_tokens, 7);
}
