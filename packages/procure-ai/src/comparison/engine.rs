//! Rubric-based comparison of procurement records.

use std::time::Instant;

use tracing::{error, info};

use crate::comparison::profile::ComparisonProfile;
use crate::comparison::prompt;
use crate::comparison::repair::{fallback_winner, repair};
use crate::context::CallContext;
use crate::error::ComparisonError;
use crate::generation::GenerationAdapter;
use crate::traits::RecordSource;
use crate::types::{ComparisonResult, GenerationRequest, SourceRecord, Winner, NO_WINNER};

/// Scores a set of records with a generation provider and picks a winner.
///
/// Every entry point returns a [`ComparisonResult`]. Failures are folded
/// into a safe default whose text carries the error, and whose winner is
/// still one of the compared ids when there were any.
#[derive(Clone)]
pub struct ComparisonEngine {
    adapter: GenerationAdapter,
    profile: ComparisonProfile,
}

impl ComparisonEngine {
    pub fn new(adapter: GenerationAdapter) -> Self {
        Self {
            adapter,
            profile: ComparisonProfile::quotes(),
        }
    }

    pub fn with_profile(mut self, profile: ComparisonProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &ComparisonProfile {
        &self.profile
    }

    pub async fn compare(&self, records: &[SourceRecord]) -> ComparisonResult {
        self.compare_with(records, &CallContext::default()).await
    }

    pub async fn compare_with(
        &self,
        records: &[SourceRecord],
        ctx: &CallContext,
    ) -> ComparisonResult {
        if records.is_empty() {
            return self.empty_result();
        }

        let ids: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(i, r)| self.profile.record_id(i, r))
            .collect();

        let started = Instant::now();
        match self.analyze(records, &ids, ctx).await {
            Ok(result) => {
                info!(
                    items = ids.len(),
                    winner = %result.winner.id,
                    confidence = result.winner.confidence,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Comparison completed"
                );
                result
            }
            Err(e) => {
                error!(items = ids.len(), error = %e, "Comparison failed, returning safe default");
                self.failed_result(&ids, &e)
            }
        }
    }

    /// Load the records under `parent_id` and compare them.
    pub async fn compare_for<S: RecordSource>(
        &self,
        source: &S,
        parent_id: &str,
    ) -> ComparisonResult {
        match source.list_records_by(parent_id).await {
            Ok(records) => self.compare(&records).await,
            Err(e) => {
                let err = ComparisonError::Source(Box::new(e));
                error!(parent_id, error = %err, "Comparison failed, returning safe default");
                self.failed_result(&[], &err)
            }
        }
    }

    async fn analyze(
        &self,
        records: &[SourceRecord],
        ids: &[String],
        ctx: &CallContext,
    ) -> Result<ComparisonResult, ComparisonError> {
        let projected = records
            .iter()
            .enumerate()
            .map(|(i, r)| self.profile.project(i, r))
            .collect::<Result<Vec<_>, _>>()?;

        let label = &self.profile.item_label;
        let request = GenerationRequest::prompt(prompt::user_message(label, &projected)?)
            .with_system(prompt::system_message(label));

        let mut result = self
            .adapter
            .generate_structured_with::<ComparisonResult>(request, ctx)
            .await?
            .value;

        repair(&mut result, ids);
        Ok(result)
    }

    fn empty_result(&self) -> ComparisonResult {
        let label = &self.profile.item_label;
        ComparisonResult {
            comparison_analysis: format!("No {label} found to compare."),
            items: Vec::new(),
            winner: Winner {
                id: NO_WINNER.to_string(),
                reason: format!("No {label} were supplied"),
                confidence: 0.0,
            },
            summary: format!("Nothing to compare: no {label} were supplied."),
        }
    }

    fn failed_result(&self, ids: &[String], err: &ComparisonError) -> ComparisonResult {
        ComparisonResult {
            comparison_analysis: format!("AI analysis failed: {err}"),
            items: Vec::new(),
            winner: fallback_winner(ids, "No winner selected: AI analysis failed"),
            summary: format!(
                "Comparison of {} could not be completed: {err}",
                self.profile.item_label
            ),
        }
    }
}
