//! Script execution against a session

use crate::script::{EditScript, ScriptStep};
use anyhow::{bail, Context};
use dayplan_changes::{ReconcileOutcome, TransactionRequest};
use dayplan_model::{PlaceResult, PoiId, RemoteDayState};
use dayplan_session::{
    ApplyOutcome, DayEditingSession, FailureKind, SearchOutcome, SessionError, SessionPhase,
};
use serde::Serialize;
use tracing::info;

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// One-based position in the script; `0` for the closing apply
    pub index: usize,
    /// Step tag
    pub op: &'static str,
    /// Human-readable result
    pub result: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Per-step results
    pub steps: Vec<StepRecord>,
    /// Transactions built by apply steps, submitted or not
    pub transactions: Vec<TransactionRequest>,
    /// Outcomes of submitted transactions
    pub applied: Vec<ApplyOutcome>,
    /// Edits still pending at the end of the run
    pub pending: Option<TransactionRequest>,
    /// Final baseline
    pub day: Option<RemoteDayState>,
}

/// Drives a [`DayEditingSession`] through an [`EditScript`]
///
/// Without `submit`, apply steps only record the transaction they would
/// send. With it they submit, and edits left pending after the last
/// step are applied once more at the end.
pub struct ScriptRunner {
    session: DayEditingSession,
    submit: bool,
}

impl ScriptRunner {
    /// Runner over `session`
    #[must_use]
    pub fn new(session: DayEditingSession, submit: bool) -> Self {
        Self { session, submit }
    }

    /// Session being driven
    #[inline]
    #[must_use]
    pub fn session(&self) -> &DayEditingSession {
        &self.session
    }

    /// Load the day if needed and execute every step
    ///
    /// Apply failures are recorded and the run continues, so a script can
    /// refresh and retry after a conflict.
    ///
    /// # Errors
    /// Returns error if the initial load fails or a step is rejected
    pub async fn run(&self, script: &EditScript) -> anyhow::Result<RunReport> {
        if self.session.phase() != SessionPhase::Ready {
            self.session.load().await.context("initial load failed")?;
        }

        let mut report = RunReport::default();
        for (i, step) in script.steps.iter().enumerate() {
            let index = i + 1;
            let result = self
                .step(step, &mut report)
                .await
                .with_context(|| format!("step {index} ({}) failed", step.op()))?;
            info!(step = index, op = step.op(), %result);
            report.steps.push(StepRecord {
                index,
                op: step.op(),
                result,
            });
        }

        if self.submit && self.session.has_changes() {
            let result = self.apply(&mut report).await?;
            info!(op = "apply", %result, "closing apply");
            report.steps.push(StepRecord {
                index: 0,
                op: "apply",
                result,
            });
        }

        report.pending = if self.session.has_changes() {
            self.session.transaction_preview()
        } else {
            None
        };
        report.day = self.session.baseline();
        Ok(report)
    }

    async fn step(&self, step: &ScriptStep, report: &mut RunReport) -> anyhow::Result<String> {
        let session = &self.session;
        let result = match step {
            ScriptStep::Tempo { value } => describe(session.update_tempo(*value)?),
            ScriptStep::TimeWindow { start, end } => {
                describe(session.update_time_window(*start, *end)?)
            }
            ScriptStep::Budget { value } => describe(session.update_budget(*value)?),
            ScriptStep::Preset { value } => describe(session.select_preset(*value)?),
            ScriptStep::Wish { text } => describe(session.add_wish(text)?),
            ScriptStep::Search { query } => match session.search_places(query).await {
                SearchOutcome::Completed(places) => match session.last_error() {
                    Some(err) if places.is_empty() && err.kind == FailureKind::Search => {
                        format!("search failed: {}", err.message)
                    }
                    _ => format!("{} results", places.len()),
                },
                SearchOutcome::Skipped => "query too short".to_string(),
                SearchOutcome::Discarded => "discarded".to_string(),
            },
            ScriptStep::AddPlace { result, placement } => {
                let place = self.search_result(*result)?;
                describe(session.add_place(place, placement.clone())?)
            }
            ScriptStep::MarkReplace { poi } => {
                describe(session.mark_for_replacement(&PoiId::new(poi.as_str())?)?)
            }
            ScriptStep::ReplaceWith { poi, result } => {
                let place = self.search_result(*result)?;
                describe(session.replace_place_with(&PoiId::new(poi.as_str())?, &place)?)
            }
            ScriptStep::Remove { poi } => {
                describe(session.remove_place(&PoiId::new(poi.as_str())?)?)
            }
            ScriptStep::Refresh => {
                let loaded = session.load().await?;
                match loaded.rebase {
                    Some(rebase) if !rebase.is_clean() => format!(
                        "now at {}, dropped {} pending edits",
                        loaded.revision,
                        rebase.dropped.len()
                    ),
                    _ => format!("now at {}", loaded.revision),
                }
            }
            ScriptStep::Reset => {
                session.reset()?;
                "edits discarded".to_string()
            }
            ScriptStep::Apply => self.apply(report).await?,
        };
        Ok(result)
    }

    async fn apply(&self, report: &mut RunReport) -> anyhow::Result<String> {
        let Some(request) = self.session.transaction_preview() else {
            bail!("no day loaded");
        };
        if request.is_empty() {
            return Ok("nothing to apply".to_string());
        }
        let changes = request.len();
        report.transactions.push(request);
        if !self.submit {
            return Ok(format!("dry run, {changes} changes not submitted"));
        }

        match self.session.apply().await {
            Ok(outcome) => {
                report.applied.push(outcome);
                Ok(match outcome {
                    ApplyOutcome::Applied { revision, changes } => {
                        format!("applied {changes} changes, now at {revision}")
                    }
                    ApplyOutcome::NothingToApply => "nothing to apply".to_string(),
                })
            }
            Err(SessionError::Apply(err)) if err.is_conflict() => {
                Ok(format!("{err}; refresh before retrying"))
            }
            Err(SessionError::Apply(err)) => Ok(format!("apply failed: {err}")),
            Err(other) => Err(other.into()),
        }
    }

    fn search_result(&self, index: usize) -> anyhow::Result<PlaceResult> {
        let results = self.session.search_results();
        let available = results.len();
        results.into_iter().nth(index).with_context(|| {
            format!("no search result {index}, last search returned {available}")
        })
    }
}

fn describe(outcome: ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Added => "recorded",
        ReconcileOutcome::Replaced => "superseded earlier edit",
        ReconcileOutcome::RoundTripped => "back at baseline, edit dropped",
        ReconcileOutcome::Removed => "toggled off",
        ReconcileOutcome::Unchanged => "unchanged",
    }
    .to_string()
}
