//! Script replay against the in-memory backend

use dayplan_cli::{EditScript, ScriptRunner};
use dayplan_model::{Revision, Tempo};
use dayplan_session::TransactionError;
use dayplan_test_utils::{day_key, loaded_session, memory_backend, open_session, ScriptedBackend};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const SCRIPT: &str = r#"
[[step]]
op = "tempo"
value = "high"

[[step]]
op = "search"
query = "coffee"

[[step]]
op = "add_place"
result = 0
placement = { mode = "into_slot", poiId = "poi_2" }

[[step]]
op = "wish"
text = "finish near the beach"

[[step]]
op = "apply"
"#;

#[tokio::test]
async fn dry_run_records_the_transaction_without_sending_it() {
    let backend = memory_backend();
    let runner = ScriptRunner::new(open_session(backend.clone()), false);

    let report = runner
        .run(&EditScript::from_toml_str(SCRIPT).unwrap())
        .await
        .unwrap();

    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.transactions[0].base_revision, Revision(5));
    assert_eq!(report.transactions[0].len(), 3);
    assert!(report.applied.is_empty());
    assert_eq!(report.pending.as_ref(), Some(&report.transactions[0]));
    assert_eq!(report.steps[1].result, "2 results");
    assert_eq!(backend.day(&day_key()).unwrap().revision, Revision(5));
}

#[tokio::test]
async fn submitting_applies_and_installs_the_new_day() {
    let backend = memory_backend();
    let runner = ScriptRunner::new(open_session(backend.clone()), true);

    let report = runner
        .run(&EditScript::from_toml_str(SCRIPT).unwrap())
        .await
        .unwrap();

    assert_eq!(report.applied.len(), 1);
    assert!(report.pending.is_none());
    let day = report.day.unwrap();
    assert_eq!(day.revision, Revision(6));
    assert_eq!(day.tempo, Tempo::High);
    assert_eq!(day.points_of_interest.len(), 4);
    assert_eq!(day.points_of_interest[1].name, "Satan's Coffee Corner");
    assert_eq!(backend.day(&day_key()).unwrap(), day);
}

#[tokio::test]
async fn leftover_edits_are_applied_at_the_end() {
    let backend = memory_backend();
    let runner = ScriptRunner::new(open_session(backend.clone()), true);
    let script = EditScript::from_toml_str(
        r#"
[[step]]
op = "budget"
value = "high"
"#,
    )
    .unwrap();

    let report = runner.run(&script).await.unwrap();

    let last = report.steps.last().unwrap();
    assert_eq!((last.index, last.op), (0, "apply"));
    assert_eq!(report.day.unwrap().revision, Revision(6));
}

#[tokio::test]
async fn conflict_is_reported_and_refresh_allows_retry() {
    let scripted = Arc::new(ScriptedBackend::new(memory_backend()));
    scripted.fail_next_apply(TransactionError::Conflict {
        current_revision: None,
    });
    let runner = ScriptRunner::new(loaded_session(scripted.clone()).await, true);
    let script = EditScript::from_toml_str(
        r#"
[[step]]
op = "tempo"
value = "low"

[[step]]
op = "apply"

[[step]]
op = "refresh"

[[step]]
op = "apply"
"#,
    )
    .unwrap();

    let report = runner.run(&script).await.unwrap();

    assert!(report.steps[1].result.ends_with("refresh before retrying"));
    assert_eq!(report.steps[2].result, "now at r5");
    assert_eq!(report.steps[3].result, "applied 1 changes, now at r6");
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(scripted.apply_calls(), 2);
}

#[tokio::test]
async fn bad_result_index_names_the_step() {
    let runner = ScriptRunner::new(open_session(memory_backend()), false);
    let script = EditScript::from_toml_str(
        r#"
[[step]]
op = "add_place"
result = 3
"#,
    )
    .unwrap();

    let err = runner.run(&script).await.unwrap_err();
    assert!(format!("{err:#}").contains("step 1 (add_place) failed"));
}

#[tokio::test]
async fn unknown_stop_is_rejected() {
    let runner = ScriptRunner::new(open_session(memory_backend()), false);
    let script = EditScript::from_toml_str(
        r#"
[[step]]
op = "remove"
poi = "poi_404"
"#,
    )
    .unwrap();

    assert!(runner.run(&script).await.is_err());
}
