use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::credentials::Session;
use crate::error::{JudgeError, Result};
use crate::marks::{
    EditRequest, EditRequestStatus, MarkKey, MarkRecord, NewEditRequest, NewMarkRecord,
    PerformanceTier, Rounds,
};
use crate::notify::{self, Notifier};
use crate::scoring::{final_score, validate_rounds};
use crate::store::MarkStore;

/// What a save attempt should do, given what the store already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAction {
    /// No record yet: write it directly.
    Create,
    /// A record exists but holds no marks: overwrite it directly.
    Overwrite { mark_id: String },
    /// An administrator approved an edit: overwrite, then complete the request.
    ApplyApproved { mark_id: String, request_id: String },
    /// Existing marks and no open request: raise one, leave the record alone.
    RaiseRequest {
        mark_id: String,
        previous: Option<EditRequestStatus>,
    },
    /// A request is already waiting for a decision.
    Wait { mark_id: String, request_id: String },
}

/// Decide the next step of the edit-approval workflow. Rejected and
/// completed requests count as "no open request".
pub fn next_action(existing: Option<&MarkRecord>, latest: Option<&EditRequest>) -> SaveAction {
    let Some(record) = existing else {
        return SaveAction::Create;
    };
    let mark_id = record.id.clone();

    if !record.has_data() {
        return SaveAction::Overwrite { mark_id };
    }

    match latest {
        Some(request) if request.status == EditRequestStatus::Pending => SaveAction::Wait {
            mark_id,
            request_id: request.id.clone(),
        },
        Some(request) if request.status == EditRequestStatus::Approved => {
            SaveAction::ApplyApproved {
                mark_id,
                request_id: request.id.clone(),
            }
        }
        other => SaveAction::RaiseRequest {
            mark_id,
            previous: other.map(|request| request.status),
        },
    }
}

/// Result of a save attempt. Only `Created` and `Updated` changed marks.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created {
        mark_id: String,
        final_score: f64,
        notified: bool,
    },
    Updated {
        mark_id: String,
        final_score: f64,
        completed_request: Option<String>,
        notified: bool,
    },
    EditRequested {
        mark_id: String,
        request_id: String,
        previous: Option<EditRequestStatus>,
    },
    /// Informational: the edit waits on an administrator. Do not retry.
    AwaitingApproval { mark_id: String, request_id: String },
}

impl SaveOutcome {
    pub fn mark_id(&self) -> &str {
        match self {
            SaveOutcome::Created { mark_id, .. }
            | SaveOutcome::Updated { mark_id, .. }
            | SaveOutcome::EditRequested { mark_id, .. }
            | SaveOutcome::AwaitingApproval { mark_id, .. } => mark_id,
        }
    }

    pub fn wrote_marks(&self) -> bool {
        matches!(self, SaveOutcome::Created { .. } | SaveOutcome::Updated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> EditRequestStatus {
        match self {
            Decision::Approve => EditRequestStatus::Approved,
            Decision::Reject => EditRequestStatus::Rejected,
        }
    }
}

/// Saves marks through the edit-approval workflow.
///
/// The check-then-write sequence for one (student, event, tier) runs under a
/// per-key lock, so writers sharing a ledger cannot interleave. Writers in
/// other processes are not covered.
pub struct MarkLedger<S, N> {
    store: S,
    notifier: N,
    locks: Mutex<HashMap<MarkKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: MarkStore, N: Notifier> MarkLedger<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key_lock(&self, key: &MarkKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drop the map entry once no other writer holds or waits on it.
    fn release_lock(&self, key: &MarkKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    /// Save the rounds for a (student, event, tier) on behalf of `session`.
    ///
    /// Marks are validated before anything is read or written. The first
    /// save creates the record; later saves go through an edit request.
    pub async fn save_marks(
        &self,
        session: &Session,
        student_id: &str,
        event_id: &str,
        tier: PerformanceTier,
        rounds: Rounds,
    ) -> Result<SaveOutcome> {
        session.ensure_authenticated()?;
        validate_rounds(&rounds).map_err(JudgeError::Validation)?;
        let score = final_score(&rounds);

        let key = MarkKey::new(student_id, event_id, tier);
        let lock = self.key_lock(&key);
        let outcome = {
            let _guard = lock.lock().await;
            self.save_locked(session, student_id, event_id, tier, rounds, score)
                .await
        };
        self.release_lock(&key, lock);
        outcome
    }

    async fn save_locked(
        &self,
        session: &Session,
        student_id: &str,
        event_id: &str,
        tier: PerformanceTier,
        rounds: Rounds,
        score: f64,
    ) -> Result<SaveOutcome> {
        let existing = self
            .store
            .fetch_mark_record(student_id, event_id, tier)
            .await?;
        let latest = match &existing {
            Some(record) if record.has_data() => self.store.fetch_edit_request(&record.id).await?,
            _ => None,
        };
        let action = next_action(existing.as_ref(), latest.as_ref());
        debug!(student = student_id, event = event_id, %tier, ?action, "save attempt");

        let payload = NewMarkRecord {
            student_id: student_id.to_string(),
            event_id: event_id.to_string(),
            supervisor_id: session.user_id.clone(),
            rounds,
            tier,
            timestamp: Utc::now(),
        };

        match action {
            SaveAction::Create => {
                let mark_id = self.store.save_mark_record(&payload).await?;
                info!(
                    %mark_id,
                    student = student_id,
                    event = event_id,
                    %tier,
                    "mark record created"
                );
                let notified = self.notify(&mark_id, &payload, score).await;
                Ok(SaveOutcome::Created {
                    mark_id,
                    final_score: score,
                    notified,
                })
            }
            SaveAction::Overwrite { mark_id } => {
                self.store.update_mark_record(&mark_id, &payload).await?;
                info!(%mark_id, "empty mark record filled");
                let notified = self.notify(&mark_id, &payload, score).await;
                Ok(SaveOutcome::Updated {
                    mark_id,
                    final_score: score,
                    completed_request: None,
                    notified,
                })
            }
            SaveAction::ApplyApproved {
                mark_id,
                request_id,
            } => {
                self.store.update_mark_record(&mark_id, &payload).await?;
                // Not transactional. On failure the request stays approved and
                // must be completed by hand.
                if let Err(e) = self
                    .store
                    .update_edit_request_status(&request_id, EditRequestStatus::Completed)
                    .await
                {
                    warn!(
                        %mark_id,
                        %request_id,
                        error = %e,
                        "marks updated but edit request not completed"
                    );
                    return Err(JudgeError::Transient(format!(
                        "marks {} were updated but edit request {} is still approved: {}",
                        mark_id, request_id, e
                    )));
                }
                info!(%mark_id, %request_id, "approved edit applied");
                let notified = self.notify(&mark_id, &payload, score).await;
                Ok(SaveOutcome::Updated {
                    mark_id,
                    final_score: score,
                    completed_request: Some(request_id),
                    notified,
                })
            }
            SaveAction::RaiseRequest { mark_id, previous } => {
                let now = Utc::now();
                let request = NewEditRequest {
                    mark_id: mark_id.clone(),
                    requester_id: session.user_id.clone(),
                    status: EditRequestStatus::Pending,
                    created_at: now,
                    updated_at: now,
                };
                let request_id = self.store.create_edit_request(&request).await?;
                info!(%mark_id, %request_id, requester = %session.user_id, "edit request raised");
                Ok(SaveOutcome::EditRequested {
                    mark_id,
                    request_id,
                    previous,
                })
            }
            SaveAction::Wait {
                mark_id,
                request_id,
            } => Ok(SaveOutcome::AwaitingApproval {
                mark_id,
                request_id,
            }),
        }
    }

    async fn notify(&self, mark_id: &str, payload: &NewMarkRecord, score: f64) -> bool {
        match notify::marks_entered(mark_id, payload, score) {
            Some(notice) => notify::dispatch(&self.notifier, &notice).await,
            None => false,
        }
    }

    /// Administrator decision on the most recent request for a mark.
    /// Only a pending request can be approved or rejected.
    pub async fn review_edit_request(
        &self,
        session: &Session,
        mark_id: &str,
        decision: Decision,
    ) -> Result<EditRequest> {
        session.ensure_authenticated()?;

        let mut request = self
            .store
            .fetch_edit_request(mark_id)
            .await?
            .ok_or_else(|| JudgeError::NotFound(format!("edit request for mark {}", mark_id)))?;

        if request.status != EditRequestStatus::Pending {
            return Err(JudgeError::InvalidTransition {
                request_id: request.id,
                status: request.status,
            });
        }

        let status = decision.status();
        self.store
            .update_edit_request_status(&request.id, status)
            .await?;
        info!(
            request_id = %request.id,
            %mark_id,
            %status,
            reviewer = %session.user_id,
            "edit request reviewed"
        );

        request.status = status;
        request.updated_at = Utc::now();
        Ok(request)
    }

    pub async fn list_requests(
        &self,
        session: &Session,
        status: Option<EditRequestStatus>,
    ) -> Result<Vec<EditRequest>> {
        session.ensure_authenticated()?;
        self.store.list_edit_requests(status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarksEntry;
    use crate::notify::MarksEntered;
    use crate::store::FileStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<MarksEntered>>,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, notice: &MarksEntered) -> Result<()> {
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn notify(&self, _notice: &MarksEntered) -> Result<()> {
            Err(JudgeError::Transient("unreachable".to_string()))
        }
    }

    fn session() -> Session {
        Session::new("sup-1", "token")
    }

    fn full(d: &str, p: &str, e: [&str; 4]) -> Rounds {
        Rounds::single(MarksEntry {
            d: Some(d.to_string()),
            p: Some(p.to_string()),
            e1: Some(e[0].to_string()),
            e2: Some(e[1].to_string()),
            e3: Some(e[2].to_string()),
            e4: Some(e[3].to_string()),
            ..Default::default()
        })
    }

    fn ledger() -> MarkLedger<FileStore, RecordingNotifier> {
        MarkLedger::new(FileStore::in_memory(), RecordingNotifier::default())
    }

    async fn save<S: MarkStore, N: Notifier>(
        ledger: &MarkLedger<S, N>,
        rounds: Rounds,
    ) -> SaveOutcome {
        ledger
            .save_marks(&session(), "s1", "e1", PerformanceTier::One, rounds)
            .await
            .unwrap()
    }

    async fn stored_rounds(ledger: &MarkLedger<FileStore, RecordingNotifier>) -> Rounds {
        ledger
            .store()
            .fetch_mark_record("s1", "e1", PerformanceTier::One)
            .await
            .unwrap()
            .unwrap()
            .rounds
    }

    #[tokio::test]
    async fn test_first_save_creates_record() {
        let ledger = ledger();
        let outcome = save(&ledger, full("5", "2", ["8", "6", "7", "9"])).await;

        match &outcome {
            SaveOutcome::Created {
                final_score,
                notified,
                ..
            } => {
                assert_eq!(*final_score, 10.5);
                assert!(*notified);
            }
            other => panic!("expected Created, got {:?}", other),
        }
        let sent = ledger.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].final_score, 10.5);
        assert_eq!(sent[0].supervisor_id, "sup-1");
    }

    #[tokio::test]
    async fn test_second_save_raises_request_without_changing_marks() {
        let ledger = ledger();
        let original = full("5", "2", ["8", "6", "7", "9"]);
        save(&ledger, original.clone()).await;

        let outcome = save(&ledger, full("0", "0", ["1", "1", "1", "1"])).await;

        assert!(matches!(
            outcome,
            SaveOutcome::EditRequested { previous: None, .. }
        ));
        assert_eq!(stored_rounds(&ledger).await, original);
        let requests = ledger.list_requests(&session(), None).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, EditRequestStatus::Pending);
        assert_eq!(requests[0].requester_id, "sup-1");
    }

    #[tokio::test]
    async fn test_pending_request_blocks_further_edits() {
        let ledger = ledger();
        let s = session();
        save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        save(&ledger, full("2", "0", ["5", "5", "5", "5"])).await;

        let outcome = save(&ledger, full("3", "0", ["5", "5", "5", "5"])).await;
        assert!(matches!(outcome, SaveOutcome::AwaitingApproval { .. }));
        assert!(!outcome.wrote_marks());
        assert_eq!(ledger.list_requests(&s, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_approved_edit_is_applied_then_completed() {
        let ledger = ledger();
        let first = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        save(&ledger, full("2", "0", ["5", "5", "5", "5"])).await;

        let reviewed = ledger
            .review_edit_request(
                &Session::new("admin", "token"),
                first.mark_id(),
                Decision::Approve,
            )
            .await
            .unwrap();
        assert_eq!(reviewed.status, EditRequestStatus::Approved);

        let replacement = full("4", "1", ["6", "8", "7", "9"]);
        let outcome = save(&ledger, replacement.clone()).await;
        match outcome {
            SaveOutcome::Updated {
                completed_request,
                final_score,
                ..
            } => {
                assert_eq!(completed_request, Some(reviewed.id.clone()));
                assert_eq!(final_score, 10.5);
            }
            other => panic!("expected Updated, got {:?}", other),
        }
        assert_eq!(stored_rounds(&ledger).await, replacement);

        let latest = ledger
            .store()
            .fetch_edit_request(first.mark_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.status, EditRequestStatus::Completed);

        // After completion the next edit needs a fresh request.
        let again = save(&ledger, full("0", "0", ["1", "1", "1", "1"])).await;
        assert!(matches!(
            again,
            SaveOutcome::EditRequested {
                previous: Some(EditRequestStatus::Completed),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_rejected_request_allows_new_request() {
        let ledger = ledger();
        let s = session();
        let first = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        save(&ledger, full("2", "0", ["5", "5", "5", "5"])).await;
        ledger
            .review_edit_request(&s, first.mark_id(), Decision::Reject)
            .await
            .unwrap();

        let outcome = save(&ledger, full("3", "0", ["5", "5", "5", "5"])).await;
        assert!(matches!(
            outcome,
            SaveOutcome::EditRequested {
                previous: Some(EditRequestStatus::Rejected),
                ..
            }
        ));
        assert_eq!(stored_rounds(&ledger).await, full("1", "0", ["5", "5", "5", "5"]));
    }

    #[tokio::test]
    async fn test_review_requires_pending_request() {
        let ledger = ledger();
        let s = session();
        let first = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;

        let missing = ledger
            .review_edit_request(&s, first.mark_id(), Decision::Approve)
            .await;
        assert!(matches!(missing, Err(JudgeError::NotFound(_))));

        save(&ledger, full("2", "0", ["5", "5", "5", "5"])).await;
        ledger
            .review_edit_request(&s, first.mark_id(), Decision::Approve)
            .await
            .unwrap();
        let twice = ledger
            .review_edit_request(&s, first.mark_id(), Decision::Reject)
            .await;
        assert!(matches!(
            twice,
            Err(JudgeError::InvalidTransition {
                status: EditRequestStatus::Approved,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_tiers_are_independent() {
        let ledger = ledger();
        let s = session();
        let rounds = full("1", "0", ["5", "5", "5", "5"]);
        let one = save(&ledger, rounds.clone()).await;
        let two = ledger
            .save_marks(&s, "s1", "e1", PerformanceTier::Two, rounds)
            .await
            .unwrap();
        assert!(matches!(one, SaveOutcome::Created { .. }));
        assert!(matches!(two, SaveOutcome::Created { .. }));
        assert_ne!(one.mark_id(), two.mark_id());
    }

    #[tokio::test]
    async fn test_invalid_marks_are_rejected_before_any_write() {
        let ledger = ledger();
        let mut rounds = full("1", "0", ["5", "5", "5", "5"]);
        rounds.round1.e2 = Some("five".to_string());

        let err = ledger
            .save_marks(&session(), "s1", "e1", PerformanceTier::One, rounds)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(ledger.store().snapshot().marks.is_empty());
    }

    #[tokio::test]
    async fn test_missing_session_is_auth_error() {
        let ledger = ledger();
        let err = ledger
            .save_marks(
                &Session::new("sup-1", ""),
                "s1",
                "e1",
                PerformanceTier::One,
                Rounds::default(),
            )
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(ledger.store().snapshot().marks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_record_is_filled_without_request() {
        let ledger = ledger();
        let s = session();
        let first = save(&ledger, Rounds::default()).await;
        assert!(matches!(first, SaveOutcome::Created { notified: false, .. }));

        let second = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        assert!(matches!(
            second,
            SaveOutcome::Updated {
                completed_request: None,
                ..
            }
        ));
        assert!(ledger.list_requests(&s, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_round_does_not_notify() {
        let ledger = ledger();
        let mut rounds = full("1", "0", ["5", "5", "5", "5"]);
        rounds.round1.e4 = None;
        let outcome = save(&ledger, rounds).await;
        assert!(matches!(outcome, SaveOutcome::Created { notified: false, .. }));
        assert!(ledger.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_notification_keeps_the_save() {
        let ledger = MarkLedger::new(FileStore::in_memory(), FailingNotifier);
        let outcome = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        assert!(matches!(outcome, SaveOutcome::Created { notified: false, .. }));
        assert_eq!(ledger.store().snapshot().marks.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_saves_create_one_record() {
        let ledger = ledger();
        let s = session();
        let rounds = full("1", "0", ["5", "5", "5", "5"]);
        let (a, b) = tokio::join!(
            ledger.save_marks(&s, "s1", "e1", PerformanceTier::One, rounds.clone()),
            ledger.save_marks(&s, "s1", "e1", PerformanceTier::One, rounds.clone()),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| matches!(o, SaveOutcome::Created { .. })).count(), 1);
        assert_eq!(
            outcomes.iter().filter(|o| matches!(o, SaveOutcome::EditRequested { .. })).count(),
            1
        );
        assert_eq!(ledger.store().snapshot().marks.len(), 1);
        assert!(ledger.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_locks_are_released() {
        let ledger = ledger();
        let s = session();
        for event in ["e1", "e2", "e3"] {
            ledger
                .save_marks(&s, "s1", event, PerformanceTier::One, Rounds::default())
                .await
                .unwrap();
        }
        let mut rounds = Rounds::default();
        rounds.round1.d = Some("bad".to_string());
        ledger
            .save_marks(&s, "s1", "e1", PerformanceTier::One, rounds)
            .await
            .unwrap_err();
        assert!(ledger.locks.lock().unwrap().is_empty());
    }

    /// File store whose edit requests can be raised and reviewed but never
    /// marked completed.
    struct StuckRequestStore(FileStore);

    impl MarkStore for StuckRequestStore {
        async fn fetch_mark_record(
            &self,
            student_id: &str,
            event_id: &str,
            tier: PerformanceTier,
        ) -> Result<Option<MarkRecord>> {
            self.0.fetch_mark_record(student_id, event_id, tier).await
        }

        async fn fetch_tier_records(&self, tier: PerformanceTier) -> Result<Vec<MarkRecord>> {
            self.0.fetch_tier_records(tier).await
        }

        async fn save_mark_record(&self, payload: &NewMarkRecord) -> Result<String> {
            self.0.save_mark_record(payload).await
        }

        async fn update_mark_record(&self, mark_id: &str, payload: &NewMarkRecord) -> Result<()> {
            self.0.update_mark_record(mark_id, payload).await
        }

        async fn fetch_edit_request(&self, mark_id: &str) -> Result<Option<EditRequest>> {
            self.0.fetch_edit_request(mark_id).await
        }

        async fn create_edit_request(&self, payload: &NewEditRequest) -> Result<String> {
            self.0.create_edit_request(payload).await
        }

        async fn update_edit_request_status(
            &self,
            request_id: &str,
            status: EditRequestStatus,
        ) -> Result<()> {
            if status == EditRequestStatus::Completed {
                return Err(JudgeError::Transient("connection reset".to_string()));
            }
            self.0.update_edit_request_status(request_id, status).await
        }

        async fn list_edit_requests(
            &self,
            status: Option<EditRequestStatus>,
        ) -> Result<Vec<EditRequest>> {
            self.0.list_edit_requests(status).await
        }

        async fn list_students(&self) -> Result<Vec<crate::marks::Student>> {
            self.0.list_students().await
        }

        async fn list_events(&self) -> Result<Vec<crate::marks::Event>> {
            self.0.list_events().await
        }
    }

    #[tokio::test]
    async fn test_uncompleted_request_is_named_in_error() {
        let ledger = MarkLedger::new(
            StuckRequestStore(FileStore::in_memory()),
            RecordingNotifier::default(),
        );
        let s = session();
        let first = save(&ledger, full("1", "0", ["5", "5", "5", "5"])).await;
        let raised = save(&ledger, full("2", "0", ["5", "5", "5", "5"])).await;
        let request_id = match &raised {
            SaveOutcome::EditRequested { request_id, .. } => request_id.clone(),
            other => panic!("expected EditRequested, got {:?}", other),
        };
        ledger
            .review_edit_request(&s, first.mark_id(), Decision::Approve)
            .await
            .unwrap();

        let replacement = full("3", "0", ["5", "5", "5", "5"]);
        let err = ledger
            .save_marks(&s, "s1", "e1", PerformanceTier::One, replacement.clone())
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&request_id));
        assert!(err.to_string().contains("still approved"));

        let stored = ledger
            .store()
            .0
            .fetch_mark_record("s1", "e1", PerformanceTier::One)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.rounds, replacement);
    }

    #[test]
    fn test_next_action_table() {
        let record = MarkRecord {
            id: "m1".to_string(),
            student_id: "s1".to_string(),
            event_id: "e1".to_string(),
            supervisor_id: "sup-1".to_string(),
            rounds: full("1", "0", ["5", "5", "5", "5"]),
            tier: PerformanceTier::One,
            timestamp: Utc::now(),
        };
        let request = |status: EditRequestStatus| EditRequest {
            id: "r1".to_string(),
            mark_id: "m1".to_string(),
            requester_id: "sup-1".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(next_action(None, None), SaveAction::Create);
        assert_eq!(
            next_action(Some(&record), None),
            SaveAction::RaiseRequest {
                mark_id: "m1".to_string(),
                previous: None
            }
        );
        assert_eq!(
            next_action(Some(&record), Some(&request(EditRequestStatus::Pending))),
            SaveAction::Wait {
                mark_id: "m1".to_string(),
                request_id: "r1".to_string()
            }
        );
        assert_eq!(
            next_action(Some(&record), Some(&request(EditRequestStatus::Approved))),
            SaveAction::ApplyApproved {
                mark_id: "m1".to_string(),
                request_id: "r1".to_string()
            }
        );
        assert_eq!(
            next_action(Some(&record), Some(&request(EditRequestStatus::Rejected))),
            SaveAction::RaiseRequest {
                mark_id: "m1".to_string(),
                previous: Some(EditRequestStatus::Rejected)
            }
        );

        let empty = MarkRecord {
            rounds: Rounds::default(),
            ..record.clone()
        };
        assert_eq!(
            next_action(Some(&empty), Some(&request(EditRequestStatus::Pending))),
            SaveAction::Overwrite {
                mark_id: "m1".to_string()
            }
        );
    }
}
