use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{JudgeError, Result};
use crate::marks::{NewMarkRecord, PerformanceTier};

/// Emitted after a save once round 1 has all six base fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksEntered {
    pub mark_id: String,
    pub student_id: String,
    pub event_id: String,
    pub supervisor_id: String,
    pub tier: PerformanceTier,
    pub final_score: f64,
}

/// Build the notice for a written record, if round 1 is fully entered.
pub fn marks_entered(
    mark_id: &str,
    payload: &NewMarkRecord,
    final_score: f64,
) -> Option<MarksEntered> {
    if !payload.rounds.round1.is_complete() {
        return None;
    }
    Some(MarksEntered {
        mark_id: mark_id.to_string(),
        student_id: payload.student_id.clone(),
        event_id: payload.event_id.clone(),
        supervisor_id: payload.supervisor_id.clone(),
        tier: payload.tier,
        final_score,
    })
}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, notice: &MarksEntered) -> Result<()>;
}

/// Send a notice and swallow any failure. A failed notification never
/// undoes the save that triggered it.
pub async fn dispatch<N: Notifier>(notifier: &N, notice: &MarksEntered) -> bool {
    match notifier.notify(notice).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                mark_id = %notice.mark_id,
                error = %e,
                "marks-entered notification failed"
            );
            false
        }
    }
}

/// Records notices in the log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notice: &MarksEntered) -> Result<()> {
        info!(
            student = %notice.student_id,
            event = %notice.event_id,
            tier = %notice.tier,
            score = notice.final_score,
            "marks entered"
        );
        Ok(())
    }
}

/// Posts each notice as JSON to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JudgeError::Transient(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &MarksEntered) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .await
            .map_err(|e| JudgeError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(JudgeError::Transient(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// The notifier picked from configuration.
pub enum ConfiguredNotifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl ConfiguredNotifier {
    pub fn from_webhook(webhook: Option<&str>, timeout: Duration) -> Result<Self> {
        match webhook {
            Some(url) => Ok(ConfiguredNotifier::Webhook(WebhookNotifier::new(url, timeout)?)),
            None => Ok(ConfiguredNotifier::Log(LogNotifier)),
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn notify(&self, notice: &MarksEntered) -> Result<()> {
        match self {
            ConfiguredNotifier::Log(inner) => inner.notify(notice).await,
            ConfiguredNotifier::Webhook(inner) => inner.notify(notice).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{MarksEntry, Rounds};
    use chrono::Utc;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn notify(&self, _notice: &MarksEntered) -> Result<()> {
            Err(JudgeError::Transient("push service down".to_string()))
        }
    }

    fn payload(round1: MarksEntry) -> NewMarkRecord {
        NewMarkRecord {
            student_id: "s1".to_string(),
            event_id: "e1".to_string(),
            supervisor_id: "sup-1".to_string(),
            rounds: Rounds::single(round1),
            tier: PerformanceTier::One,
            timestamp: Utc::now(),
        }
    }

    fn full_round() -> MarksEntry {
        MarksEntry {
            d: Some("5".to_string()),
            p: Some("2".to_string()),
            e1: Some("8".to_string()),
            e2: Some("6".to_string()),
            e3: Some("7".to_string()),
            e4: Some("9".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_notice_requires_complete_round1() {
        let mut partial = full_round();
        partial.p = None;
        assert!(marks_entered("m1", &payload(partial), 0.0).is_none());

        let notice = marks_entered("m1", &payload(full_round()), 10.5).unwrap();
        assert_eq!(notice.final_score, 10.5);
        assert_eq!(notice.mark_id, "m1");
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let notice = marks_entered("m1", &payload(full_round()), 10.5).unwrap();
        assert!(!dispatch(&FailingNotifier, &notice).await);
        assert!(dispatch(&LogNotifier, &notice).await);
    }
}
