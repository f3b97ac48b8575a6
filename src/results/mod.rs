use crate::credentials::Session;
use crate::error::Result;
use crate::marks::{MarkRecord, PerformanceTier};
use crate::scoring::score_breakdown;
use crate::store::MarkStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub rank: usize,
    pub student_id: String,
    pub mark_id: String,
    pub round1: f64,
    pub round2: Option<f64>,
    pub final_score: f64,
}

/// Ranked scores for one event within a tier.
#[derive(Debug, Clone, PartialEq)]
pub struct EventResults {
    pub event_id: String,
    pub rows: Vec<ResultRow>,
}

fn row(record: &MarkRecord) -> ResultRow {
    let breakdown = score_breakdown(&record.rounds);
    ResultRow {
        rank: 0,
        student_id: record.student_id.clone(),
        mark_id: record.id.clone(),
        round1: breakdown.round1.score,
        round2: breakdown.round2.map(|round| round.score),
        final_score: breakdown.final_score,
    }
}

/// Group records by event (first-seen order) and rank each group by final
/// score. Equal scores share a rank and the next rank skips ahead.
pub fn rank_by_event(records: &[MarkRecord]) -> Vec<EventResults> {
    let mut groups: Vec<EventResults> = Vec::new();
    for record in records.iter().filter(|record| record.has_data()) {
        match groups.iter_mut().find(|group| group.event_id == record.event_id) {
            Some(group) => group.rows.push(row(record)),
            None => groups.push(EventResults {
                event_id: record.event_id.clone(),
                rows: vec![row(record)],
            }),
        }
    }

    for group in &mut groups {
        group
            .rows
            .sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        for i in 0..group.rows.len() {
            let tied = i > 0 && group.rows[i].final_score == group.rows[i - 1].final_score;
            group.rows[i].rank = if tied { group.rows[i - 1].rank } else { i + 1 };
        }
    }

    groups
}

/// Results for a tier, optionally narrowed to one event.
pub async fn tier_results<S: MarkStore>(
    session: &Session,
    store: &S,
    tier: PerformanceTier,
    event_id: Option<&str>,
) -> Result<Vec<EventResults>> {
    session.ensure_authenticated()?;
    let records = store.fetch_tier_records(tier).await?;
    let records: Vec<MarkRecord> = match event_id {
        Some(event_id) => records
            .into_iter()
            .filter(|record| record.event_id == event_id)
            .collect(),
        None => records,
    };
    Ok(rank_by_event(&records))
}
