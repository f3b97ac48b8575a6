use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::credentials::Session;
use crate::error::Result;
use crate::marks::{Event, MarkRecord, PerformanceTier, QualificationCandidate, Student};
use crate::scoring::final_score;
use crate::store::MarkStore;

/// Why a selection came back empty without any fetch failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    NoStudents,
    NoEvents,
    NoRecords,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Qualified(Vec<QualificationCandidate>),
    NoData(NoDataReason),
}

impl Selection {
    /// The qualifiers, empty when there was nothing to rank.
    pub fn qualifiers(&self) -> &[QualificationCandidate] {
        match self {
            Selection::Qualified(candidates) => candidates,
            Selection::NoData(_) => &[],
        }
    }
}

/// Sort candidates by score descending and keep the first `k`.
/// Equal scores keep their encounter order.
pub fn rank_candidates(
    mut candidates: Vec<QualificationCandidate>,
    k: usize,
) -> Vec<QualificationCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(k);
    candidates
}

fn candidate(record: &MarkRecord) -> QualificationCandidate {
    QualificationCandidate {
        student_id: record.student_id.clone(),
        event_id: record.event_id.clone(),
        score: final_score(&record.rounds),
    }
}

fn precheck(students: &[Student], events: &[Event]) -> Option<NoDataReason> {
    if students.is_empty() {
        Some(NoDataReason::NoStudents)
    } else if events.is_empty() {
        Some(NoDataReason::NoEvents)
    } else {
        None
    }
}

fn finish(candidates: Vec<QualificationCandidate>, k: usize) -> Selection {
    if candidates.is_empty() {
        return Selection::NoData(NoDataReason::NoRecords);
    }
    Selection::Qualified(rank_candidates(candidates, k))
}

/// Pick the top `k` tier-1 (student, event) entries across the roster.
///
/// Fetches every tier-1 record in one call and indexes it by
/// (student, event). Candidates are collected student by student, event by
/// event, which fixes the order ties are left in. Records for students or
/// events outside the given lists are ignored, as are records holding no marks.
pub async fn select_top_k<S: MarkStore>(
    session: &Session,
    students: &[Student],
    events: &[Event],
    store: &S,
    k: usize,
) -> Result<Selection> {
    session.ensure_authenticated()?;
    if let Some(reason) = precheck(students, events) {
        return Ok(Selection::NoData(reason));
    }

    let records = store.fetch_tier_records(PerformanceTier::One).await?;
    debug!(records = records.len(), "fetched tier-1 records");

    let mut index: HashMap<(&str, &str), &MarkRecord> = HashMap::new();
    for record in records.iter().filter(|record| record.has_data()) {
        let key = (record.student_id.as_str(), record.event_id.as_str());
        if index.contains_key(&key) {
            warn!(
                student = %record.student_id,
                event = %record.event_id,
                mark_id = %record.id,
                "duplicate tier-1 record ignored"
            );
            continue;
        }
        index.insert(key, record);
    }

    let mut candidates = Vec::new();
    for student in students {
        for event in events {
            if let Some(record) = index.get(&(student.id.as_str(), event.id.as_str())) {
                candidates.push(candidate(record));
            }
        }
    }

    Ok(finish(candidates, k))
}

/// Same selection, but with one lookup per (student, event) pair.
///
/// For stores that cannot list a whole tier. Lookups run concurrently and
/// any failed lookup fails the whole selection.
pub async fn select_top_k_by_pair<S: MarkStore>(
    session: &Session,
    students: &[Student],
    events: &[Event],
    store: &S,
    k: usize,
) -> Result<Selection> {
    session.ensure_authenticated()?;
    if let Some(reason) = precheck(students, events) {
        return Ok(Selection::NoData(reason));
    }

    let lookups = students.iter().flat_map(|student| {
        events.iter().map(move |event| {
            store.fetch_mark_record(&student.id, &event.id, PerformanceTier::One)
        })
    });
    let found = try_join_all(lookups).await?;

    let candidates = found
        .iter()
        .flatten()
        .filter(|record| record.has_data())
        .map(candidate)
        .collect();
    Ok(finish(candidates, k))
}
