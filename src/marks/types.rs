use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One round's raw input for a (student, event, supervisor) triple.
///
/// Numeric fields are kept as text exactly as entered. An absent or blank
/// field means "not submitted", which is different from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarksEntry {
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(rename = "D_sup", default, skip_serializing_if = "Option::is_none")]
    pub d_sup: Option<String>,
    #[serde(rename = "P", default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(rename = "P_sup", default, skip_serializing_if = "Option::is_none")]
    pub p_sup: Option<String>,
    #[serde(rename = "E1", default, skip_serializing_if = "Option::is_none")]
    pub e1: Option<String>,
    #[serde(rename = "E1_sup", default, skip_serializing_if = "Option::is_none")]
    pub e1_sup: Option<String>,
    #[serde(rename = "E2", default, skip_serializing_if = "Option::is_none")]
    pub e2: Option<String>,
    #[serde(rename = "E2_sup", default, skip_serializing_if = "Option::is_none")]
    pub e2_sup: Option<String>,
    #[serde(rename = "E3", default, skip_serializing_if = "Option::is_none")]
    pub e3: Option<String>,
    #[serde(rename = "E3_sup", default, skip_serializing_if = "Option::is_none")]
    pub e3_sup: Option<String>,
    #[serde(rename = "E4", default, skip_serializing_if = "Option::is_none")]
    pub e4: Option<String>,
    #[serde(rename = "E4_sup", default, skip_serializing_if = "Option::is_none")]
    pub e4_sup: Option<String>,
}

/// Treat blank text the same as an unset field.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl MarksEntry {
    /// The deduction, penalty and judge fields in a fixed order, with their labels.
    pub fn numeric_fields(&self) -> [(&'static str, &Option<String>); 6] {
        [
            ("D", &self.d),
            ("P", &self.p),
            ("E1", &self.e1),
            ("E2", &self.e2),
            ("E3", &self.e3),
            ("E4", &self.e4),
        ]
    }

    pub fn judge_fields(&self) -> [&Option<String>; 4] {
        [&self.e1, &self.e2, &self.e3, &self.e4]
    }

    fn annotation_fields(&self) -> [&Option<String>; 6] {
        [
            &self.d_sup,
            &self.p_sup,
            &self.e1_sup,
            &self.e2_sup,
            &self.e3_sup,
            &self.e4_sup,
        ]
    }

    /// A round is empty when every field, annotations included, is unset or blank.
    pub fn is_empty(&self) -> bool {
        self.numeric_fields()
            .iter()
            .all(|(_, field)| present(field).is_none())
            && self
                .annotation_fields()
                .iter()
                .all(|field| present(field).is_none())
    }

    /// True when D, P and all four judge scores have been entered.
    pub fn is_complete(&self) -> bool {
        self.numeric_fields()
            .iter()
            .all(|(_, field)| present(field).is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rounds {
    pub round1: MarksEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round2: Option<MarksEntry>,
}

impl Rounds {
    pub fn single(round1: MarksEntry) -> Self {
        Self {
            round1,
            round2: None,
        }
    }

    /// The second round, only when it carries any data.
    pub fn second_round(&self) -> Option<&MarksEntry> {
        self.round2.as_ref().filter(|round| !round.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.round1.is_empty() && self.second_round().is_none()
    }
}

/// Which competition stage a record belongs to. Each tier has its own score space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceTier {
    #[serde(rename = "performance 1")]
    One,
    #[serde(rename = "performance 2")]
    Two,
}

impl PerformanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::One => "performance 1",
            PerformanceTier::Two => "performance 2",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "tier 1" | "tier1" | "performance 1" | "performance1" => Ok(PerformanceTier::One),
            "2" | "tier 2" | "tier2" | "performance 2" | "performance2" => Ok(PerformanceTier::Two),
            other => Err(format!("unknown performance tier '{}' (expected 1 or 2)", other)),
        }
    }
}

/// Payload for creating or overwriting a mark record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarkRecord {
    pub student_id: String,
    pub event_id: String,
    pub supervisor_id: String,
    pub rounds: Rounds,
    #[serde(rename = "performanceTier")]
    pub tier: PerformanceTier,
    pub timestamp: DateTime<Utc>,
}

/// The persisted scoring unit. At most one exists per (student, event, tier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub id: String,
    pub student_id: String,
    pub event_id: String,
    pub supervisor_id: String,
    pub rounds: Rounds,
    #[serde(rename = "performanceTier")]
    pub tier: PerformanceTier,
    pub timestamp: DateTime<Utc>,
}

impl MarkRecord {
    pub fn from_new(id: String, payload: NewMarkRecord) -> Self {
        Self {
            id,
            student_id: payload.student_id,
            event_id: payload.event_id,
            supervisor_id: payload.supervisor_id,
            rounds: payload.rounds,
            tier: payload.tier,
            timestamp: payload.timestamp,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.rounds.is_empty()
    }
}

/// Identity of a mark record: one per (student, event, tier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkKey {
    pub student_id: String,
    pub event_id: String,
    pub tier: PerformanceTier,
}

impl MarkKey {
    pub fn new(student_id: &str, event_id: &str, tier: PerformanceTier) -> Self {
        Self {
            student_id: student_id.to_string(),
            event_id: event_id.to_string(),
            tier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl EditRequestStatus {
    /// Pending and approved requests block a new request from being raised.
    pub fn is_open(&self) -> bool {
        matches!(self, EditRequestStatus::Pending | EditRequestStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditRequestStatus::Pending => "pending",
            EditRequestStatus::Approved => "approved",
            EditRequestStatus::Rejected => "rejected",
            EditRequestStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EditRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(EditRequestStatus::Pending),
            "approved" => Ok(EditRequestStatus::Approved),
            "rejected" => Ok(EditRequestStatus::Rejected),
            "completed" => Ok(EditRequestStatus::Completed),
            other => Err(format!("unknown edit request status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEditRequest {
    pub mark_id: String,
    pub requester_id: String,
    pub status: EditRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow object guarding a second write to an existing mark record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub id: String,
    pub mark_id: String,
    pub requester_id: String,
    pub status: EditRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EditRequest {
    pub fn from_new(id: String, payload: NewEditRequest) -> Self {
        Self {
            id,
            mark_id: payload.mark_id,
            requester_id: payload.requester_id,
            status: payload.status,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Derived ranking entry: one per tier-1 mark record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationCandidate {
    pub student_id: String,
    pub event_id: String,
    pub score: f64,
}
