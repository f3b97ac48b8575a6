pub mod types;

pub use types::{
    EditRequest, EditRequestStatus, Event, MarkKey, MarkRecord, MarksEntry, NewEditRequest,
    NewMarkRecord, PerformanceTier, QualificationCandidate, Rounds, Student,
};
pub(crate) use types::present;
