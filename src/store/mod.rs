pub mod file;
pub mod http;

pub use file::{get_store_path, FileStore, StoreState};
pub use http::HttpStore;

use crate::error::Result;
use crate::marks::{
    EditRequest, EditRequestStatus, Event, MarkRecord, NewEditRequest, NewMarkRecord,
    PerformanceTier, Student,
};

/// The document store holding rosters, mark records and edit requests.
///
/// Every call is an independent round trip; nothing here is transactional
/// across calls.
#[allow(async_fn_in_trait)]
pub trait MarkStore {
    async fn fetch_mark_record(
        &self,
        student_id: &str,
        event_id: &str,
        tier: PerformanceTier,
    ) -> Result<Option<MarkRecord>>;

    /// Every record under one tier, in store order.
    async fn fetch_tier_records(&self, tier: PerformanceTier) -> Result<Vec<MarkRecord>>;

    /// Persist a new record and return its store-assigned id.
    async fn save_mark_record(&self, payload: &NewMarkRecord) -> Result<String>;

    async fn update_mark_record(&self, mark_id: &str, payload: &NewMarkRecord) -> Result<()>;

    /// Most recent edit request for a mark, by creation time.
    async fn fetch_edit_request(&self, mark_id: &str) -> Result<Option<EditRequest>>;

    async fn create_edit_request(&self, payload: &NewEditRequest) -> Result<String>;

    async fn update_edit_request_status(
        &self,
        request_id: &str,
        status: EditRequestStatus,
    ) -> Result<()>;

    async fn list_edit_requests(&self, status: Option<EditRequestStatus>)
        -> Result<Vec<EditRequest>>;

    async fn list_students(&self) -> Result<Vec<Student>>;

    async fn list_events(&self) -> Result<Vec<Event>>;
}
