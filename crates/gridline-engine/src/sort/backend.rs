//! Optional asynchronous sort delegation.
//!
//! A host may route sorting to a server or worker by installing a
//! [`SortBackend`]. A request either completes synchronously or stays
//! pending under a ticket; the host later settles it through
//! [`SortState::complete_sort`](super::SortState::complete_sort). A new sort
//! request arriving while one is pending supersedes the old ticket.

use gridline_common::GridError;

use super::model::SortModel;

/// Identifies one outstanding backend request. Tickets are never reused
/// within a `SortState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortTicket(pub u64);

/// Outcome of handing a sort request to the backend.
pub enum BackendResponse {
    /// The backend produced the permutation synchronously.
    Completed(Vec<u32>),
    /// The backend will settle the ticket later.
    Pending,
}

pub trait SortBackend {
    fn on_sort_request(
        &mut self,
        ticket: SortTicket,
        model: &SortModel,
    ) -> Result<BackendResponse, GridError>;
}
