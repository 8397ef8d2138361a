//! Incident Module
//!
//! Incident record store: tạo, cập nhật, truy vấn incident.
//!
//! ## Structure
//! - `types`: Incident, enums, filter, stats
//! - `manager`: `IncidentStore` (in-memory, per-incident locking)
//!
//! ## Lifecycle
//! ```text
//! analyzing -> confirmed -> mitigated -> closed
//! ```
//! Chỉ đi tới, từng bước một. Reopen không được hỗ trợ.

pub mod types;
pub mod manager;

#[cfg(test)]
mod tests;

pub use types::{
    Incident,
    IncidentCategory,
    IncidentFilter,
    IncidentStats,
    IncidentStatus,
    ListOrder,
    NewIncident,
    Priority,
    TimelineEntry,
};

pub use manager::IncidentStore;
