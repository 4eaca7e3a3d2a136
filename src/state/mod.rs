//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: persisted status of one site record (INDEXING, INDEXED, FAILED)
//! - `RunState`: in-process state of the global indexing run (idle or running)

mod run_state;
mod site_status;

// Re-export main types
pub use run_state::RunState;
pub use site_status::SiteStatus;
