// BillExact - core/mod.rs
//
// Core business logic layer.
// Dependencies: chrono, regex, serde, csv (for writers passed in by callers).
// Must NOT depend on: platform, app, or touch the filesystem directly.

pub mod compliance;
pub mod export;
pub mod filter;
pub mod model;
pub mod narrative;
pub mod timesheet;
