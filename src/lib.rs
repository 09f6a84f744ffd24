//! Seatwise
//!
//! Seatwise estimates what an organisation saves by consolidating overlapping
//! software licenses onto a single vendor contract, and assembles the
//! per-subsidiary dataset behind each estimate one step at a time.

pub mod assembly;
pub mod clusters;
pub mod fixtures;
pub mod keys;
pub mod periods;
pub mod prelude;
pub mod pricing;
pub mod report;
pub mod savings;
pub mod summary;
pub mod switching;
pub mod vendors;
