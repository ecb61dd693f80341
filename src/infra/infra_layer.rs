// The infra module contains implementations of core traits.
// Each external system gets its own submodule.

#[path = "google_sheets/mod.rs"]
pub mod google_sheets;

#[path = "storage/mod.rs"]
pub mod storage;

#[path = "users/mod.rs"]
pub mod users;
