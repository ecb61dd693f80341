// The core module contains all business logic.
// Each feature gets its own submodule and declares the traits it needs from
// the outside world; `infra` provides the real implementations.

#[path = "sheets/mod.rs"]
pub mod sheets;

#[path = "uploads/mod.rs"]
pub mod uploads;

#[path = "auth/mod.rs"]
pub mod auth;

#[cfg(test)]
#[path = "testing.rs"]
pub mod testing;
