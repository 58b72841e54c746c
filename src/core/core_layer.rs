// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "points/mod.rs"]
pub mod points;
