//! Exit codes for the `absolve` binary.
//! Workflow failures reuse `OffsetError::exit_code` (1, 4, 5, 6); the values below cover the rest.

pub const SUCCESS: i32 = 0;
pub const FAILED: i32 = 1; // Unreadable or invalid request input
pub const INTERNAL_ERROR: i32 = 2; // Setup failed before the workflow ran
pub const REJECTED: i32 = 3; // Estimate at or above the spending ceiling
