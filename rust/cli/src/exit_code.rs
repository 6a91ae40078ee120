//! Process exit codes.

pub const SUCCESS: i32 = 0;

/// Bad arguments, invalid configuration or a failed command.
pub const ERROR: i32 = 2;
