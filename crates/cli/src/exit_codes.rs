//! CLI Exit Code Registry
//!
//! Single source of truth for `sscope` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                    |
//! |---------|-----------|------------------------------------------------|
//! | 0       | Universal | Success                                        |
//! | 1       | Universal | General error (unspecified)                    |
//! | 2       | Universal | CLI usage error (bad args, bad query)          |
//! | 3-9     | lookup    | Search/detail outcomes                         |
//! | 10-19   | build     | Snapshot rebuild failures                      |
//! | 20-29   | config    | Settings file problems                         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
/// A search with zero hits is still a success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, query too short, unknown branch filter.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Lookup (3-9)
// =============================================================================

/// `detail`: no product with that code.
pub const EXIT_UNKNOWN_CODE: u8 = 3;

/// `detail`: the product exists but the active filters exclude it.
pub const EXIT_FILTERED_OUT: u8 = 4;

/// Snapshot missing, unreadable, or from an incompatible version.
pub const EXIT_UNAVAILABLE: u8 = 5;

// =============================================================================
// Build (10-19)
// =============================================================================

/// No sources configured and none given on the command line.
pub const EXIT_BUILD_NO_SOURCES: u8 = 10;

/// Every branch was unreadable, or no row had a product code.
/// The previous snapshot is left untouched.
pub const EXIT_BUILD_NO_DATA: u8 = 11;

/// The new snapshot could not be written or renamed into place.
pub const EXIT_BUILD_WRITE: u8 = 12;

// =============================================================================
// Config (20-29)
// =============================================================================

/// Settings file not found, unreadable, or invalid.
pub const EXIT_CONFIG: u8 = 20;
