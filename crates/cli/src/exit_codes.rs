//! CLI Exit Code Registry
//!
//! Single source of truth for `ordrec` exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success / reconciled                               |
//! | 1    | Material discrepancies (count diff, money outside tolerance, ID drift) |
//! | 2    | Usage error (bad args, missing required option)    |
//! | 3    | I/O error (unreadable CSV, config, or ID file)     |
//! | 4    | Parse error (bad TOML, bad CSV shape)              |
//! | 5    | Platform fetch failed (non-200 or bad payload)     |
//!
//! Within-tolerance money diffs are reported but do not cause a non-zero
//! exit. A refused connection to the platform endpoint degrades the run to
//! manual-only comparison instead of failing it.

/// Success - reconciled, or summary printed without incident.
pub const EXIT_SUCCESS: u8 = 0;

/// Material discrepancies found. Like `diff(1)`, exit 1 means "sides differ."
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// I/O error reading an input file.
pub const EXIT_IO: u8 = 3;

/// Parse error (config TOML or CSV structure).
pub const EXIT_PARSE: u8 = 4;

/// Platform endpoint returned a non-200 status or an undecodable payload.
pub const EXIT_PLATFORM: u8 = 5;
