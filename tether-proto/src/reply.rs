//! Fixed reply lines the listener writes on the wire.
//!
//! `cd`, `remove`, the missing-file notice, spawn failure, and non-zero exit
//! status are answered as plain unframed text; everything else is framed.
//! The exact bytes matter for compatibility with legacy peers — do not edit.

/// `cd` succeeded.
pub const CD_OK: &str = "Directory changed successfully.\n";

/// `cd` failed.
pub const CD_FAILED: &str = "Failed to change directory.\n";

/// `remove` succeeded.
pub const REMOVE_OK: &str = "[+] File removed successfully.\n";

/// `remove` failed.
pub const REMOVE_FAILED: &str = "[-] Error removing file\n";

/// Sender could not open the requested file. Sent in place of the 4-byte
/// length announcement, so the receiving side sees a reply that is not
/// length-prefixed.
pub const NOT_FOUND: &str = "File not found.\n";

/// The shell itself could not be spawned.
pub const EXEC_FAILED: &str = "[-] Execution failed.\n";

/// The command ran but exited non-zero.
pub const EXEC_ERROR: &str = "[-] Execution error.\n";

/// The command succeeded with empty output. Unlike the lines above, this one
/// is framed like any other captured-output reply.
pub const EXEC_COMPLETE: &str = "[+] Execution complete.\n";
