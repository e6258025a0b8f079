//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the DBW software from the `DBW_SW_ROOT`
/// environment variable.
///
/// All parameter and session paths are resolved relative to this directory.
pub fn get_dbw_sw_root() -> Result<PathBuf, std::env::VarError> {
    let root = std::env::var("DBW_SW_ROOT")?;

    Ok(PathBuf::from(root))
}
