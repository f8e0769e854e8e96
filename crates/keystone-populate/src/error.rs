//! Population failure taxonomy.
//!
//! Only three things can fail a populate chain: an invalid selection
//! argument (caught before any I/O), a reference slot holding a non-key
//! value (a data-integrity problem upstream), and a store or cache-read
//! failure (propagated unwrapped). Absent paths and missing referenced
//! entities resolve to null instead of erroring, and cache-write failures
//! are swallowed by the loader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopulateError {
    /// Selecting fields is only well-defined for a single path at a time.
    #[error("cannot apply a field selection to multiple populate paths")]
    InvalidSelection,

    /// A path claimed to be a reference holds something that is not a key.
    #[error("value at `{path}` is not a reference")]
    NonReference { path: String },

    /// Underlying store or cache-read failure, unmodified.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
