//! Error kinds for parameter loading and generation.
//!
//! Only [`GenError::ParamInvalid`] is ever surfaced as `Err`; the remaining
//! variants describe non-fatal conditions that a stage logs via `tracing`
//! and recovers from with a well-defined empty output (see spec §7). They
//! are kept in this enum anyway so callers have one place to match on every
//! named failure kind, the way `sim_proto`/`core_sim` in the reference
//! corpus centralize their config-loading errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid parameter: {0}")]
    ParamInvalid(String),

    #[error("failed to parse parameter document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read parameter file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seed rejection sampling exhausted after {tries} attempts")]
    SeedExhausted { tries: u32 },

    #[error("no coastline streamline reached both world edges in {attempts} attempts")]
    CoastNotFound { attempts: u32 },

    #[error("no river streamline reached both world edges in {attempts} attempts")]
    RiverNotFound { attempts: u32 },

    #[error("polygon buffer produced non-simple geometry")]
    BufferFailure,

    #[error("two streamline samples quantized to the same planar-graph node")]
    GraphDegenerate,
}

pub type Result<T> = std::result::Result<T, GenError>;
