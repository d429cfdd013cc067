//! Error types for world streaming and configuration loading.

use std::path::PathBuf;

use strider_core::PoolError;
use strider_procedural::{LayoutError, TemplateId};
use thiserror::Error;

/// Errors raised while loading or validating a world configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A template's layout rows are malformed.
    #[error("template {template:?}: {source}")]
    Layout {
        /// Offending template.
        template: TemplateId,
        /// What was wrong with the rows.
        #[source]
        source: LayoutError,
    },

    /// Two templates share an id.
    #[error("duplicate template id {0:?}")]
    DuplicateTemplate(TemplateId),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a spawn or pool request produced nothing this tick.
///
/// None of these are fatal. The caller skips the unit of work and tries
/// again on the next tick.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// No chunk templates are configured.
    #[error("no chunk templates configured")]
    NoTemplates,

    /// The template was never registered with the chunk pool.
    #[error("unknown chunk template {0:?}")]
    UnknownTemplate(TemplateId),

    /// A handle was returned to a pool other than the one it came from.
    #[error("chunk of template {actual:?} returned as {claimed:?}")]
    TemplateMismatch {
        /// Template the handle claims.
        claimed: TemplateId,
        /// Template the instance was built from.
        actual: TemplateId,
    },

    /// The underlying slot pool refused the request.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl StreamError {
    /// `true` for plain exhaustion, the expected steady-state refusal.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Pool(PoolError::Exhausted { .. }))
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
