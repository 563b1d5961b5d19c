//! Error taxonomy and the diagnostic side channel.
//!
//! Construction of geometry can fail; tracing and shading cannot. Every
//! diagnostic the core emits goes through [`report`].

use std::fmt;

use thiserror::Error;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Correctable oddity; logged and execution continues with a best-effort value.
    Advisory,
    /// The offending node is dropped from the scene.
    Warning,
    /// The current render must stop.
    Abort,
    /// Internal invariant failure; the process should terminate.
    Panic,
}

impl Severity {
    /// Process exit status a binary should use, if this severity stops it.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Severity::Advisory | Severity::Warning => None,
            Severity::Abort => Some(1),
            Severity::Panic => Some(2),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Advisory => "advisory",
            Severity::Warning => "warning",
            Severity::Abort => "abort",
            Severity::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// The single diagnostic entry point of the core.
///
/// Advisories go to a dedicated log target so they can be silenced with
/// `RUST_LOG=rayshade::advisory=off`.
pub fn report(severity: Severity, message: impl fmt::Display) {
    match severity {
        Severity::Advisory => log::info!(target: "rayshade::advisory", "{message}"),
        Severity::Warning => log::warn!("{message}"),
        Severity::Abort => log::error!("{message}"),
        Severity::Panic => log::error!("fatal: {message}"),
    }
}

/// Errors raised while building geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    #[error("degenerate {kind}: {reason}")]
    Degenerate {
        kind: &'static str,
        reason: &'static str,
    },

    #[error("singular transform")]
    SingularTransform,

    #[error("malformed height field: {0}")]
    HeightField(String),

    #[error("unknown CSG operator `{0}`")]
    UnknownCsgOperator(String),

    #[error("malformed CSG: need at least two objects, found {0}")]
    MalformedCsg(usize),

    #[error("grid resolution must be positive on every axis, got {0:?}")]
    InvalidGridResolution([usize; 3]),
}

impl GeomError {
    pub(crate) fn degenerate(kind: &'static str, reason: &'static str) -> Self {
        GeomError::Degenerate { kind, reason }
    }

    pub fn severity(&self) -> Severity {
        match self {
            GeomError::Degenerate { .. }
            | GeomError::SingularTransform
            | GeomError::HeightField(_) => Severity::Warning,
            GeomError::UnknownCsgOperator(_)
            | GeomError::MalformedCsg(_)
            | GeomError::InvalidGridResolution(_) => Severity::Abort,
        }
    }
}

/// Result type for geometry construction.
pub type GeomResult<T> = Result<T, GeomError>;

/// Turns a failed construction into "no node" after reporting it.
pub trait OkOrReport<T> {
    fn ok_or_report(self) -> Option<T>;
}

impl<T> OkOrReport<T> for GeomResult<T> {
    fn ok_or_report(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                report(err.severity(), &err);
                None
            }
        }
    }
}

/// The bounded hit path refused another node.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("hit path exceeded its capacity of {capacity} nodes")]
pub struct HitPathOverflow {
    pub capacity: usize,
}
