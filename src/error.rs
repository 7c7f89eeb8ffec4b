//! Error types for the dropshell crate.

use thiserror::Error;

/// Result type alias using dropshell's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the terminal adapter.
///
/// The layout and identity engine itself never returns errors across its
/// public boundary: unknown identifiers and structural no-ops are reported
/// through sentinel return values. `Error` covers only the terminal-emulator
/// collaborator (PTY creation, spawning, resizing).
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to spawn a PTY process.
    #[error("failed to spawn PTY: {0}")]
    PtySpawn(#[from] std::io::Error),

    /// Anyhow error from portable-pty.
    #[error("PTY error: {0}")]
    Pty(#[from] anyhow::Error),

    /// Failed to create PTY pair.
    #[error("failed to create PTY: {0}")]
    PtyCreate(String),

    /// The terminal-emulator collaborator could not be instantiated.
    ///
    /// The owning pane is still created, in a degraded state.
    #[error("terminal unavailable: {0}")]
    TerminalUnavailable(String),

    /// The terminal behind a pane has shut down.
    #[error("terminal has been closed")]
    TerminalClosed,

    /// PTY resize failed.
    #[error("failed to resize PTY: {0}")]
    Resize(String),
}
