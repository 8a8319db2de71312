//! Error kinds for the GC core.
//!
//! Mirrors the hand-rolled `Error`/`Errno` pattern the rest of this
//! filesystem's storage stack uses (`Error::with_msg(errno, msg)`,
//! `return_errno_with_msg!(errno, msg)`, `.errno()`) rather than pulling in
//! a separate error-derive crate.

use core::fmt;

/// The kinds of errors the GC core can report, per the propagation policy.
///
/// `Invalidated` and `StaleReference` are not surfaced to callers of the
/// orchestrator: the relocators resolve them into a silent skip of the
/// current block. They exist here because the liveness oracle and the
/// relocation passes need a way to communicate them to their immediate
/// caller before that caller decides to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    NoMemory,
    IoError,
    StaleReference,
    Invalidated,
    NoVictim,
    /// A victim section was selected and relocated but the call still
    /// reclaimed nothing (foreground partial-failure bail-out) — distinct
    /// from [`Errno::NoVictim`], where selection itself found no candidate.
    Again,
    CheckpointError,
    FilesystemInactive,
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Errno::NoMemory => "no memory",
            Errno::IoError => "I/O error",
            Errno::StaleReference => "stale reference",
            Errno::Invalidated => "block invalidated",
            Errno::NoVictim => "no victim segment",
            Errno::Again => "victim reclaimed nothing, try again",
            Errno::CheckpointError => "checkpoint error",
            Errno::FilesystemInactive => "filesystem inactive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub fn new(errno: Errno) -> Self {
        Self { errno, msg: None }
    }

    pub fn with_msg(errno: Errno, msg: &'static str) -> Self {
        Self {
            errno,
            msg: Some(msg),
        }
    }

    pub fn errno(&self) -> Errno {
        self.errno
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{}: {}", self.errno, msg),
            None => write!(f, "{}", self.errno),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

/// `return_errno_with_msg!(IoError, "failed to read node page")` expands to
/// an early `return Err(...)`, matching the call-site shape used across the
/// rest of the storage stack.
#[macro_export]
macro_rules! return_errno_with_msg {
    ($errno:ident, $msg:expr) => {
        return Err($crate::error::Error::with_msg($crate::error::Errno::$errno, $msg))
    };
}
