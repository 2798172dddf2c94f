//! Resource/configuration failures.
//!
//! Per-line diagnostics (lexical/syntactic/semantic/convergence) are not
//! represented here — they are reported directly through
//! [`crate::assembler::Diagnostics`] and counted, never unwound. This enum
//! covers only the failures that abort the whole run: a file that cannot be
//! opened, an include stack that runs too deep, an output that cannot be
//! written.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum AssemblerError {
    Io(io::Error),
    FileNotFound(PathBuf),
    IncludeTooDeep { path: PathBuf, depth: usize },
    PathTooLong(PathBuf),
    TooManyErrors { count: usize },
    AssemblyFailed { errors: usize },
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblerError::Io(e) => write!(f, "I/O error: {e}"),
            AssemblerError::FileNotFound(path) => {
                write!(f, "could not open {}", path.display())
            }
            AssemblerError::IncludeTooDeep { path, depth } => write!(
                f,
                "include nesting exceeded {depth} while including {}",
                path.display()
            ),
            AssemblerError::PathTooLong(path) => {
                write!(f, "path too long: {}", path.display())
            }
            AssemblerError::TooManyErrors { count } => {
                write!(f, "abandoned file after {count} errors")
            }
            AssemblerError::AssemblyFailed { errors } => {
                write!(f, "assembly failed with {errors} error(s)")
            }
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<io::Error> for AssemblerError {
    fn from(error: io::Error) -> Self {
        AssemblerError::Io(error)
    }
}
