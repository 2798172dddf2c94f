//! The per-line diagnostic stream.
//!
//! These are user-facing compiler diagnostics ("file:line: error: ..."),
//! distinct from the `log` facade's developer trace output (iteration
//! counts, chosen encoding lengths) — see §4.9/§7 of the design. Errors here
//! never unwind: callers record them and keep going with the next line.

pub const MAX_ERRORS: usize = 10_000;

#[derive(Debug, Default)]
pub struct Diagnostics {
    pub error_count: usize,
    pub warning_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.warning_count = 0;
    }

    pub fn error(&mut self, file: &str, line: usize, message: impl std::fmt::Display) {
        eprintln!("{file}:{line}: error: {message}");
        self.error_count += 1;
    }

    pub fn warn(&mut self, file: &str, line: usize, message: impl std::fmt::Display) {
        eprintln!("{file}:{line}: warning: {message}");
        self.warning_count += 1;
    }

    pub fn abandoned(&self) -> bool {
        self.error_count >= MAX_ERRORS
    }
}
