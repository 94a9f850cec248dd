// SPDX-License-Identifier: MIT
//
// Flush errors.
//
// Partial writes are not errors: writers resume them silently. What
// reaches the caller is either a failure the writer gave up on right away
// or one that outlasted the retry budget. Either way the buffer is left
// untouched so the caller can retry the whole flush or drop the frame.

use std::io;

/// Why a flush did not drain the buffer.
#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    /// The target failed with an error that is not worth retrying.
    #[error("console write failed: {0}")]
    Io(#[from] io::Error),

    /// Every allowed attempt failed with a retryable error.
    #[error("console write failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: io::Error,
    },
}

impl FlushError {
    /// The underlying I/O error from the last failed write.
    #[must_use]
    pub const fn io_error(&self) -> &io::Error {
        match self {
            Self::Io(err) | Self::RetriesExhausted { source: err, .. } => err,
        }
    }

    /// Shorthand for `self.io_error().kind()`.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.io_error().kind()
    }

    /// How many write calls failed before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Io(_) => 1,
            Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }
}

impl From<FlushError> for io::Error {
    fn from(err: FlushError) -> Self {
        match err {
            FlushError::Io(err) | FlushError::RetriesExhausted { source: err, .. } => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_variant_reports_one_attempt() {
        let err = FlushError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn exhausted_keeps_source() {
        let err = FlushError::RetriesExhausted {
            attempts: 4,
            source: io::Error::from(io::ErrorKind::Interrupted),
        };
        assert_eq!(err.attempts(), 4);
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("after 4 attempts"));
    }

    #[test]
    fn converts_back_to_io_error() {
        let err = FlushError::RetriesExhausted {
            attempts: 4,
            source: io::Error::new(io::ErrorKind::WouldBlock, "busy"),
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(io_err.to_string(), "busy");
    }
}
