/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Crate-wide error type.
//!
//! Every failure is raised synchronously at the point of detection and
//! propagates to the immediate caller. Nothing inside the crate retries or
//! recovers; the orchestrator decides whether to lower `max_cluster_size`,
//! raise `mem_limit`, or abort.

use alloc::string::String;
use core::fmt;

use crate::identity::ImageId;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong in the review loop.
#[derive(Debug)]
pub enum Error {
    /// The partition contains no clusters to lay out (after filtering).
    EmptyInput,

    /// An image does not share the pixel footprint of the rest of the layout.
    InconsistentShape {
        /// Offending image.
        id: ImageId,
        /// `(height, width)` of the first rendered image.
        expected: (usize, usize),
        /// `(height, width)` of the offending image.
        found: (usize, usize),
    },

    /// The estimated raster size exceeds the memory budget.
    ///
    /// Raised before the canvas is allocated.
    CapacityExceeded {
        /// Estimated raster size in bytes.
        estimated: u64,
        /// Configured budget in bytes.
        limit: u64,
    },

    /// Malformed feedback value or out-of-range configuration.
    InvalidInput {
        /// Which input was rejected.
        what: &'static str,
        /// Human-readable reason.
        detail: String,
    },

    /// A cluster references an image with no decoded buffer.
    MissingImage {
        /// Identifier with no buffer.
        id: ImageId,
    },

    /// I/O failure while presenting or exporting.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(what: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            what,
            detail: detail.into(),
        }
    }
}

const MIB: f64 = 1024.0 * 1024.0;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "no clusters to lay out"),
            Error::InconsistentShape {
                id,
                expected,
                found,
            } => write!(
                f,
                "image '{}' is {}x{} (h x w), expected {}x{}",
                id, found.0, found.1, expected.0, expected.1
            ),
            Error::CapacityExceeded { estimated, limit } => write!(
                f,
                "size of plot array ({:.2} MiB) > mem_limit ({:.2} MiB)",
                *estimated as f64 / MIB,
                *limit as f64 / MIB
            ),
            Error::InvalidInput { what, detail } => write!(f, "invalid {}: {}", what, detail),
            Error::MissingImage { id } => write!(f, "no image buffer for '{}'", id),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
