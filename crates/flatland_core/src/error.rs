//! # Flat Error Types
//!
//! All errors that can occur while creating, manipulating or exporting a flat.

use thiserror::Error;

/// Errors that can occur in the flat raster engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlatError {
    /// A caller-supplied argument was malformed or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested region does not lie inside the flat.
    #[error(
        "invalid region: x={x} z={z} size={size_x}x{size_z} does not fit flat of size {flat_size_x}x{flat_size_z}"
    )]
    InvalidRegion {
        /// Region origin X.
        x: i32,
        /// Region origin Z.
        z: i32,
        /// Region width.
        size_x: i32,
        /// Region depth.
        size_z: i32,
        /// Flat width.
        flat_size_x: usize,
        /// Flat depth.
        flat_size_z: usize,
    },

    /// No manipulator is registered under this name.
    #[error("unknown manipulator '{name}', known manipulators: {known}")]
    UnknownManipulator {
        /// The requested name.
        name: String,
        /// Comma separated list of registered names.
        known: String,
    },

    /// A manipulator rejected its input.
    #[error("manipulator '{name}' failed: {source}")]
    ManipulatorFailed {
        /// Manipulator name.
        name: String,
        /// Underlying failure.
        #[source]
        source: Box<FlatError>,
    },

    /// A referenced flat, layer, world or chunk does not exist.
    #[error("{what} not found: {key}")]
    NotFound {
        /// Kind of the missing entity.
        what: &'static str,
        /// Lookup key.
        key: String,
    },

    /// The stored flat changed since it was loaded.
    #[error("flat {id} was modified concurrently: expected version {expected}, found {found}")]
    Conflict {
        /// Flat id.
        id: String,
        /// Version the caller loaded.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// Storage backend failure.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Encoding or decoding of persisted data failed.
    #[error("codec failure: {0}")]
    Codec(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FlatError {
    /// Shorthand for [`FlatError::InvalidArgument`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for [`FlatError::NotFound`].
    #[must_use]
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Returns true if the caller should see this as an invalid-argument failure.
    ///
    /// Missing references are reported the same way; the job layer decides on
    /// retries. Storage, codec and conflict failures are infrastructure errors.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidArgument(_)
            | Self::InvalidRegion { .. }
            | Self::UnknownManipulator { .. }
            | Self::ManipulatorFailed { .. }
            | Self::NotFound { .. }
            | Self::Config(_) => true,
            Self::Conflict { .. } | Self::Storage(_) | Self::Codec(_) => false,
        }
    }
}

/// Result type for flat operations.
pub type FlatResult<T> = Result<T, FlatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_counts_as_invalid_argument() {
        assert!(FlatError::not_found("flat", "w/l/f").is_invalid_argument());
        assert!(FlatError::invalid("bad").is_invalid_argument());
        assert!(!FlatError::Storage("disk".into()).is_invalid_argument());
    }

    #[test]
    fn test_wrapped_message_keeps_cause() {
        let err = FlatError::ManipulatorFailed {
            name: "crater".into(),
            source: Box::new(FlatError::invalid("radius")),
        };
        assert_eq!(
            err.to_string(),
            "manipulator 'crater' failed: invalid argument: radius"
        );
    }
}
