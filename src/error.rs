use thiserror::Error;

use crate::ir::{InstId, ProgramPoint, StorageId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Normal operation of the analyses never fails: degenerate inputs (no paths, empty live
/// intervals, missing alias information) degrade to empty or conservative results. Errors are
/// reserved for malformed input graphs, API misuse, and the fatal verification failure.
///
/// # Error Categories
///
/// ## Construction Errors
/// - [`Error::Malformed`] - The function handed to the builder is structurally invalid
/// - [`Error::GraphError`] - An edge references a node that does not exist
///
/// ## Lookup Errors
/// - [`Error::InstructionNotFound`] - An instruction id outside the function
/// - [`Error::StorageNotFound`] - A storage id outside the function
/// - [`Error::StorageKindMismatch`] - A register query on a stack slot or vice versa
///
/// ## Interval Errors
/// - [`Error::OverlappingRange`] - Insert into an interval set would overlap an existing range
///
/// ## Verification
/// - [`Error::ShadowVerification`] - A region redefines one of its own live-in values
///
/// # Examples
///
/// ```rust
/// use idemregions::{Error, FunctionBuilder};
///
/// let builder = FunctionBuilder::new("empty");
/// match builder.finish() {
///     Err(Error::Malformed { message, .. }) => assert!(message.contains("no blocks")),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The function is structurally invalid.
    ///
    /// Raised when a function is assembled from inconsistent pieces: no blocks, a block
    /// without instructions, or operands referring to instructions that do not exist.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Graph manipulation failed.
    ///
    /// The string describes which endpoint was invalid.
    #[error("{0}")]
    GraphError(String),

    /// An instruction id does not belong to the function.
    #[error("Instruction not found - {0}")]
    InstructionNotFound(InstId),

    /// A storage id does not belong to the function.
    #[error("Storage location not found - {0}")]
    StorageNotFound(StorageId),

    /// A query was made with a storage location of the wrong kind.
    ///
    /// Register coalescing queries reject stack slots, stack-slot queries require at least
    /// one stack slot.
    #[error("Storage location {storage} is not a {expected}")]
    StorageKindMismatch {
        /// The offending storage location
        storage: StorageId,
        /// Description of the kind the query required
        expected: &'static str,
    },

    /// An insert into an interval set would overlap an existing range.
    ///
    /// Interval sets keep their ranges disjoint; callers subtract existing coverage first.
    #[error("Range [{start}, {end}) overlaps an existing range")]
    OverlappingRange {
        /// Start of the rejected range
        start: ProgramPoint,
        /// End (exclusive) of the rejected range
        end: ProgramPoint,
    },

    /// Shadow verification found a region that redefines one of its own live-in values.
    ///
    /// This means the region structure is not idempotent for the storage location, and any
    /// coalescing or region decision built on it would be unsafe. The query that triggered
    /// the verification is aborted.
    #[error("Shadow of {storage} in [{start}, {end}) is clobbered by {clobber}")]
    ShadowVerification {
        /// The storage location whose shadow failed verification
        storage: StorageId,
        /// The instruction redefining the live-in value
        clobber: InstId,
        /// Start of the verified range
        start: ProgramPoint,
        /// End (exclusive) of the verified range
        end: ProgramPoint,
    },
}
