use thiserror::Error;

use crate::constants::DIGEST_LEN;
use crate::framing::FrameError;

/// Error reported by a put sink through `PutCompletion::fail`.
pub type PutError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error covering decode, checksum, packing and put failures.
/// - `From<FrameError>` enables `?` from the codec into the pipelines.
/// - Every variant is delivered through a callback or return value, never a panic.
#[derive(Debug, Error)]
pub enum KplError {
    /// Trailing digest disagrees with the digest recomputed over the body.
    #[error("checksum mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.actual))]
    ChecksumMismatch {
        expected: [u8; DIGEST_LEN],
        actual: [u8; DIGEST_LEN],
    },

    /// Malformed body, dangling table index or truncated payload.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A single record cannot fit under the ceiling even as a lone sub-record.
    #[error("record of {size} encoded bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded { size: usize, limit: usize },

    /// The put sink reported failure for an emitted aggregate.
    #[error("put failed: {0}")]
    PutFailure(#[source] PutError),

    #[error("invalid aggregation profile: {0}")]
    InvalidProfile(String),
}

impl KplError {
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, KplError::ChecksumMismatch { .. })
    }

    pub fn is_protobuf_decode(&self) -> bool {
        matches!(self, KplError::Frame(FrameError::ProtobufDecode(_)))
    }

    pub fn is_table_index_out_of_range(&self) -> bool {
        matches!(self, KplError::Frame(FrameError::TableIndexOutOfRange { .. }))
    }

    pub fn is_size_limit_exceeded(&self) -> bool {
        matches!(self, KplError::SizeLimitExceeded { .. })
    }

    pub fn is_put_failure(&self) -> bool {
        matches!(self, KplError::PutFailure(_))
    }
}
