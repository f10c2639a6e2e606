use crate::index::BlockId;

/// Contract violations reported by the checked `try_*` entry points.
///
/// The unchecked entry points panic with the same message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("block {0} is already registered")]
    DuplicateBlock(BlockId),

    #[error("block {0} is not registered")]
    UnknownBlock(BlockId),
}
