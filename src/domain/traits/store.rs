use crate::application::errors::StorageError;
use crate::domain::entities::Memo;

/// Store trait - persistence for memos left between users
pub trait MemoStore: Send + Sync {
    /// Save a memo and return its id
    fn save_memo(&self, user_to: &str, user_from: &str, message: &str) -> Result<i64, StorageError>;

    /// Memos left by `user_from` that have not been delivered yet, oldest first
    fn memos_from(&self, user_from: &str) -> Result<Vec<Memo>, StorageError>;

    /// Remove and return every memo addressed to `user_to`, oldest first.
    /// Nothing is removed if the call fails.
    fn take_memos_for(&self, user_to: &str) -> Result<Vec<Memo>, StorageError>;
}
