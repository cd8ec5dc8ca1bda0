use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    /// The feed could not be fetched or parsed, or carries nothing we can post.
    #[error("{0}")]
    Source(String),

    /// Command input that cannot be acted on.
    #[error("{0}")]
    Rejected(String),

    #[error("A feed named '{0}' already exists.")]
    DuplicateName(String),

    #[error("Feed '{0}' not found.")]
    NotFound(String),

    /// A store update targeted a feed that was removed in the meantime.
    #[error("Feed #{0} no longer exists")]
    Gone(i64),

    #[error("Failed to deliver to <#{channel_id}>: {reason}")]
    Delivery { channel_id: u64, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl FeedError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        FeedError::Source(reason.into())
    }

    /// Errors a command caller can act on, as opposed to internal failures.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, FeedError::Database(_) | FeedError::Gone(_))
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
