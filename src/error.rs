use thiserror::Error;

/// Failure to obtain a day's table of contents. Fatal for that day.
#[derive(Debug, Error)]
pub enum TocError {
    #[error("day identifier is empty")]
    EmptyDayId,

    #[error("request table of contents for {day_id}: {message}")]
    Transport { day_id: String, message: String },

    #[error("table of contents for {day_id} returned HTTP {status}")]
    Status { day_id: String, status: u16 },

    #[error("table of contents for {day_id} has an empty body")]
    EmptyBody { day_id: String },

    #[error("decode table of contents for {day_id}: {message}")]
    Decode { day_id: String, message: String },

    #[error("table of contents for {day_id} has no entries")]
    NoEntries { day_id: String },

    #[error("topic {topic_id} is not part of the table of contents for {day_id}")]
    TopicNotFound { day_id: String, topic_id: String },
}

/// Failure of a single fragment request. Whether it is retried is decided by
/// [`crate::retry::RetryPolicy::is_transient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("topic identifier is empty")]
    EmptyTopicId,

    #[error("fragment endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("fragment request timed out")]
    Timeout,

    #[error("fragment request failed: {0}")]
    Transport(String),

    #[error("fragment response body is empty")]
    EmptyBody,

    #[error("malformed fragment payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("fragment does not contain any markup")]
    NotMarkup,
}

/// Why a day produced no output. Per-topic failures are warnings instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Toc(#[from] TocError),
}
