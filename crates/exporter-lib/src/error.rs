/// Errors returned by the NSX-T data-access layer.
///
/// The collection pipeline treats every variant as opaque: it is logged and
/// either aborts the family (list calls) or skips one object (detail calls).
///
/// # Examples
///
/// ```rust
/// use exporter_lib::error::ApiError;
///
/// let err = ApiError::Status { status: 403, body: "forbidden".to_string() };
/// assert!(err.to_string().contains("403"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx status code from the manager API.
    #[error("NSX-T API HTTP error: status={status}, body={body}")]
    Status { status: u16, body: String },

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request URL could not be built from the configured host.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Any other failure reported by a data-access implementation.
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias so callers can write `error::ApiResult<T>`.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Why a collector produced nothing for a scrape.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The family's primary list call failed on some page.
    #[error("{collector}: failed to list {object}: {source}")]
    List {
        collector: String,
        object: &'static str,
        #[source]
        source: ApiError,
    },

    /// The collector task panicked before finishing.
    #[error("{collector}: collector task panicked: {message}")]
    Panicked { collector: String, message: String },
}

impl CollectError {
    pub fn list(collector: impl Into<String>, object: &'static str, source: ApiError) -> Self {
        Self::List {
            collector: collector.into(),
            object,
            source,
        }
    }

    /// Whether the collector failed outright rather than reporting an API error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}
