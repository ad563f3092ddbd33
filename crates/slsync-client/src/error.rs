use thiserror::Error;

/// Errors returned by the SelectLine API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The login endpoint did not yield a usable token.
    #[error("SelectLine authentication failed: {0}")]
    Auth(String),

    /// A non-2xx status that is neither an auth failure nor transient.
    /// Carries a truncated response body for diagnostics.
    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The pager hit its safety cap, which indicates the remote API is
    /// ignoring the paging parameters.
    #[error("pagination cap of {max_pages} pages reached while fetching {collection}")]
    PaginationLimit {
        collection: String,
        max_pages: usize,
    },
}
