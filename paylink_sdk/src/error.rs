use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport-level failure: the server was unreachable or the response
    /// body did not parse.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status and message.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// The requested link id was never issued.
    #[error("link not found")]
    LinkNotFound,
}
