use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Everything that can go wrong between asking for a page and getting
/// typed records back. Per-record parse problems are not here on purpose:
/// those are logged and skipped, never raised.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// The webdriver session never produced a `notbot` cookie before the
    /// poll deadline.
    #[error("notbot cookie did not appear within {timeout_ms}ms")]
    TokenTimeout { timeout_ms: u64 },

    /// The webdriver endpoint answered with something other than what the
    /// W3C protocol promises.
    #[error("webdriver error: {message}")]
    WebDriver { message: String },

    /// The server response did not carry the cookie we were priming for.
    #[error("server did not issue a {name} cookie")]
    MissingCookie { name: &'static str },

    /// Caller asked for a verb the endpoint is never driven with.
    /// Raised before any network activity.
    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    /// Anything but 200 from the schedule endpoint.
    #[error("server returned status {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A page was required but the body had zero bytes.
    #[error("response body is empty")]
    EmptyBody,

    #[error("response body is not valid UTF-8")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    /// The schedule page parsed fine but held no `table`-class element,
    /// which means we were served the wrong page entirely.
    #[error("no schedule table in response")]
    MissingScheduleTable,
}

impl ScraperError {
    /// True when a credential (token or session cookie) could not be obtained.
    #[must_use]
    pub fn is_acquisition_error(&self) -> bool {
        matches!(
            self,
            Self::TokenTimeout { .. } | Self::WebDriver { .. } | Self::MissingCookie { .. }
        )
    }

    /// True when the main dispatch failed at the HTTP level.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { .. } | Self::Transport(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::TokenTimeout { .. } => true,
            Self::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }
}
