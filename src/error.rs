use thiserror::Error;

/// Maximum number of body characters kept in a [`ParseError`].
pub const EXCERPT_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: inverter returned status {status}")]
    Http { status: u16 },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Connection refused, DNS failure, timeout and other failures below HTTP.
    ///
    /// A request that could not even be built (for example an unusable host)
    /// is not a transport failure: retrying cannot fix it.
    pub fn is_transport(&self) -> bool {
        match self {
            ExporterError::Transport(e) => {
                !e.is_builder()
                    && (e.is_connect() || e.is_timeout() || e.is_request() || e.is_body())
            }
            _ => false,
        }
    }
}

/// The inverter answered, but the body matched neither wire format.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no key=value lines found in response: {excerpt:?}")]
    NoFields { excerpt: String },

    #[error("no \"Data\" array found in response: {excerpt:?}")]
    MissingDataArray { excerpt: String },

    #[error("malformed document ({source}): {excerpt:?}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },
}

impl ParseError {
    pub fn excerpt(&self) -> &str {
        match self {
            ParseError::NoFields { excerpt }
            | ParseError::MissingDataArray { excerpt }
            | ParseError::Malformed { excerpt, .. } => excerpt,
        }
    }
}

/// Bounded prefix of a response body, cut on a character boundary.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Failure of the very first fetch for an inverter.
///
/// The two variants tell the caller whether retrying later makes sense.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Transport-level failure: the inverter may simply not be reachable yet.
    #[error("Inverter not ready, retry later: {0}")]
    NotReady(#[source] ExporterError),

    /// The inverter answered but rejected us or returned garbage.
    #[error("Invalid credentials or setup: {0}")]
    InvalidSetup(#[source] ExporterError),
}

impl SetupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SetupError::NotReady(_))
    }
}

impl From<ExporterError> for SetupError {
    fn from(err: ExporterError) -> Self {
        if err.is_transport() {
            SetupError::NotReady(err)
        } else {
            SetupError::InvalidSetup(err)
        }
    }
}

/// Signal raised by a poll cycle after setup. The previous snapshot stays in place.
#[derive(Debug, Clone, Error)]
#[error("Update failed: {message}")]
pub struct UpdateFailed {
    pub message: String,
}

impl From<ExporterError> for UpdateFailed {
    fn from(err: ExporterError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
