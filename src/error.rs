use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    /// Failure reported by an injected [`HttpClient`](crate::HttpClient)
    /// that isn't backed by reqwest.
    Client(String),
    Config(String),
    InvalidUrl {
        target: String,
        reason: String,
    },
    Json {
        source: serde_json::Error,
        body: String,
    },
    Validation(&'static str),
    Update {
        kind: &'static str,
        reason: String,
    },
    UnknownUpdate {
        kind: &'static str,
    },
    Context {
        context: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Raw response text that failed to decode, if this error (or one it
    /// wraps) came from the JSON decoder.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::Json { body, .. } => Some(body),
            Error::Context { source, .. } => source.raw_body(),
            _ => None,
        }
    }

    /// Innermost error, skipping any context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "{e}"),
            Error::Client(msg) => write!(f, "{msg}"),
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Error::InvalidUrl { target, reason } => write!(f, "parse {target:?}: {reason}"),
            Error::Json { source, .. } => write!(f, "decoding json: {source}"),
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::Update { kind, reason } => write!(f, "{kind} update error: {reason}"),
            Error::UnknownUpdate { kind } => write!(f, "{kind} unknown error"),
            Error::Context { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json { source, .. } => Some(source),
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) trait ResultExt<T> {
    fn context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T> {
        self.map_err(|source| Error::Context {
            context: f().into(),
            source: Box::new(source),
        })
    }
}
