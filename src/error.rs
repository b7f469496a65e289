use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    NotAuthenticated,
    EncodingRange { heat: i64, cool: i64 },
    RemoteRead { dsn: String, message: String },
    RemoteWrite { dsn: String, property: String, message: String },
    VerificationMismatch { property: String, requested: i64, confirmed: i64 },
    RetriesExhausted { dsn: String, attempts: u32 },
    UnknownDevice(String),
    MissingPropertyKey(&'static str),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::NotAuthenticated => write!(f, "not authenticated"),
            Error::EncodingRange { heat, cool } => {
                write!(f, "setpoint out of range 0..=255: heat={heat} cool={cool}")
            }
            Error::RemoteRead { dsn, message } => {
                write!(f, "remote read failed for {dsn}: {message}")
            }
            Error::RemoteWrite { dsn, property, message } => {
                write!(f, "remote write of {property} failed for {dsn}: {message}")
            }
            Error::VerificationMismatch { property, requested, confirmed } => write!(
                f,
                "{property} write not confirmed: requested {requested}, device echoed {confirmed}"
            ),
            Error::RetriesExhausted { dsn, attempts } => {
                write!(f, "gave up writing to {dsn} after {attempts} attempts")
            }
            Error::UnknownDevice(dsn) => write!(f, "unknown device: {dsn}"),
            Error::MissingPropertyKey(name) => {
                write!(f, "property {name} has not been seen yet, cannot write")
            }
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
