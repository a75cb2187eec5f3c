use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection mode '{0}' not supported")]
    UnsupportedMode(String),

    #[error("could not connect to any sentinel host")]
    NoReachableHosts,

    #[error("not connected")]
    NotConnected,

    #[error("malformed sentinel reply: {0}")]
    MalformedReply(String),

    #[error("no master servers found")]
    NoMasterFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
