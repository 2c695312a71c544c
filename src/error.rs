use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("this application requires root privileges")]
    NotRoot,

    #[error("no wireless interface found")]
    NoInterface,

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("could not install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
