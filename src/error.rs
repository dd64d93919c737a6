use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't find home directory, $HOME not set")]
    NoHome,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("signal delivery failed: {0}")]
    Signal(#[from] nix::errno::Errno),

    #[error("bad pid in {}", .0.display())]
    InvalidPid(PathBuf),

    #[error("daemon is not active ({} missing)", .0.display())]
    NotRunning(PathBuf),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
