use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("join request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("game master rejected join: status {0}")]
    Rejected(u16),
    #[error("gave up joining after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },
    #[error("join cancelled by shutdown")]
    Cancelled,
}

/// Failure to turn an inbound call into a reply.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown method {0}")]
    UnknownMethod(String),
    #[error("method {0} only accepts POST")]
    MethodNotAllowed(String),
    #[error("malformed {method} payload: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {method} reply: {source}")]
    Encode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read request body: {0}")]
    Body(#[from] io::Error),
}

impl RpcError {
    pub fn status_code(&self) -> u16 {
        match self {
            RpcError::UnknownMethod(_) => 404,
            RpcError::MethodNotAllowed(_) => 405,
            RpcError::Decode { .. } | RpcError::Body(_) => 400,
            RpcError::Encode { .. } => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("cannot listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Server(String),
    #[error("cannot install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
