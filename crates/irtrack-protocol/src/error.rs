use std::io;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("invalid IPv4 address {0:?}")]
    InvalidAddress(String),
    #[error("port must be in 1..=65535, got {0}")]
    InvalidPort(u16),
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}
