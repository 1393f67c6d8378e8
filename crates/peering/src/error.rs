use autopeer_autopeering::PeerId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeeringError {
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),
    #[error("peer {0} is already registered")]
    AlreadyRegistered(String),
    #[error("autopeer {id} is already connected as {identity}")]
    AutopeerConnected { id: PeerId, identity: String },
    #[error("peer {0} is statically peered")]
    StaticPrecedence(String),
    #[error("peer {0} not found")]
    NotFound(String),
    #[error("peer {0} is not whitelisted")]
    NotWhitelisted(String),
}
