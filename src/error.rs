#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The peer tore the stream down without delivering the in-band
    /// end-of-data marker.
    #[error("Stream closed before end-of-data")]
    StreamClosed,

    /// A receive on the remote stream failed at the transport level.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The native engine reported a fault while stepping its cursor.
    #[error("Engine failure: {0}")]
    Engine(String),

    /// An empty key is passed to a read or write operation.
    #[error("Key cannot be empty")]
    EmptyKey,
}
