//! Error taxonomy for the resolver.

use std::io;

/// Maximum alias restarts before a chain is declared a loop.
pub const MAX_ALIAS_RESTARTS: usize = 8;

/// Everything that can go wrong while resolving a name.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The response carried a different transaction id than the query.
    /// The datagram cannot be trusted, so the whole attempt is abandoned.
    #[error("unmatched transaction: response id does not match query id")]
    TransactionMismatch,

    /// The server answered with a non-success response code.
    #[error("query failed; rcode={0}")]
    QueryFailed(u8),

    /// No datagram arrived within the per-query deadline.
    #[error("timed out waiting for a response")]
    Timeout,

    /// The candidate list for a hop was empty.
    #[error("no response from contacted servers")]
    NoResponse,

    /// The walk ended without an address and without anywhere left to go.
    #[error("unable to find answer")]
    NoAnswer,

    /// A CNAME chain kept redirecting past the restart budget.
    #[error("alias chain exceeded {MAX_ALIAS_RESTARTS} restarts")]
    AliasLoop,

    /// The response bytes could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(&'static str),

    /// A candidate server name could not be turned into an address.
    #[error("cannot reach server {0}")]
    BadServer(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
