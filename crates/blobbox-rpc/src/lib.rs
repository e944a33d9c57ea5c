//! Single-endpoint RPC dispatcher for the blob store

pub mod error;
pub mod methods;
pub mod protocol;
pub mod server;

pub use error::RpcError;
pub use protocol::RpcRequest;
pub use server::RpcServer;
