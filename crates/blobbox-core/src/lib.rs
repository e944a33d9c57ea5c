//! Core domain models for blobbox
//!
//! This crate contains:
//! - Document naming rules and JSON encoding
//! - The closed set of RPC operations
//! - Result and envelope wire types
//! - Capacity accounting

pub mod document;
pub mod envelope;
pub mod error;
pub mod operation;
pub mod quota;

pub use document::{MAX_NAME_LEN, encode_value, validate_name};
pub use envelope::{Envelope, OperationResult, Outcome};
pub use error::{CoreError, Result};
pub use operation::Operation;
pub use quota::{DEFAULT_CAPACITY_BYTES, QuotaPolicy};
