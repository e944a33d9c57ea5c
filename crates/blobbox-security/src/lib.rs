//! Request sanitizing
//!
//! Strings arriving over the wire are HTML-escaped before they are routed or
//! stored, so any page that later echoes them back renders them as text.

pub mod escape;

pub use escape::{escape_html, sanitize_value};
