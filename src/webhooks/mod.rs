//! Payment webhook handling.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256 over the raw
//!   body, bound to a timestamp)
//! - Parsing of provider events into the one typed event the gateway acts on

pub mod events;
pub mod signature;

pub use events::{CheckoutCompleted, ParseError, parse_event};
pub use signature::{
    SIGNATURE_TOLERANCE_SECS, compute_signature, format_signature_header, parse_signature_header,
    verify_signature,
};
