//! Inbound adapters translating external requests into driving port calls.
//!
//! Framework details stay at this edge; the domain sees only port requests.

pub mod http;
