//! HTTP clients for the portal's external collaborators.
//!
//! Two services back the preference screens: the preference authority
//! (system of record for consent/opt-out state) and the engagement
//! platform (the downstream subscription mirror, which also receives
//! audit events). This crate provides a reqwest client per service and
//! the adapters that plug them into the `portal-core` gateway traits.

mod authority;
mod engagement;
mod error;
mod http;
mod types;

#[cfg(test)]
mod test_support;

pub use authority::*;
pub use engagement::*;
pub use error::*;
pub use types::*;
