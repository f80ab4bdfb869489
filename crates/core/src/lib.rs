//! Domain core for the customer portal's notification preferences.
//!
//! Holds the static subscription-group mapping table, the per-session
//! preference snapshot store, the pure diff/translation engine, and the
//! sync orchestrator that sequences the writes to the preference
//! authority and the engagement platform. All remote access goes through
//! injected gateway traits; this crate performs no I/O of its own.

pub mod errors;
pub mod events;
pub mod preferences;
