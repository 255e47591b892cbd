//! Scribe - Writing-assistance relay backend
//!
//! This crate provides the HTTP service that forwards user text to a
//! hosted LLM and relays the response back: a rewritten version, a list
//! of structured suggestions, or a live streamed critique.

pub mod assist;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod testing;
pub mod upstream;

pub use error::ScribeError;
