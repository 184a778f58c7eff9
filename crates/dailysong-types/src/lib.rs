//! Shared types for Daily Song.
//!
//! `models` holds the domain records the core and the store agree on,
//! `api` holds the JSON bodies exchanged over HTTP.

pub mod api;
pub mod models;
