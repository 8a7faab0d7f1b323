//! Infrastructure implementations for the Ada Marie brain relay.
//!
//! Adapters behind the ports defined in `adabrain-core`: the SQLite
//! memory store, the OpenAI-compatible upstream agent backend, and the
//! loaders for `config.toml` and the persona character card.

pub mod character;
pub mod config;
pub mod sqlite;
pub mod upstream;
