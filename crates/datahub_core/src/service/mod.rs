//! Use-case services over the record repository.
//!
//! # Responsibility
//! - Translate untyped requests into typed repository calls.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod dispatcher;
