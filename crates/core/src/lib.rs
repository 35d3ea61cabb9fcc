//! Greengrocer Core - Shared types library.
//!
//! This crate provides the domain types used by the Greengrocer storefront:
//! catalog records, type-safe identifiers, and the pure cart state machine.
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! database access, no HTTP. Session persistence and product lookup live in
//! the `storefront` crate; everything here is testable in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, `Category`/`Product` records, and cart types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
