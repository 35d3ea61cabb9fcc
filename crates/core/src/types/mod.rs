//! Core types for Greengrocer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod product;

pub use cart::{CartContents, CartEntry, CartError, CartItem};
pub use id::*;
pub use product::{Category, Product};
