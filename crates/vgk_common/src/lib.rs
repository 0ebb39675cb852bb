//! Shared foundational types used across the toolchain.
//!
//! This crate provides core types including interned identifiers, content
//! hashing, and common result types. Four-state logic values live in
//! `vgk_fourstate`, which supersedes the bit/word-oriented logic values this
//! crate used to carry.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, VgkResult};
