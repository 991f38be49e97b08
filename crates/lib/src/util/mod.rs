//! Shared utilities.
//!
//! Filesystem helpers used by staging and conversion, plus test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;
