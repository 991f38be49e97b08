//! stackbrew-lib: buildpack-driven builds for multi-service stacks.
//!
//! A stack is a set of named services declared in a `Stackfile`. Each service
//! names a buildpack, a directory exposing `bin/compile` and optionally
//! `bin/release`. This crate provides:
//! - `stack`: loading the stack descriptor
//! - `buildpack`: resolving buildpack references to local directories
//! - `build`: running the compile/release contract and writing `deploy.json`
//! - `convert`: turning a custom service into a standalone buildpack

pub mod build;
pub mod buildpack;
pub mod config;
pub mod consts;
pub mod convert;
pub mod lock;
pub mod process;
pub mod stack;
pub mod util;
