//! Build execution.
//!
//! - `service`: the compile/release contract for one service
//! - `stack`: staging every service of a stack and writing `deploy.json`
//! - `types`: release metadata, deploy descriptor and errors

pub mod service;
pub mod stack;
pub mod types;

pub use service::ServiceBuilder;
pub use stack::{StackBuildError, build_stack};
pub use types::{BuildError, DeployDescriptor, ReleaseFailure, ReleaseMetadata, parse_release};
