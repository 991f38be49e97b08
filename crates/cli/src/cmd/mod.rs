mod build;
mod buildscript;
mod convert;
mod info;
mod services;

pub use build::cmd_build;
pub use buildscript::cmd_buildscript;
pub use convert::cmd_convert;
pub use info::cmd_info;
pub use services::cmd_services;
