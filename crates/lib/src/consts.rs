pub const APP_NAME: &str = "stackbrew";

/// Stack descriptor file names, in priority order.
pub const STACKFILE_NAMES: &[&str] = &["Stackfile", "stackfile", "dotcloud.yml", "dotcloud_build.yml"];

/// Environment variable holding the colon-separated buildpack search path.
pub const BUILDPACK_PATH_ENV: &str = "BUILDPACK_PATH";

/// Environment variable overriding the remote buildpack download root.
pub const CACHE_DIR_ENV: &str = "STACKBREW_CACHE_DIR";

/// Name of the persistent cache directory inside a buildpack.
pub const BUILDPACK_CACHE_DIR: &str = "_cache";

/// Name of the deploy descriptor written at the root of a build directory.
pub const DEPLOY_FILENAME: &str = "deploy.json";

/// Service type that marks an inline build script rather than a buildpack.
pub const CUSTOM_SERVICE_TYPE: &str = "custom";
