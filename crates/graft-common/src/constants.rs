//! Workspace-wide constants and default names.

/// Name of the root build in component identifiers.
pub const ROOT_BUILD_NAME: &str = ":";

/// Path of the root project of a build.
pub const ROOT_PROJECT_PATH: &str = ":";

/// Configuration selected when a component offers no attribute-bearing variants.
pub const DEFAULT_CONFIGURATION: &str = "default";

/// Status assigned to local project components.
pub const DEFAULT_STATUS: &str = "integration";

/// Status assigned to external modules that declare none.
pub const RELEASE_STATUS: &str = "release";

/// Default build description file name.
pub const DEFAULT_DESCRIPTION_FILE: &str = "graft.yaml";

/// Application name used in CLI output.
pub const APP_NAME: &str = "graft";
