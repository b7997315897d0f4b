//! TOML-based configuration for the gitdeploy CLI.
//!
//! The remote URL may be given literally or via `url_env`, the name of an
//! environment variable resolved at load time — useful when the URL carries
//! an access token that should not live in the config file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deploy::DeployOptions;
use crate::errors::ConfigError;

/// Top-level config file: a single `[deploy]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub deploy: DeployOptions,
}

impl DeployConfig {
    /// Load and parse a config file, resolving environment indirections.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.resolve_env_vars()?;
        debug!(path = %path.display(), "loaded deploy configuration");
        Ok(config)
    }

    /// Resolve `url_env` into `url` when no literal URL is configured.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if self.deploy.url.trim().is_empty() {
            if let Some(var) = self.deploy.url_env.clone() {
                self.deploy.url =
                    std::env::var(&var).map_err(|_| ConfigError::EnvVarMissing {
                        var,
                        field: "deploy.url_env".into(),
                    })?;
            }
        }
        Ok(())
    }

    /// Structural validation for `gitdeploy validate`: the source directory
    /// is not required to exist yet (it is typically a build product), but a
    /// remote URL must be derivable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deploy.url.trim().is_empty() && self.deploy.url_env.is_none() {
            return Err(ConfigError::UrlMissing);
        }
        Ok(())
    }

    /// The annotated default config written by `gitdeploy init`.
    pub fn default_template() -> &'static str {
        r#"# gitdeploy configuration

[deploy]
# Directory holding the build output to publish.
src = "dist"

# Scratch working tree; deleted and recreated on every run.
tmp = "tmp/deployDir"

# Remote git repository URL, or the name of an environment variable
# holding it (e.g. one embedding an access token).
url = "https://github.com/owner/repo.git"
# url_env = "DEPLOY_GIT_URL"

branch = "master"
message = "autocommit"

# Annotated tag created after the commit (omit for no tag).
# tag = "v1.0.0"
# tag_message = "autocommit"

# Patterns excluded from the source copy. Nested groups are allowed.
src_ignore_patterns = []

# Patterns protected from deletion in the working tree (CNAME files,
# server config, ...). `.git/**` is always protected.
repo_ignore_patterns = []
"#
    }
}
