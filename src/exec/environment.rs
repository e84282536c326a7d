// src/exec/environment.rs

use crate::config::{Settings, env_var_name};

/// Set to `1` in the child so it can tell it runs under devloop.
pub const DEV_MODE_VAR: &str = "DEV_RUNNER";

/// Working directory devloop was started from.
pub const WORKING_DIR_VAR: &str = "RUNNER_WD";

/// Extra environment for the child process: the dev-mode marker, the
/// working directory, and every setting as `RUNNER_<KEY>`.
///
/// Applied to the child's `Command` only; our own environment is untouched.
pub fn child_environment(settings: &Settings) -> Vec<(String, String)> {
    let mut env = vec![(DEV_MODE_VAR.to_string(), "1".to_string())];

    if let Ok(wd) = std::env::current_dir() {
        env.push((WORKING_DIR_VAR.to_string(), wd.to_string_lossy().into_owned()));
    }

    env.extend(
        settings
            .iter()
            .map(|(key, value)| (env_var_name(key), value.to_string())),
    );

    env
}
