use std::path::Path;

use crate::discovery::Platform;
use crate::effects::PackageInspector;

pub const NO_INTERPRETER_LINE: &str = "Python executable not found.";
pub const NO_PACKAGES_LINE: &str = "No packages found.";

/// Lines describing the packages installed in `env`, one `name==version`
/// entry per line as printed by `pip freeze`.
///
/// Never fails: a missing interpreter, an empty environment, or a failed
/// invocation each come back as a single informational line.
#[must_use]
pub fn list_packages(
    inspector: &dyn PackageInspector,
    platform: Platform,
    env: &Path,
) -> Vec<String> {
    let python = platform.interpreter(env);
    if !python.is_file() {
        return vec![NO_INTERPRETER_LINE.to_string()];
    }
    let output = match inspector.freeze(&python, env) {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(env = %env.display(), error = %format!("{err:#}"), "pip freeze failed to start");
            return vec![format!("Error retrieving packages: {err:#}")];
        }
    };
    if !output.success() {
        return vec![format!(
            "Error retrieving packages: {}",
            output.failure_summary()
        )];
    }
    let lines: Vec<String> = output
        .stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if lines.is_empty() {
        vec![NO_PACKAGES_LINE.to_string()]
    } else {
        lines
    }
}
