//! Command handlers: each runs one action against the session and reports
//! it as an [`ExecutionOutcome`].

use anyhow::Result;
use serde_json::{json, Value};

use crate::create::CreateError;
use crate::discovery::search::SearchError;
use crate::outcome::ExecutionOutcome;
use crate::session::Session;
use crate::terminal::LaunchError;

const LIST_HINT: &str = "run `venvkit list` to see registered environments";

#[derive(Clone, Debug)]
pub struct CreateRequest {
    pub name: String,
    pub no_terminal: bool,
}

#[derive(Clone, Debug)]
pub struct NameRequest {
    pub name: String,
}

/// Lists every registered environment. Stale entries are shown with
/// `valid: false` rather than pruned.
///
/// # Errors
/// Does not fail; the `Result` keeps the handler signatures uniform.
pub fn env_list(session: &Session<'_>) -> Result<ExecutionOutcome> {
    let rows: Vec<Value> = session
        .registry()
        .iter()
        .map(|(name, path)| {
            json!({
                "name": name,
                "path": path,
                "valid": session.is_valid(path),
            })
        })
        .collect();
    if rows.is_empty() {
        return Ok(ExecutionOutcome::success(
            "no environments found",
            json!({ "environments": rows }),
        ));
    }
    let summary = session
        .registry()
        .iter()
        .map(|(name, path)| {
            if session.is_valid(path) {
                format!("{name}  {}", path.display())
            } else {
                format!("{name}  {}  (missing)", path.display())
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExecutionOutcome::success(
        format!("{} environment(s):\n{summary}", rows.len()),
        json!({ "environments": rows }),
    ))
}

/// # Errors
/// Does not fail; an unknown name is a user-error outcome.
pub fn env_show(session: &Session<'_>, request: &NameRequest) -> Result<ExecutionOutcome> {
    let Some(details) = session.details(&request.name) else {
        return Ok(unknown_environment(&request.name));
    };
    let mut message = format!("{}\n  path: {}", details.name, details.path.display());
    message.push_str("\n  packages:");
    for line in &details.packages {
        message.push_str("\n    ");
        message.push_str(line);
    }
    Ok(ExecutionOutcome::success(message, serde_json::to_value(&details)?))
}

/// # Errors
/// Returns an error only if the outcome details cannot be serialized.
pub fn env_create(session: &mut Session<'_>, request: &CreateRequest) -> Result<ExecutionOutcome> {
    match session.create(&request.name, !request.no_terminal) {
        Ok(created) => {
            let message = match &created.terminal {
                Some(terminal) => format!(
                    "created {} at {} (opened {terminal})",
                    created.name,
                    created.path.display()
                ),
                None => format!("created {} at {}", created.name, created.path.display()),
            };
            Ok(ExecutionOutcome::success(
                message,
                serde_json::to_value(&created)?,
            ))
        }
        Err(err) => Ok(create_error_outcome(&request.name, &err)),
    }
}

/// # Errors
/// Does not fail; indexer problems are reported as outcomes.
pub fn env_search(session: &mut Session<'_>) -> Result<ExecutionOutcome> {
    match session.search_system() {
        Ok(found) => {
            let rows: Vec<Value> = found
                .iter()
                .map(|(name, path)| json!({ "name": name, "path": path }))
                .collect();
            let total = session.registry().len();
            let message = if found.is_empty() {
                "no environments found by system search".to_string()
            } else {
                format!(
                    "found {} environment(s); {total} registered",
                    found.len()
                )
            };
            Ok(ExecutionOutcome::success(
                message,
                json!({ "found": rows, "total": total }),
            ))
        }
        Err(err) => Ok(search_error_outcome(&err)),
    }
}

/// # Errors
/// Does not fail; launch problems are reported as outcomes.
pub fn env_terminal(session: &Session<'_>, request: &NameRequest) -> Result<ExecutionOutcome> {
    let Some(path) = session.registry().get(&request.name) else {
        return Ok(unknown_environment(&request.name));
    };
    match session.open_terminal(path) {
        Ok(terminal) => Ok(ExecutionOutcome::success(
            format!("opened {terminal} in {}", path.display()),
            json!({ "name": request.name, "path": path, "terminal": terminal }),
        )),
        Err(err) => Ok(launch_error_outcome(&request.name, path, &err)),
    }
}

fn unknown_environment(name: &str) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("environment '{name}' is not registered"),
        json!({
            "name": name,
            "reason": "unknown_environment",
            "hint": LIST_HINT,
        }),
    )
}

fn create_error_outcome(name: &str, err: &CreateError) -> ExecutionOutcome {
    let reason = match err {
        CreateError::EmptyName => "empty_name",
        CreateError::InvalidName(_) => "invalid_name",
        CreateError::AlreadyExists(_) => "already_exists",
        CreateError::BuildFailed(_) => "build_failed",
    };
    let details = json!({ "name": name.trim(), "reason": reason });
    if err.is_user_error() {
        ExecutionOutcome::user_error(err.to_string(), details)
    } else {
        ExecutionOutcome::failure(err.to_string(), details)
    }
}

fn search_error_outcome(err: &SearchError) -> ExecutionOutcome {
    match err {
        SearchError::IndexerMissing { tool } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "indexer_missing",
                "tool": tool,
                "hint": "install mlocate or plocate, then run `updatedb`",
            }),
        ),
        SearchError::IndexerFailed { tool, .. } => ExecutionOutcome::failure(
            err.to_string(),
            json!({
                "reason": "indexer_failed",
                "tool": tool,
                "hint": "make sure the locate database exists (`sudo updatedb`)",
            }),
        ),
    }
}

fn launch_error_outcome(
    name: &str,
    path: &std::path::Path,
    err: &LaunchError,
) -> ExecutionOutcome {
    let details = json!({
        "name": name,
        "path": path,
        "reason": match err {
            LaunchError::MissingDirectory(_) => "missing_directory",
            LaunchError::NoTerminal => "no_terminal",
            LaunchError::SpawnFailed(_) => "spawn_failed",
        },
    });
    if err.is_user_error() {
        ExecutionOutcome::user_error(err.to_string(), details)
    } else {
        ExecutionOutcome::failure(err.to_string(), details)
    }
}
