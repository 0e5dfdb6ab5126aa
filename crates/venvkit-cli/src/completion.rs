use std::ffi::OsStr;

use clap::builder::StyledStr;
use clap_complete::engine::CompletionCandidate;
use venvkit_core::{Config, GlobalOptions, NoticeLog, Session, SystemEffects};

/// Completes registered environment names from startup discovery. Log
/// problems are swallowed; completion must never print.
pub fn env_name_completer(current: &OsStr) -> Vec<CompletionCandidate> {
    let Ok(config) = Config::from_env(&GlobalOptions::default()) else {
        return Vec::new();
    };
    let effects = SystemEffects::new();
    let notices = NoticeLog::new();
    let session = Session::open(config, &effects, &notices);
    let prefix = current.to_string_lossy();

    session
        .registry()
        .iter()
        .filter(|(name, _)| name.starts_with(&*prefix))
        .enumerate()
        .map(|(idx, (name, path))| {
            CompletionCandidate::new(name.clone())
                .display_order(Some(idx))
                .tag(Some(StyledStr::from("env")))
                .help(Some(path.display().to_string().into()))
        })
        .collect()
}
