//! Discovery, registry, and launch plumbing for local Python virtual environments.
//!
//! The crate holds no terminal I/O of its own: every user-facing action runs
//! through a [`Session`] and comes back as an [`ExecutionOutcome`] plus any
//! [`Notice`]s raised along the way. Front ends decide how to render both.

mod command;
mod commands;
mod config;
mod create;
mod discovery;
mod effects;
mod notice;
mod outcome;
mod packages;
mod process;
mod registry;
mod session;
mod terminal;

pub use crate::command::{format_status_message, to_json_response, CommandGroup, CommandInfo};
pub use crate::commands::{
    env_create, env_list, env_search, env_show, env_terminal, CreateRequest, NameRequest,
};
pub use crate::config::{Config, EnvSnapshot, GlobalOptions, DEFAULT_LOG_FILENAME};
pub use crate::create::{validate_env_name, CreateError, Created};
pub use crate::discovery::scan::scan_env_directory;
pub use crate::discovery::search::{search_system, SearchError, MARKER_CONFIG_FILE};
pub use crate::discovery::{is_valid_env, Discovered, Platform};
pub use crate::effects::{
    Effects, EnvBuilder, FileIndexer, IndexerHits, PackageInspector, SystemEffects,
    TerminalSpawner,
};
pub use crate::notice::{Notice, NoticeLevel, NoticeLog, Notifier};
pub use crate::outcome::{CommandStatus, ExecutionOutcome};
pub use crate::packages::{list_packages, NO_INTERPRETER_LINE, NO_PACKAGES_LINE};
pub use crate::process::{run_command, spawn_detached, RunOutput};
pub use crate::registry::log::RegistryLog;
pub use crate::registry::{MergeReport, Registry};
pub use crate::session::{EnvDetails, Session};
pub use crate::terminal::{
    activation_hint, launch_terminal, shell_quote, LaunchError, TerminalChain, TerminalSpec,
};
