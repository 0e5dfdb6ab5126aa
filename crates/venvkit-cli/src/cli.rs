use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::engine::ArgValueCompleter;

use crate::completion::env_name_completer;

pub const VENVKIT_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n{after-help}\n";

pub const VENVKIT_BEFORE_HELP: &str = concat!(
    "venvkit ",
    env!("CARGO_PKG_VERSION"),
    " – find, create, and open Python virtual environments\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  browse           Interactive list of environments (default with no command).\n",
    "  list             Print every registered environment and its path.\n",
    "  show             Show one environment's path and installed packages.\n",
    "  create           Create an environment with `python -m venv` and open a terminal.\n",
    "  search           Find environments anywhere on disk via `locate`.\n",
    "  terminal         Open a terminal inside a registered environment.\n",
    "  completions      Print the shell completion hook.\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = VENVKIT_BEFORE_HELP,
    help_template = VENVKIT_HELP_TEMPLATE,
    after_help = "Examples:\n  venvkit list\n  venvkit create analytics\n  venvkit --json search\n"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct VenvkitCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (notices still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches debug, -vvv trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        value_name = "PATH",
        value_parser = value_parser!(PathBuf),
        help = "Registry log file (defaults to ./venv_log.json or VENVKIT_LOG)",
        global = true
    )]
    pub log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<CommandGroupCli>,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Browse environments interactively (the default).",
        after_help = "Example:\n  venvkit browse\n"
    )]
    Browse,
    #[command(
        about = "List registered environments; stale entries are marked missing.",
        after_help = "Examples:\n  venvkit list\n  venvkit --json list\n"
    )]
    List,
    #[command(
        about = "Show an environment's path and installed packages.",
        override_usage = "venvkit show <NAME>",
        after_help = "Example:\n  venvkit show analytics\n"
    )]
    Show(NameArgs),
    #[command(
        about = "Create an environment under the creation directory.",
        override_usage = "venvkit create <NAME> [--no-terminal]",
        after_help = "Examples:\n  venvkit create analytics\n  VENVKIT_PYTHON=python3.12 venvkit create api --no-terminal\n"
    )]
    Create(CreateArgs),
    #[command(
        about = "Search the whole filesystem index for environments.",
        after_help = "Example:\n  sudo updatedb && venvkit search\n"
    )]
    Search,
    #[command(
        about = "Open a terminal inside a registered environment.",
        override_usage = "venvkit terminal <NAME>",
        after_help = "Examples:\n  venvkit terminal analytics\n  VENVKIT_TERMINAL='kitty --' venvkit terminal analytics\n"
    )]
    Terminal(NameArgs),
    #[command(
        about = "Print the shell hook that enables completions.",
        after_help = "Example:\n  venvkit completions bash >> ~/.bashrc\n"
    )]
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct NameArgs {
    #[arg(
        value_name = "NAME",
        help = "Registered environment name",
        add = ArgValueCompleter::new(env_name_completer)
    )]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(value_name = "NAME", help = "Directory name for the new environment")]
    pub name: String,
    #[arg(long, help = "Do not open a terminal after creating")]
    pub no_terminal: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl CompletionShell {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionShell::Bash => "bash",
            CompletionShell::Zsh => "zsh",
            CompletionShell::Fish => "fish",
        }
    }
}
