use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;
use color_eyre::Result;
use venvkit_core::GlobalOptions;

mod browse;
mod cli;
mod completion;
mod dispatch;
mod output;
mod style;

use cli::{CommandGroupCli, VenvkitCli};
use output::OutputOptions;

fn main() -> Result<()> {
    color_eyre::install()?;
    CompleteEnv::with_factory(VenvkitCli::command).complete();

    let cli = VenvkitCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        no_color: cli.no_color,
        log_file: cli.log.clone(),
    };
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };

    let command = cli.command.unwrap_or(CommandGroupCli::Browse);
    let (info, outcome) = dispatch::dispatch_command(&global, &opts, &command)?;
    let code = output::emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("venvkit_core={level},venvkit={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
