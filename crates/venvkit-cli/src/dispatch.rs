use color_eyre::Result;
use serde_json::json;
use venvkit_core::{
    env_create, env_list, env_search, env_show, env_terminal, CommandGroup, CommandInfo, Config,
    CreateRequest, ExecutionOutcome, GlobalOptions, NameRequest, NoticeLog, Session,
    SystemEffects,
};

use crate::browse;
use crate::cli::{CommandGroupCli, CompletionsArgs};
use crate::output::OutputOptions;

pub fn dispatch_command(
    global: &GlobalOptions,
    opts: &OutputOptions,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    let info = command_info(group);
    if let CommandGroupCli::Completions(args) = group {
        return Ok((info, completions_outcome(args)));
    }

    let config = match Config::from_env(global) {
        Ok(config) => config,
        Err(err) => return Ok((info, internal_error_outcome(&err))),
    };
    let effects = SystemEffects::new();
    let notices = NoticeLog::new();
    let mut session = Session::open(config, &effects, &notices);

    let (info, mut outcome) = match group {
        CommandGroupCli::Browse => {
            let style = opts.style();
            core_call(info, || browse::run(&mut session, &notices, &style))?
        }
        CommandGroupCli::List => core_call(info, || env_list(&session))?,
        CommandGroupCli::Show(args) => {
            let request = NameRequest {
                name: args.name.clone(),
            };
            core_call(info, || env_show(&session, &request))?
        }
        CommandGroupCli::Create(args) => {
            let request = CreateRequest {
                name: args.name.clone(),
                no_terminal: args.no_terminal,
            };
            core_call(info, || env_create(&mut session, &request))?
        }
        CommandGroupCli::Search => core_call(info, || env_search(&mut session))?,
        CommandGroupCli::Terminal(args) => {
            let request = NameRequest {
                name: args.name.clone(),
            };
            core_call(info, || env_terminal(&session, &request))?
        }
        CommandGroupCli::Completions(args) => (info, completions_outcome(args)),
    };

    let raised = notices.drain();
    if !raised.is_empty() {
        outcome.insert_detail("notices", serde_json::to_value(&raised)?);
    }
    Ok((info, outcome))
}

fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Browse => CommandInfo::new(CommandGroup::Browse, "browse"),
        CommandGroupCli::List => CommandInfo::new(CommandGroup::List, "list"),
        CommandGroupCli::Show(_) => CommandInfo::new(CommandGroup::Show, "show"),
        CommandGroupCli::Create(_) => CommandInfo::new(CommandGroup::Create, "create"),
        CommandGroupCli::Search => CommandInfo::new(CommandGroup::Search, "search"),
        CommandGroupCli::Terminal(_) => CommandInfo::new(CommandGroup::Terminal, "terminal"),
        CommandGroupCli::Completions(_) => {
            CommandInfo::new(CommandGroup::Completions, "completions")
        }
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(outcome) => Ok((info, outcome)),
        Err(err) => {
            tracing::debug!(command = %info.group, error = %format!("{err:#}"), "command failed");
            Ok((info, internal_error_outcome(&err)))
        }
    }
}

fn internal_error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "internal_error",
            "error": err.to_string(),
            "issues": issues,
            "hint": "Re-run with `-vv` for more detail, or open an issue if this persists.",
        }),
    )
}

fn completions_outcome(args: &CompletionsArgs) -> ExecutionOutcome {
    let shell = args.shell.as_str();
    let snippet = match shell {
        "fish" => "source (COMPLETE=fish venvkit | psub)".to_string(),
        other => format!("source <(COMPLETE={other} venvkit)"),
    };
    ExecutionOutcome::success(
        snippet.clone(),
        json!({
            "passthrough": true,
            "snippet": snippet,
            "shell": shell,
        }),
    )
}
