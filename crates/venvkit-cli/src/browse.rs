//! Prompt-driven browser: the environment list, a details pane, and the
//! create / refresh / search actions. Each action blocks until it finishes,
//! then control returns to the main menu.

use std::fmt;

use anyhow::Result;
use atty::Stream;
use inquire::{InquireError, Select, Text};
use serde_json::json;
use venvkit_core::{CommandStatus, ExecutionOutcome, NoticeLevel, NoticeLog, Session};

use crate::style::Style;

const PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuItem {
    Environment(String),
    Create,
    Refresh,
    Search,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Environment(name) => f.write_str(name),
            MenuItem::Create => f.write_str("» Create environment"),
            MenuItem::Refresh => f.write_str("» Refresh"),
            MenuItem::Search => f.write_str("» Search system"),
            MenuItem::Quit => f.write_str("» Quit"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PaneAction {
    LaunchTerminal,
    Back,
}

impl fmt::Display for PaneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneAction::LaunchTerminal => f.write_str("Launch terminal"),
            PaneAction::Back => f.write_str("Back"),
        }
    }
}

pub fn run(session: &mut Session<'_>, notices: &NoticeLog, style: &Style) -> Result<ExecutionOutcome> {
    if !(atty::is(Stream::Stdin) && atty::is(Stream::Stdout)) {
        return Ok(ExecutionOutcome::user_error(
            "the interactive browser needs a terminal",
            json!({
                "reason": "not_interactive",
                "hint": "run `venvkit list` for a plain listing",
            }),
        ));
    }

    loop {
        flush_notices(notices, style);
        let items = menu_items(session);
        let title = format!("Virtual environments ({})", session.registry().len());
        let choice = match Select::new(&title, items)
            .with_page_size(PAGE_SIZE)
            .with_help_message("↑↓ to move, enter to select, esc to quit")
            .prompt()
        {
            Ok(choice) => choice,
            Err(err) if is_cancel(&err) => break,
            Err(err) => return Err(err.into()),
        };
        match choice {
            MenuItem::Environment(name) => details_pane(session, &name, style)?,
            MenuItem::Create => create_dialog(session, style)?,
            MenuItem::Refresh => {}
            MenuItem::Search => search_dialog(session, style),
            MenuItem::Quit => break,
        }
    }
    flush_notices(notices, style);

    Ok(ExecutionOutcome::success(
        "",
        json!({ "environments": session.registry().len() }),
    ))
}

fn menu_items(session: &Session<'_>) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = session
        .registry()
        .names()
        .map(|name| MenuItem::Environment(name.to_string()))
        .collect();
    items.extend([
        MenuItem::Create,
        MenuItem::Refresh,
        MenuItem::Search,
        MenuItem::Quit,
    ]);
    items
}

fn details_pane(session: &Session<'_>, name: &str, style: &Style) -> Result<()> {
    let Some(details) = session.details(name) else {
        dialog(
            style,
            NoticeLevel::Warning,
            "Warning",
            &format!("environment '{name}' is not registered"),
        );
        return Ok(());
    };
    println!("{}", style.heading(&details.name));
    println!("  Path: {}", details.path.display());
    println!("  Installed packages:");
    for line in &details.packages {
        println!("    {}", style.muted(line));
    }

    match Select::new("Action", vec![PaneAction::LaunchTerminal, PaneAction::Back]).prompt() {
        Ok(PaneAction::LaunchTerminal) => match session.open_terminal(&details.path) {
            Ok(program) => println!(
                "{}",
                style.status(
                    CommandStatus::Ok,
                    &format!("opened {program} in {}", details.path.display())
                )
            ),
            Err(err) => dialog(style, NoticeLevel::Error, "Error", &err.to_string()),
        },
        Ok(PaneAction::Back) => {}
        Err(err) if is_cancel(&err) => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn create_dialog(session: &mut Session<'_>, style: &Style) -> Result<()> {
    let help = format!(
        "created under {}",
        session.config().create_dir().display()
    );
    let name = match Text::new("Environment name:")
        .with_help_message(&help)
        .prompt()
    {
        Ok(name) => name,
        Err(err) if is_cancel(&err) => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    match session.create(&name, true) {
        Ok(created) => println!(
            "{}",
            style.status(
                CommandStatus::Ok,
                &format!("created {} at {}", created.name, created.path.display())
            )
        ),
        Err(err) if err.is_user_error() => {
            dialog(style, NoticeLevel::Warning, "Warning", &err.to_string());
        }
        Err(err) => dialog(style, NoticeLevel::Error, "Error", &err.to_string()),
    }
    Ok(())
}

fn search_dialog(session: &mut Session<'_>, style: &Style) {
    match session.search_system() {
        Ok(found) if found.is_empty() => dialog(
            style,
            NoticeLevel::Info,
            "Search",
            "No virtual environments found.",
        ),
        Ok(found) => println!(
            "{}",
            style.status(
                CommandStatus::Ok,
                &format!("found {} environment(s)", found.len())
            )
        ),
        Err(err) => dialog(style, NoticeLevel::Error, "Error", &err.to_string()),
    }
}

fn flush_notices(notices: &NoticeLog, style: &Style) {
    for notice in notices.drain() {
        dialog(style, notice.level, &notice.title, &notice.message);
    }
}

fn dialog(style: &Style, level: NoticeLevel, title: &str, message: &str) {
    eprintln!("{}", style.notice(level, title, message));
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}
