use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::debug;

use crate::models::SessionState;
use crate::render::{render_intro, render_posts, render_view, TITLE};
use crate::session::{Action, Controller, Reply};

pub const DEFAULT_PROFILE_URL: &str = "https://www.facebook.com/hunkims";

const COMMANDS: &[&str] = &[
    "fetch", "subject", "subject set", "post", "post edit", "download", "show", "help", "quit",
];

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    EditPost,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match (verb, rest) {
        ("fetch", "") => Ok(Command::Act(Action::Fetch {
            url: DEFAULT_PROFILE_URL.to_string(),
        })),
        ("fetch", url) => Ok(Command::Act(Action::Fetch { url: url.to_string() })),
        ("subject", "") => Ok(Command::Act(Action::GenerateSubject)),
        ("subject", rest) => match rest.split_once(char::is_whitespace) {
            Some(("set", text)) => Ok(Command::Act(Action::EditSubject(text.trim().to_string()))),
            None if rest == "set" => Ok(Command::Act(Action::EditSubject(String::new()))),
            _ => Err(format!("Unknown subject command: {}", rest)),
        },
        ("post", "") => Ok(Command::Act(Action::GeneratePost)),
        ("post", "edit") => Ok(Command::EditPost),
        ("download", "") => Ok(Command::Act(Action::Download)),
        ("show", "") => Ok(Command::Act(Action::Show)),
        ("help", _) => Ok(Command::Help),
        ("quit" | "exit", _) => Ok(Command::Quit),
        _ => Err(format!("Unknown command: {}", line)),
    }
}

/// Completion and hints for the session commands.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match line.split_whitespace().next() {
            Some(verb) if COMMANDS.contains(&verb) => Owned(line.bright_cyan().to_string()),
            _ => Borrowed(line),
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

fn status_line(action: &Action) -> Option<String> {
    match action {
        Action::Fetch { url } => Some(format!("Getting Facebook Posts from {}", url)),
        Action::GenerateSubject => Some("Generating Post Subject ...".to_string()),
        Action::GeneratePost => Some("Generating New Post ...".to_string()),
        _ => None,
    }
}

fn print_reply(reply: Reply, state: &SessionState, output_dir: &Path) -> Result<()> {
    match reply {
        Reply::Fetched(n) => {
            println!("{}", format!("Previous Facebook Posts ({})", n).bright_magenta());
            print!("{}", render_posts(&state.posts));
        }
        Reply::Subject(subject) => {
            println!("{}", "Proposed Subject:".bright_magenta());
            println!("{}", subject.bright_blue());
        }
        Reply::Post(post) => {
            println!("{}", "New Post:".bright_magenta());
            for line in post.lines() {
                println!("{}", line.bright_blue());
            }
        }
        Reply::Edited => println!("{}", "Updated.".bright_black()),
        Reply::Download(export) => {
            let path = export.write_to(output_dir)?;
            println!(
                "{}",
                format!("Saved {} ({}, {} bytes)", path.display(), export.mime, export.data.len()).green()
            );
        }
        Reply::View(_) => print!("{}", render_view(state)),
    }
    Ok(())
}

/// Read lines until a lone "." and join them with newlines.
fn read_multiline<H: Helper, I: rustyline::history::History>(
    rl: &mut Editor<H, I>,
) -> rustyline::Result<String> {
    let mut lines = Vec::new();
    loop {
        let line = rl.readline(".. ")?;
        if line.trim_end() == "." {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Interactive session. Actions run one at a time; a failed action is
/// reported and the session carries on with whatever state it left.
pub async fn run_session(ctl: &Controller<'_>, output_dir: &Path) -> Result<()> {
    let mut state = SessionState::default();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", TITLE.bright_magenta().bold());
    println!("{}", render_intro().bright_black());

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        let action = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                println!("{}", render_intro().bright_black());
                continue;
            }
            Ok(Command::EditPost) => {
                println!("{}", "Enter the new post, end with a single '.' line:".bright_black());
                match read_multiline(&mut rl) {
                    Ok(text) => Action::EditPost(text),
                    Err(ReadlineError::Interrupted) => continue,
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(Command::Act(action)) => action,
            Err(msg) => {
                println!("{}", msg.bright_black());
                continue;
            }
        };

        if let Some(status) = status_line(&action) {
            println!("{}", status.yellow());
        }
        match ctl.dispatch(&mut state, action).await {
            Ok(reply) => {
                if let Err(e) = print_reply(reply, &state, output_dir) {
                    eprintln!("{}", format!("Error: {:#}", e).red());
                }
            }
            Err(e) => {
                debug!("Action failed - {:?}", e);
                eprintln!("{}", format!("Error: {:#}", e).red());
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
