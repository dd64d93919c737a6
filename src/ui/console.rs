//! Line-oriented surface: one command per input line, the visible rows
//! printed after every change.

use crate::error::Result;
use crate::executor::Spawn;
use crate::model::{Candidate, Tier};
use crate::state::{GridState, MenuState};
use crate::store::case::CaseMode;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the search phrase.
    Search(String),
    /// Activate a visible row (0-based).
    Launch(usize),
    /// Toggle the pin of a visible row (0-based).
    Pin(usize),
    ToggleCase,
    Up,
    Down,
    Enter,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Redraw,
    /// A row was chosen; carries its command.
    Activated(String),
    Ignored,
    Quit,
}

fn row_number(arg: &str) -> Option<usize> {
    arg.trim().parse::<usize>().ok().filter(|&n| n > 0).map(|n| n - 1)
}

pub fn parse(line: &str) -> Command {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Search(line.to_string());
    };
    let (word, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    if let Some(row) = row_number(word) {
        return Command::Launch(row);
    }
    match (word, row_number(arg)) {
        ("launch" | "l", Some(row)) => Command::Launch(row),
        ("pin" | "p", Some(row)) => Command::Pin(row),
        ("case", _) => Command::ToggleCase,
        ("up", _) => Command::Up,
        ("down", _) => Command::Down,
        ("enter", _) => Command::Enter,
        ("quit" | "q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Applies `command` to the grid. Activation launches through `spawner`
/// before reporting the exec.
pub fn apply_grid(state: &mut GridState, command: Command, spawner: &dyn Spawn) -> Result<Outcome> {
    let outcome = match command {
        Command::Search(phrase) => {
            state.update_query(&phrase);
            Outcome::Redraw
        }
        Command::Launch(row) => match state.activate(row, spawner)? {
            Some(exec) => Outcome::Activated(exec),
            None => Outcome::Ignored,
        },
        Command::Enter => {
            let row = state.selected_index;
            match state.activate(row, spawner)? {
                Some(exec) => Outcome::Activated(exec),
                None => Outcome::Ignored,
            }
        }
        Command::Pin(row) => match state.toggle_pin(row) {
            Some(_) => Outcome::Redraw,
            None => Outcome::Ignored,
        },
        Command::Up => {
            state.move_selection(-1);
            Outcome::Redraw
        }
        Command::Down => {
            state.move_selection(1);
            Outcome::Redraw
        }
        Command::Quit => Outcome::Quit,
        Command::ToggleCase | Command::Unknown(_) => Outcome::Ignored,
    };
    Ok(outcome)
}

/// Applies `command` to a list surface. Activation only reports the command;
/// printing or spawning it is up to the caller.
pub fn apply_menu<T: Candidate>(state: &mut MenuState<T>, command: Command) -> Outcome {
    match command {
        Command::Search(phrase) => {
            state.update_query(&phrase);
            Outcome::Redraw
        }
        Command::Launch(row) => match state.row(row) {
            Some(item) => Outcome::Activated(item.command().to_string()),
            None => Outcome::Ignored,
        },
        Command::Enter => match state.get_selected() {
            Some(item) => Outcome::Activated(item.command().to_string()),
            None => Outcome::Ignored,
        },
        Command::ToggleCase => {
            state.toggle_case();
            Outcome::Redraw
        }
        Command::Up => {
            state.move_selection(-1);
            Outcome::Redraw
        }
        Command::Down => {
            state.move_selection(1);
            Outcome::Redraw
        }
        Command::Quit => Outcome::Quit,
        Command::Pin(_) | Command::Unknown(_) => Outcome::Ignored,
    }
}

fn push_row(out: &mut String, row: usize, selected: bool, mark: char, label: &str, detail: &str) {
    let cursor = if selected { '>' } else { ' ' };
    let _ = write!(out, "{cursor}{:>3} {mark} {label}", row + 1);
    if !detail.is_empty() {
        let _ = write!(out, "  {detail}");
    }
    out.push('\n');
}

pub fn render_grid(state: &GridState) -> String {
    let mut out = format!("search: {}\n", state.query);
    let mut last_tier: Option<Tier> = None;
    for (row, entry) in state.visible_entries().enumerate() {
        if last_tier.is_some_and(|t| t != entry.tier) && state.query.is_empty() {
            out.push_str("  ---\n");
        }
        last_tier = Some(entry.tier);
        push_row(&mut out, row, row == state.selected_index, entry.tier.mark(), &entry.record.name, &entry.record.comment);
    }
    out
}

pub fn render_menu<T: Candidate>(state: &MenuState<T>) -> String {
    let placeholder = match state.case.mode {
        CaseMode::Insensitive => "TYPE TO SEARCH",
        CaseMode::Sensitive => "Type to Search",
    };
    let mut out = if state.query.is_empty() {
        format!("search: ({placeholder})\n")
    } else {
        format!("search: {}\n", state.query)
    };
    for (row, item) in state.visible_items().enumerate() {
        push_row(&mut out, row, row == state.selected_index, ' ', item.search_key(), item.search_detail());
    }
    out
}
