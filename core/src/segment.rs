//! Segmentation of the raw token list into commands, flags and values.
//!
//! Two passes run once per [`FlagSet`](crate::FlagSet):
//!
//! 1. [`segment_commands`] locates each declared command in the token list and
//!    computes the token range it owns.
//! 2. [`segment_args`] classifies every token as a command occurrence, a flag
//!    token, a value consumed by the preceding flag token, or an unnamed token,
//!    and records which command range it falls in.
//!
//! Both passes are pure: they read flags and tokens and return new records.

use std::ops::Range;

use serde::Serialize;
use tracing::trace;

use crate::error::ResolveError;
use crate::flag::Flag;
use crate::types::{ArgKind, FlagKind};

/// A declared command and where it occurs in the token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Position among declared commands (declaration order).
    pub id: usize,
    /// Command literal.
    pub name: String,
    /// Id of the command flag.
    pub flag_id: usize,
    /// Id of the enclosing command, `None` for top-level commands.
    pub parent_id: Option<usize>,
    /// Index of the token that matched the command literal.
    pub position: Option<usize>,
    /// Tokens owned by this occurrence, starting at the command token.
    pub range: Option<Range<usize>>,
}

impl Command {
    pub fn is_present(&self) -> bool {
        self.position.is_some()
    }
}

/// One classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    /// Position in the token list.
    pub index: usize,
    /// The raw token.
    pub raw: String,
    pub kind: ArgKind,
    /// `-`, `--` or empty.
    pub dash: String,
    /// Flag name with dashes, surrounding whitespace and any `=value` removed.
    pub name: String,
    /// Value taken from `=value` or from the following token.
    pub value: String,
    /// The value came from an `=` form.
    pub has_eq: bool,
    /// An `=` form with nothing after it (`--x=`, `--x=""`).
    pub unset: bool,
    /// The token has no dash prefix.
    pub unnamed: bool,
    /// Tokens covered: the token itself, plus a consumed value token or, for a
    /// command token, the whole command range.
    pub range: Range<usize>,
    /// Command range this token falls in.
    pub command_id: Option<usize>,
    /// Flag token whose value this token is.
    pub parent_index: Option<usize>,
    /// Flag this token was matched to during binding.
    pub flag_id: Option<usize>,
    pub error: Option<ResolveError>,
}

impl Arg {
    fn new(index: usize, raw: &str) -> Self {
        Self {
            index,
            raw: raw.to_string(),
            kind: ArgKind::Arg,
            dash: String::new(),
            name: String::new(),
            value: String::new(),
            has_eq: false,
            unset: false,
            unnamed: false,
            range: index..index + 1,
            command_id: None,
            parent_index: None,
            flag_id: None,
            error: None,
        }
    }

    /// Whether this token can be matched to a flag by name. Bare tokens
    /// match on their text (`app verbose` sets `--verbose`).
    pub fn is_bindable(&self) -> bool {
        self.kind == ArgKind::Arg && !self.name.is_empty()
    }

    /// Rebuilds the token as `dash+name[=value]`, or the literal text for
    /// command and unnamed tokens.
    pub fn render(&self) -> String {
        match self.kind {
            ArgKind::Arg if !self.unnamed => {
                let mut out = format!("{}{}", self.dash, self.name);
                if !self.value.is_empty() {
                    out.push('=');
                    out.push_str(&self.value);
                }
                out
            }
            _ => self.name.clone(),
        }
    }
}

/// Locates every declared command in `tokens`.
///
/// A token matches a command when it equals the command literal. Top-level
/// commands match anywhere; a nested command only matches after some command
/// has already been located, which keeps a child from matching a token that
/// only spells its ancestor's name. Each token locates at most one command
/// and each command is located at most once.
///
/// Ranges run from the command token to the start of the next located
/// command in declaration order, or to the end of the input.
pub fn segment_commands(flags: &[Flag], tokens: &[String]) -> Vec<Command> {
    let mut commands: Vec<Command> = Vec::new();
    for flag in flags.iter().filter(|f| f.kind == FlagKind::Command) {
        let parent_id = flag
            .parent_id
            .and_then(|pid| commands.iter().find(|c| c.flag_id == pid))
            .map(|c| c.id);
        commands.push(Command {
            id: commands.len(),
            name: flag.command.clone(),
            flag_id: flag.id,
            parent_id,
            position: None,
            range: None,
        });
    }

    let mut ends: Vec<Option<usize>> = vec![None; commands.len()];
    for (index, token) in tokens.iter().enumerate() {
        for i in 0..commands.len() {
            if commands[i].position.is_some() || commands[i].name != *token {
                continue;
            }

            let accepted = commands[i].parent_id.is_none()
                || commands
                    .iter()
                    .any(|c| c.position.is_some_and(|p| p < index));
            if !accepted {
                continue;
            }

            trace!(command = %commands[i].name, index, "command located");
            commands[i].position = Some(index);
            if i > 0 && commands[i - 1].position.is_some() {
                ends[i - 1] = Some(index);
            }
            break;
        }
    }

    let located: Vec<Option<usize>> = commands.iter().map(|c| c.position).collect();
    for (i, command) in commands.iter_mut().enumerate() {
        let Some(start) = command.position else {
            continue;
        };
        let end = ends[i].unwrap_or_else(|| {
            located[i + 1..]
                .iter()
                .find_map(|p| *p)
                .unwrap_or(tokens.len())
        });
        command.range = Some(start..end);
    }

    commands
}

/// Removes one matching pair of surrounding double or single quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Classifies every token, given the located commands.
pub fn segment_args(commands: &[Command], tokens: &[String]) -> Vec<Arg> {
    let mut args: Vec<Arg> = tokens
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut arg = Arg::new(index, raw);
            for command in commands {
                if command.position == Some(index) {
                    arg.kind = ArgKind::Command;
                    arg.name = raw.clone();
                    arg.command_id = Some(command.id);
                    if let Some(range) = &command.range {
                        arg.range = range.clone();
                    }
                    break;
                }
                if let Some(range) = &command.range {
                    if range.start < arg.range.start && range.end >= arg.range.end {
                        arg.command_id = Some(command.id);
                        break;
                    }
                }
            }
            arg
        })
        .collect();

    for i in 0..args.len() {
        if args[i].kind != ArgKind::Arg {
            continue;
        }

        let raw = args[i].raw.clone();
        let dash = if raw.starts_with("--") {
            "--"
        } else if raw.starts_with('-') {
            "-"
        } else {
            ""
        };
        let mut name = raw.trim_start_matches('-').trim().to_string();

        if dash.is_empty() {
            args[i].name = name;
            args[i].unnamed = true;
            continue;
        }

        let eq = name.find('=');
        let quote = name.find('"').or_else(|| name.find('\''));
        let mut value = String::new();
        let mut has_eq = false;

        match eq {
            Some(eq) if quote.is_none_or(|q| eq < q) => {
                has_eq = true;
                value = strip_quotes(&name[eq + 1..]).to_string();
                name.truncate(eq);
            }
            _ => {
                let next_takes = args
                    .get(i + 1)
                    .is_some_and(|next| next.kind == ArgKind::Arg && !next.raw.starts_with('-'));
                if next_takes {
                    value = strip_quotes(&args[i + 1].raw).to_string();
                    args[i].range.end = args[i + 1].range.end;
                    let next = &mut args[i + 1];
                    next.kind = ArgKind::ArgVal;
                    next.value = value.clone();
                    next.parent_index = Some(i);
                }
            }
        }

        let arg = &mut args[i];
        arg.dash = dash.to_string();
        arg.name = name;
        arg.unset = has_eq && value.is_empty();
        arg.has_eq = has_eq;
        arg.value = value;
    }

    args
}
