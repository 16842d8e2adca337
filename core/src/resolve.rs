//! Binding of tokens to flags and precedence resolution.
//!
//! Resolution runs in three steps over the segmented tokens:
//!
//! 1. [`match_args`] collects, for every flag, the tokens naming it. Top-level
//!    flags only see tokens outside every command range; nested flags only see
//!    tokens inside their parent command's occurrence.
//! 2. [`fold_occurrences`] reduces a flag's matched tokens to a value: the last
//!    occurrence wins for scalars, every occurrence contributes to lists.
//! 3. [`resolve_values`] picks the source (argument, then environment, then
//!    default), writes the value through a [`Destination`] and records errors;
//!    [`check_required`] then reports required flags nothing supplied.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::destination::Destination;
use crate::error::ResolveError;
use crate::flag::Flag;
use crate::segment::{Arg, Command};
use crate::types::{FlagKind, Scalar, Value, ValueSource, ValueType, coerce};

/// Source of environment variables.
pub trait Environment {
    /// Returns the variable's value, or `None` when it is not set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Associates tokens with the flags they name.
///
/// Flags must be in declaration order so a command's tokens are collected
/// before its children look at them.
pub fn match_args(flags: &mut [Flag], args: &mut [Arg], commands: &[Command]) {
    for i in 0..flags.len() {
        match flags[i].kind {
            FlagKind::Command => {
                let Some(command) = commands
                    .iter()
                    .find(|c| c.flag_id == flags[i].id && c.is_present())
                else {
                    continue;
                };
                flags[i].command_id = Some(command.id);
                flags[i].args = args
                    .iter()
                    .filter(|a| a.command_id == Some(command.id))
                    .map(|a| a.index)
                    .collect();
            }
            FlagKind::Arg => {
                let candidates: Vec<usize> = match flags[i].parent_id {
                    Some(parent) => flags[parent].args.clone(),
                    None => args
                        .iter()
                        .filter(|a| a.command_id.is_none())
                        .map(|a| a.index)
                        .collect(),
                };

                let flag = &mut flags[i];
                for index in candidates {
                    let arg = &mut args[index];
                    if !arg.is_bindable() || !flag.matches_name(&arg.name) {
                        continue;
                    }
                    arg.flag_id = Some(flag.id);
                    if flag.parent_id.is_some() {
                        flag.command_id = arg.command_id;
                    }
                    flag.args.push(index);
                }

                if flag.is_matched() {
                    debug!(flag = %flag.name, occurrences = flag.args.len(), "flag matched");
                }
            }
        }
    }
}

/// Result of folding a flag's matched tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occurrences {
    /// Value to write. `None` when any occurrence failed or nothing was produced.
    pub value: Option<Value>,
    /// Per-token errors, keyed by token index.
    pub errors: Vec<(usize, ResolveError)>,
    /// Tokens of boolean flags given without a value, which count as `true`.
    pub implied_true: Vec<usize>,
}

/// Returns the literal an occurrence supplies, or the reason it supplies none.
fn occurrence_literal(value_type: ValueType, arg: &Arg) -> Result<String, ResolveError> {
    if value_type.is_bool() && arg.value.is_empty() && !arg.unset {
        return Ok("true".to_string());
    }

    if arg.value.is_empty() {
        let missing = (value_type.is_bool() && arg.unset)
            || (value_type.is_string() && !arg.unset)
            || (!value_type.is_bool() && !value_type.is_string());
        if missing {
            return Err(ResolveError::MissingValue {
                dash: arg.dash.clone(),
                name: arg.name.clone(),
            });
        }
    }

    Ok(arg.value.clone())
}

/// Reduces matched tokens to a single value.
///
/// Scalars keep the last occurrence. Lists append every occurrence in token
/// order; when a delimiter is declared each occurrence is split on it, pieces
/// are trimmed and empty pieces dropped. A single failing occurrence leaves
/// the whole flag without a value.
pub fn fold_occurrences(flag: &Flag, matched: &[&Arg]) -> Occurrences {
    let mut out = Occurrences::default();
    let Some(scalar_type) = flag.value_type.scalar() else {
        return out;
    };

    let mut last: Option<Scalar> = None;
    let mut items: Vec<Scalar> = Vec::new();

    for arg in matched {
        let literal = match occurrence_literal(flag.value_type, arg) {
            Ok(literal) => literal,
            Err(err) => {
                out.errors.push((arg.index, err));
                continue;
            }
        };
        if arg.value.is_empty() && literal == "true" {
            out.implied_true.push(arg.index);
        }

        let pieces: Vec<&str> = if flag.value_type.is_list() && !flag.delimiter.is_empty() {
            literal
                .split(flag.delimiter.as_str())
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect()
        } else {
            vec![literal.as_str()]
        };

        for piece in pieces {
            match coerce(scalar_type, piece) {
                Ok(Some(value)) if flag.value_type.is_list() => items.push(value),
                Ok(Some(value)) => last = Some(value),
                Ok(None) => {}
                Err(err) => out.errors.push((arg.index, err)),
            }
        }
    }

    if out.errors.is_empty() {
        out.value = if flag.value_type.is_list() {
            (!items.is_empty()).then_some(Value::List(items))
        } else {
            last.map(Value::Scalar)
        };
    }

    out
}

/// Coerces one literal from the environment or a default.
fn coerce_literal(value_type: ValueType, literal: &str) -> Result<Option<Value>, ResolveError> {
    let Some(scalar_type) = value_type.scalar() else {
        return Ok(None);
    };
    let value = coerce(scalar_type, literal)?;
    Ok(value.map(|v| {
        if value_type.is_list() {
            Value::List(vec![v])
        } else {
            Value::Scalar(v)
        }
    }))
}

fn write(dest: &mut dyn Destination, flag: &mut Flag, value: Value) {
    match dest.set(&flag.path, &value) {
        Ok(()) => flag.value = Some(value),
        Err(source) => {
            flag.error = Some(ResolveError::CannotSet {
                name: flag.name.clone(),
                source,
            })
        }
    }
}

/// Resolves every argument flag from its tokens, the environment or its default.
///
/// A flag with at least one matched token is resolved from arguments only,
/// even if those tokens carry errors.
pub fn resolve_values(
    flags: &mut [Flag],
    args: &mut [Arg],
    dest: &mut dyn Destination,
    env: &dyn Environment,
) {
    for flag in flags.iter_mut().filter(|f| f.kind == FlagKind::Arg) {
        if flag.is_matched() {
            flag.source = Some(ValueSource::Arg);
            let folded = {
                let matched: Vec<&Arg> = flag.args.iter().map(|&i| &args[i]).collect();
                fold_occurrences(flag, &matched)
            };

            for index in &folded.implied_true {
                args[*index].value = "true".to_string();
            }

            if folded.errors.is_empty() {
                if let Some(value) = folded.value {
                    write(dest, flag, value);
                }
                continue;
            }

            debug!(flag = %flag.name, errors = folded.errors.len(), "argument errors, clearing value");
            for (index, err) in folded.errors {
                args[index].error = Some(err);
            }
            if let Err(source) = dest.clear(&flag.path) {
                flag.error = Some(ResolveError::CannotSet {
                    name: flag.name.clone(),
                    source,
                });
            }
            continue;
        }

        let (source, literal) = match env_value(flag, env) {
            Some(value) => (ValueSource::Env, value),
            None if !flag.default.is_empty() => (ValueSource::Default, flag.default.clone()),
            None => continue,
        };

        debug!(flag = %flag.name, %source, "value from fallback source");
        flag.source = Some(source);
        match coerce_literal(flag.value_type, &literal) {
            Ok(Some(value)) => write(dest, flag, value),
            Ok(None) => {}
            Err(err) => flag.error = Some(err),
        }
    }
}

fn env_value(flag: &Flag, env: &dyn Environment) -> Option<String> {
    if flag.env.is_empty() {
        return None;
    }
    env.var(&flag.env)
}

/// Reports required flags that no token matched.
///
/// Environment and default values do not satisfy a requirement. A required
/// argument under a command that was not invoked is not reported:
/// requirements only apply inside the selected command.
pub fn check_required(flags: &mut [Flag]) {
    for i in 0..flags.len() {
        let flag = &flags[i];
        if !flag.required || flag.is_matched() {
            continue;
        }

        let error = match flag.kind {
            FlagKind::Command => ResolveError::CommandRequired {
                command: flag.command.clone(),
            },
            FlagKind::Arg => {
                let parent = flag.parent_id.map(|p| &flags[p]);
                if parent.is_some_and(|p| !p.is_matched()) {
                    continue;
                }
                ResolveError::ArgumentRequired {
                    flag: flag.display_name(),
                    command: parent.map(|p| p.command.clone()),
                }
            }
        };

        debug!(flag = %flags[i].name, %error, "required flag missing");
        flags[i].error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldsBuilder;
    use crate::destination::ValueStore;
    use crate::flag::build_flags;
    use crate::segment::{segment_args, segment_commands};

    struct Resolved {
        flags: Vec<Flag>,
        args: Vec<Arg>,
        store: ValueStore,
    }

    fn run(builder: FieldsBuilder, tokens: &[&str], env: &[(&str, &str)]) -> Resolved {
        let fields = builder.build();
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut flags = build_flags(&fields).unwrap();
        let commands = segment_commands(&flags, &tokens);
        let mut args = segment_args(&commands, &tokens);
        let mut store = ValueStore::new();
        match_args(&mut flags, &mut args, &commands);
        resolve_values(&mut flags, &mut args, &mut store, &env);
        check_required(&mut flags);
        Resolved { flags, args, store }
    }

    #[test]
    fn test_scalar_last_occurrence_wins() {
        let r = run(
            FieldsBuilder::new().value("Port", "int", &[("short", "p"), ("long", "port")]),
            &["--port=1", "-p", "2", "--port", "3"],
            &[],
        );
        assert_eq!(r.flags[0].value(), Some(&Value::Scalar(Scalar::Int(3))));
        assert_eq!(r.flags[0].arg_indices(), &[0, 1, 3]);
        assert_eq!(r.store.get_i64(&r.flags[0].path), Some(3));
    }

    #[test]
    fn test_list_accumulates_and_splits() {
        let r = run(
            FieldsBuilder::new().value("Tags", "[]string", &[("long", "tag"), ("delimiter", ",")]),
            &["--tag=a, b", "--tag", "c,,  ,d"],
            &[],
        );
        let expected: Vec<Scalar> = ["a", "b", "c", "d"]
            .iter()
            .map(|s| Scalar::Str(s.to_string()))
            .collect();
        assert_eq!(r.flags[0].value(), Some(&Value::List(expected)));
    }

    #[test]
    fn test_list_without_delimiter_keeps_whole_values() {
        let r = run(
            FieldsBuilder::new().value("Ids", "[]uint64", &[("long", "id")]),
            &["--id=1", "--id=2"],
            &[],
        );
        assert_eq!(
            r.flags[0].value(),
            Some(&Value::List(vec![Scalar::Uint(1), Scalar::Uint(2)]))
        );
    }

    #[test]
    fn test_bool_without_value_is_true() {
        let r = run(
            FieldsBuilder::new().value("Verbose", "bool", &[("short", "v")]),
            &["-v"],
            &[],
        );
        assert_eq!(r.flags[0].value(), Some(&Value::Scalar(Scalar::Bool(true))));
        assert_eq!(r.args[0].value, "true");
    }

    #[test]
    fn test_bool_with_empty_eq_needs_value() {
        let r = run(
            FieldsBuilder::new().value("Verbose", "bool", &[("long", "verbose")]),
            &["--verbose="],
            &[("V", "true")],
        );
        assert_eq!(r.flags[0].value(), None);
        assert_eq!(r.flags[0].source(), Some(ValueSource::Arg));
        assert_eq!(
            r.args[0].error.as_ref().unwrap().to_string(),
            "argument --verbose needs a value"
        );
    }

    #[test]
    fn test_missing_values_per_type() {
        let r = run(
            FieldsBuilder::new()
                .value("Name", "string", &[("long", "name")])
                .value("Count", "int", &[("long", "count")])
                .value("Label", "string", &[("long", "label")]),
            &["--name", "--count", "--label="],
            &[],
        );
        assert!(r.args[0].error.is_some());
        assert!(r.args[1].error.is_some());
        assert!(r.args[2].error.is_none());
        assert_eq!(r.flags[2].value(), Some(&Value::Scalar(Scalar::Str(String::new()))));
    }

    #[test]
    fn test_argument_error_blocks_fallbacks() {
        let r = run(
            FieldsBuilder::new().value(
                "Port",
                "int",
                &[("long", "port"), ("env", "PORT"), ("default", "80")],
            ),
            &["--port=abc"],
            &[("PORT", "8080")],
        );
        assert_eq!(r.flags[0].source(), Some(ValueSource::Arg));
        assert_eq!(r.flags[0].value(), None);
        assert!(r.store.is_empty());
        assert_eq!(
            r.args[0].error.as_ref().unwrap().to_string(),
            "failed to parse 'abc' as int"
        );
    }

    #[test]
    fn test_one_bad_occurrence_rolls_back_flag() {
        let r = run(
            FieldsBuilder::new().value("Port", "int", &[("long", "port")]),
            &["--port=1", "--port=x", "--port=3"],
            &[],
        );
        assert_eq!(r.flags[0].value(), None);
        assert!(r.args[1].error.is_some());
        assert!(r.args[2].error.is_none());
    }

    #[test]
    fn test_env_then_default() {
        let r = run(
            FieldsBuilder::new()
                .value("A", "int", &[("long", "a"), ("env", "A"), ("default", "1")])
                .value("B", "int", &[("long", "b"), ("env", "B"), ("default", "2")])
                .value("C", "[]string", &[("long", "c"), ("env", "C"), ("delimiter", ",")]),
            &[],
            &[("A", "10"), ("C", "x,y")],
        );
        assert_eq!(r.flags[0].value(), Some(&Value::Scalar(Scalar::Int(10))));
        assert_eq!(r.flags[0].source(), Some(ValueSource::Env));
        assert_eq!(r.flags[1].value(), Some(&Value::Scalar(Scalar::Int(2))));
        assert_eq!(r.flags[1].source(), Some(ValueSource::Default));
        assert_eq!(
            r.flags[2].value(),
            Some(&Value::List(vec![Scalar::Str("x,y".into())]))
        );
    }

    #[test]
    fn test_bad_env_value_is_flag_error() {
        let r = run(
            FieldsBuilder::new().value("Debug", "bool", &[("long", "debug"), ("env", "DEBUG")]),
            &[],
            &[("DEBUG", "1")],
        );
        assert_eq!(r.flags[0].source(), Some(ValueSource::Env));
        assert_eq!(
            r.flags[0].error().unwrap().to_string(),
            "failed to parse '1' as bool"
        );
    }

    #[test]
    fn test_sibling_commands_do_not_leak() {
        let r = run(
            FieldsBuilder::new()
                .group("CmdA", &[("command", "cmdA")], |g| g.value("X", "int", &[("long", "x")]))
                .group("CmdB", &[("command", "cmdB")], |g| g.value("X", "int", &[("long", "x")])),
            &["cmdA", "--x=1", "cmdB", "--x=2"],
            &[],
        );
        assert_eq!(r.flags[1].value(), Some(&Value::Scalar(Scalar::Int(1))));
        assert_eq!(r.flags[3].value(), Some(&Value::Scalar(Scalar::Int(2))));
        assert_eq!(r.flags[1].command_id, Some(0));
        assert_eq!(r.flags[3].command_id, Some(1));
    }

    #[test]
    fn test_top_level_flag_ignores_command_tokens() {
        let r = run(
            FieldsBuilder::new()
                .value("Verbose", "bool", &[("short", "v")])
                .group("Run", &[], |g| g.value("Verbose", "bool", &[("short", "v")])),
            &["run", "-v"],
            &[],
        );
        assert!(!r.flags[0].is_matched());
        assert_eq!(r.flags[2].value(), Some(&Value::Scalar(Scalar::Bool(true))));
    }

    #[test]
    fn test_bare_token_matches_by_name() {
        let r = run(
            FieldsBuilder::new()
                .value("Verbose", "bool", &[("long", "verbose")])
                .value("Name", "string", &[("long", "name")]),
            &["verbose", "other"],
            &[],
        );
        assert_eq!(r.flags[0].arg_indices(), &[0]);
        assert_eq!(r.flags[0].value(), Some(&Value::Scalar(Scalar::Bool(true))));
        assert!(!r.flags[1].is_matched());
        assert!(r.args[1].flag_id.is_none());
    }

    #[test]
    fn test_required_scoping() {
        let r = run(
            FieldsBuilder::new()
                .value("Token", "string", &[("long", "token"), ("required", "true")])
                .group("Deploy", &[], |g| {
                    g.value("Env", "string", &[("short", "e"), ("required", "true")])
                })
                .group("Build", &[("required", "true")], |g| {
                    g.value("Out", "string", &[("long", "out"), ("required", "true")])
                }),
            &["build"],
            &[],
        );
        assert_eq!(
            r.flags[0].error().unwrap().to_string(),
            "argument --token is required"
        );
        assert!(r.flags[2].error().is_none());
        assert!(r.flags[3].error().is_none());
        assert_eq!(
            r.flags[4].error().unwrap().to_string(),
            "argument --out is required for build command"
        );
    }

    #[test]
    fn test_required_command() {
        let r = run(
            FieldsBuilder::new().group("Build", &[("required", "true")], |g| g),
            &[],
            &[],
        );
        assert_eq!(r.flags[0].error().unwrap().to_string(), "command build is required");
    }

    #[test]
    fn test_required_not_satisfied_by_default() {
        let r = run(
            FieldsBuilder::new().value(
                "Level",
                "string",
                &[("long", "level"), ("required", "true"), ("default", "info")],
            ),
            &[],
            &[],
        );
        assert_eq!(r.flags[0].source(), Some(ValueSource::Default));
        assert_eq!(r.flags[0].value(), Some(&Value::Scalar(Scalar::Str("info".into()))));
        assert_eq!(
            r.flags[0].error().unwrap().to_string(),
            "argument --level is required"
        );
    }
}
