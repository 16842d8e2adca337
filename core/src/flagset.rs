//! The [`FlagSet`]: declared flags resolved against one token list.

use tracing::debug;

use crate::descriptor::FieldDescriptor;
use crate::destination::Destination;
use crate::error::{ResolveError, ValidationError};
use crate::flag::{Flag, build_flags};
use crate::report::{FlagReport, ResolutionReport};
use crate::resolve::{Environment, ProcessEnv, check_required, match_args, resolve_values};
use crate::segment::{Arg, Command, segment_args, segment_commands};
use crate::types::{ArgKind, FlagKind};
use crate::validate::validate_fields;

/// Declared flags bound to one token list.
///
/// Construction validates the declaration and segments the tokens;
/// [`resolve`](FlagSet::resolve) binds tokens to flags, applies the
/// argument > environment > default precedence and writes values to a
/// [`Destination`]. Resolution problems are collected, never returned:
/// inspect [`errors`](FlagSet::errors) afterwards.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use flagset_core::{FieldsBuilder, FlagSet, ValueStore};
///
/// let fields = FieldsBuilder::new()
///     .value("Verbose", "bool", &[("short", "v"), ("long", "verbose")])
///     .group("Serve", &[], |g| {
///         g.value("Port", "int", &[("long", "port"), ("env", "PORT"), ("default", "8080")])
///     })
///     .build();
///
/// let mut flags = FlagSet::new(&fields, ["-v", "serve"]).unwrap();
/// let mut store = ValueStore::new();
/// let env: HashMap<String, String> = HashMap::new();
/// flags.resolve(&mut store, &env);
///
/// assert!(flags.errors().is_empty());
/// let port = flags.flag_by_name("Serve.Port").unwrap();
/// assert_eq!(store.get_i64(&port.path), Some(8080));
/// assert_eq!(flags.flag_args("Serve"), Some(vec!["serve".to_string()]));
/// ```
#[derive(Debug, Clone)]
pub struct FlagSet {
    flags: Vec<Flag>,
    tokens: Vec<String>,
    args: Vec<Arg>,
    commands: Vec<Command>,
    segmented: bool,
    resolved: bool,
}

impl FlagSet {
    /// Builds and validates flags from `fields` and segments `tokens`.
    ///
    /// `tokens` are the arguments after the program name.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found in the declaration.
    pub fn new<I, S>(fields: &[FieldDescriptor], tokens: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(err) = validate_fields(fields).into_iter().next() {
            return Err(err);
        }

        let mut flag_set = Self {
            flags: build_flags(fields)?,
            tokens: tokens.into_iter().map(Into::into).collect(),
            args: Vec::new(),
            commands: Vec::new(),
            segmented: false,
            resolved: false,
        };
        flag_set.segment();
        Ok(flag_set)
    }

    /// Builds, segments and resolves against the process environment.
    pub fn parse<I, S>(
        fields: &[FieldDescriptor],
        tokens: I,
        dest: &mut dyn Destination,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flag_set = Self::new(fields, tokens)?;
        flag_set.resolve(dest, &ProcessEnv);
        Ok(flag_set)
    }

    /// Like [`parse`](FlagSet::parse), reading the process arguments after the
    /// program name.
    pub fn from_process(
        fields: &[FieldDescriptor],
        dest: &mut dyn Destination,
    ) -> Result<Self, ValidationError> {
        Self::parse(fields, std::env::args().skip(1), dest)
    }

    /// Locates commands and classifies tokens. Runs once; later calls do nothing.
    pub fn segment(&mut self) {
        if self.segmented {
            return;
        }
        self.commands = segment_commands(&self.flags, &self.tokens);
        self.args = segment_args(&self.commands, &self.tokens);
        self.segmented = true;
        debug!(
            tokens = self.tokens.len(),
            commands = self.commands.iter().filter(|c| c.is_present()).count(),
            "segmented arguments"
        );
    }

    /// Binds tokens to flags, resolves values into `dest` and checks required
    /// flags. Runs once; later calls do nothing.
    pub fn resolve(&mut self, dest: &mut dyn Destination, env: &dyn Environment) {
        if self.resolved {
            return;
        }
        self.segment();
        match_args(&mut self.flags, &mut self.args, &self.commands);
        resolve_values(&mut self.flags, &mut self.args, dest, env);
        check_required(&mut self.flags);
        self.resolved = true;
        debug!(errors = self.errors().len(), "resolved flags");
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Finds a flag by field name; nested names are separated by dots
    /// (`Serve.Port`).
    pub fn flag_by_name(&self, name: &str) -> Option<&Flag> {
        if name.is_empty() {
            return None;
        }

        let mut parent: Option<usize> = None;
        let mut found: Option<&Flag> = None;
        for segment in name.split('.') {
            let flag = self
                .flags
                .iter()
                .find(|f| f.parent_id == parent && f.name == segment)?;
            parent = Some(flag.id);
            found = Some(flag);
        }
        found
    }

    /// Returns the arguments given for a flag.
    ///
    /// For an argument flag these are the values of its occurrences
    /// (`["a", "b"]` for `-f=a -f=b`). For a command, the command token and
    /// every token it owns, rebuilt as `dash+name[=value]`
    /// (`["serve", "-v=true", "--port=80", "extra"]` for `serve -v --port 80 extra`).
    /// Returns `None` for unknown or unmatched flags.
    pub fn flag_args(&self, name: &str) -> Option<Vec<String>> {
        let flag = self.flag_by_name(name)?;
        if !flag.is_matched() {
            return None;
        }

        let args = flag.args.iter().map(|&i| &self.args[i]);
        let out = match flag.kind {
            FlagKind::Arg => args.map(|a| a.value.clone()).collect(),
            FlagKind::Command => args
                .filter(|a| a.kind != ArgKind::ArgVal)
                .map(Arg::render)
                .collect(),
        };
        Some(out)
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Unnamed tokens outside every command range.
    pub fn unnamed(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter(|a| a.kind == ArgKind::Arg && a.unnamed && a.command_id.is_none())
            .map(|a| a.raw.as_str())
            .collect()
    }

    /// Flag errors and the errors of their matched arguments, in declaration order.
    pub fn errors(&self) -> Vec<&ResolveError> {
        let mut errors = Vec::new();
        for flag in &self.flags {
            errors.extend(flag.error());
            if flag.kind == FlagKind::Arg {
                errors.extend(flag.args.iter().filter_map(|&i| self.args[i].error.as_ref()));
            }
        }
        errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Serializable summary of the resolution.
    pub fn report(&self) -> ResolutionReport {
        let flags = self
            .flags
            .iter()
            .map(|flag| FlagReport {
                name: self.qualified_name(flag),
                kind: flag.kind,
                value_type: flag.value_type.to_string(),
                source: flag.source(),
                value: flag.value().cloned(),
                args: self.flag_args_of(flag).unwrap_or_default(),
                error: flag.error().map(ToString::to_string),
            })
            .collect();

        ResolutionReport {
            flags,
            unnamed: self.unnamed().into_iter().map(String::from).collect(),
            errors: self.errors().into_iter().map(ToString::to_string).collect(),
        }
    }

    /// Dotted name of a flag (`Serve.Port`).
    pub fn qualified_name(&self, flag: &Flag) -> String {
        let mut parts = vec![flag.name.as_str()];
        let mut parent = flag.parent_id;
        while let Some(id) = parent {
            let p = &self.flags[id];
            parts.push(p.name.as_str());
            parent = p.parent_id;
        }
        parts.reverse();
        parts.join(".")
    }

    fn flag_args_of(&self, flag: &Flag) -> Option<Vec<String>> {
        self.flag_args(&self.qualified_name(flag))
    }
}
