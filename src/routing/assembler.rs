//! Stream assembly
//!
//! Expands effective rules into bindings: one sink per `(rule level, output
//! mode)` pair, named after the logger, or after the level for wildcard
//! rules so that each wildcard severity gets its own file.

use super::target::SinkFactory;
use crate::config::{Rule, TargetKind, TargetsConfig};
use crate::core::{LogLevel, LoggerError, Result, Sink};
use parking_lot::Mutex;

/// Title-case every space-separated word: `"error"` becomes `"Error"`
pub fn to_file_name_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stream name a rule's sinks are built for
pub fn stream_name(rule: &Rule) -> String {
    if rule.logger_name.is_wildcard() {
        to_file_name_case(rule.level.label())
    } else {
        to_file_name_case(&rule.logger_name.to_string())
    }
}

/// One sink and the lowest severity it accepts
pub struct Binding {
    min_level: LogLevel,
    key: String,
    sink: Mutex<Box<dyn Sink>>,
}

impl Binding {
    pub fn new(min_level: LogLevel, key: impl Into<String>, sink: Box<dyn Sink>) -> Self {
        Self {
            min_level,
            key: key.into(),
            sink: Mutex::new(sink),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Destination identity
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn sink(&self) -> &Mutex<Box<dyn Sink>> {
        &self.sink
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("min_level", &self.min_level)
            .field("key", &self.key)
            .finish()
    }
}

/// Ordered bindings of one logger, unique per `(level, destination)`
#[derive(Debug, Default)]
pub struct BindingList {
    bindings: Vec<Binding>,
}

impl BindingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, level: LogLevel, key: &str) -> bool {
        self.bindings
            .iter()
            .any(|binding| binding.min_level == level && binding.key == key)
    }

    /// Add `binding` unless the same level and destination is already bound
    pub fn push(&mut self, binding: Binding) -> bool {
        if self.contains(binding.min_level, &binding.key) {
            return false;
        }
        self.bindings.push(binding);
        true
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Bindings a record at `level` is written to
    ///
    /// Of the bindings accepting `level`, only those with the highest
    /// `min_level` are selected.
    pub fn select(&self, level: LogLevel) -> impl Iterator<Item = &Binding> {
        let threshold = self
            .bindings
            .iter()
            .map(|binding| binding.min_level)
            .filter(|min_level| *min_level <= level)
            .max();
        self.bindings
            .iter()
            .filter(move |binding| Some(binding.min_level) == threshold)
    }
}

/// Builds binding lists from effective rules
#[derive(Debug, Clone)]
pub struct StreamAssembler {
    factory: SinkFactory,
}

impl StreamAssembler {
    pub fn new(factory: SinkFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &SinkFactory {
        &self.factory
    }

    /// # Errors
    ///
    /// `UnknownOutputMode` naming the first output mode that is not a
    /// declared target, or any error raised while building a sink.
    pub fn assemble(&self, rules: &[Rule], targets: &TargetsConfig) -> Result<BindingList> {
        let mut bindings = BindingList::new();

        for rule in rules {
            let name = stream_name(rule);
            for mode in rule.output_modes() {
                let kind: TargetKind = mode.parse()?;
                if !targets.is_declared(kind) {
                    return Err(LoggerError::unknown_output_mode(mode));
                }

                let key = self.factory.destination_key(kind, targets, &name);
                if bindings.contains(rule.level, &key) {
                    continue;
                }
                if let Some(descriptor) = self.factory.build(kind, targets, &name)? {
                    bindings.push(Binding::new(rule.level, descriptor.key, descriptor.destination));
                }
            }
        }

        Ok(bindings)
    }
}
