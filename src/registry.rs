//! Logger registry
//!
//! A `LogManager` owns the configuration and the cache of built loggers.
//! Each name is resolved and assembled once; later requests return the
//! cached logger. A process-global manager can be installed with
//! [`init_global`] and queried through [`get_logger`].

use crate::config::LoggerConfig;
use crate::core::{
    FormatOptions, LoggerError, LoggerHooks, LoggerInstance, Prettifier, Result,
};
use crate::logger::Logger;
use crate::provision::{DirectoryProvisioner, FsProvisioner};
use crate::routing::{resolve, BindingList, ConsoleWriterFn, SinkFactory, StreamAssembler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub struct LogManager {
    config: LoggerConfig,
    hooks: LoggerHooks,
    assembler: StreamAssembler,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl LogManager {
    /// Manager with default hooks and file system provisioning
    pub fn new(config: LoggerConfig) -> Self {
        LogManagerBuilder::new(config).build()
    }

    pub fn builder(config: LoggerConfig) -> LogManagerBuilder {
        LogManagerBuilder::new(config)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Logger named `name`, built on first request
    ///
    /// # Errors
    ///
    /// `NoRules` when no rule applies to `name`, `UnknownOutputMode` when a
    /// rule routes to an undeclared target. Failed builds are not cached.
    pub fn get_logger(&self, name: &str) -> Result<Arc<Logger>> {
        if let Some(logger) = self.loggers.read().get(name) {
            return Ok(Arc::clone(logger));
        }

        let mut loggers = self.loggers.write();
        if let Some(logger) = loggers.get(name) {
            return Ok(Arc::clone(logger));
        }

        let logger = Arc::new(self.build_logger(name)?);
        loggers.insert(name.to_string(), Arc::clone(&logger));
        Ok(logger)
    }

    /// Names of the loggers built so far
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Flush every built logger
    pub fn flush_all(&self) {
        for logger in self.loggers.read().values() {
            logger.flush();
        }
    }

    fn build_logger(&self, name: &str) -> Result<Logger> {
        let instance = Arc::new(LoggerInstance::new(name, self.hooks.clone()));
        if self.config.is_disabled(name) {
            return Ok(Logger::new(instance, BindingList::new()));
        }

        let rules = resolve(&self.config.rules, name)?;
        let bindings = self.assembler.assemble(&rules, &self.config.targets)?;
        Ok(Logger::new(instance, bindings))
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("config", &self.config)
            .field("loggers", &self.logger_names())
            .finish()
    }
}

/// Builder for [`LogManager`]
pub struct LogManagerBuilder {
    config: LoggerConfig,
    hooks: LoggerHooks,
    provisioner: Arc<dyn DirectoryProvisioner>,
    prettifier: Option<Prettifier>,
    format_options: FormatOptions,
    console_writer: Option<ConsoleWriterFn>,
}

impl LogManagerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            hooks: LoggerHooks::default(),
            provisioner: Arc::new(FsProvisioner::default()),
            prettifier: None,
            format_options: FormatOptions::default(),
            console_writer: None,
        }
    }

    /// Formatting hooks given to every logger
    #[must_use]
    pub fn hooks(mut self, hooks: LoggerHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn provisioner(mut self, provisioner: Arc<dyn DirectoryProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    #[must_use]
    pub fn prettifier(mut self, prettifier: Prettifier) -> Self {
        self.prettifier = Some(prettifier);
        self
    }

    #[must_use]
    pub fn suppress_flush_warning(mut self, suppress: bool) -> Self {
        self.format_options.suppress_flush_warning = suppress;
        self
    }

    #[must_use]
    pub fn console_writer(mut self, writer: ConsoleWriterFn) -> Self {
        self.console_writer = Some(writer);
        self
    }

    pub fn build(self) -> LogManager {
        let mut factory = SinkFactory::new(self.config.log_dir.clone())
            .with_provisioner(self.provisioner)
            .with_format_options(self.format_options);
        if let Some(prettifier) = self.prettifier {
            factory = factory.with_prettifier(prettifier);
        }
        if let Some(writer) = self.console_writer {
            factory = factory.with_console_writer(writer);
        }

        LogManager {
            config: self.config,
            hooks: self.hooks,
            assembler: StreamAssembler::new(factory),
            loggers: RwLock::new(HashMap::new()),
        }
    }
}

static GLOBAL: OnceLock<LogManager> = OnceLock::new();

/// Install the process-wide manager; fails if one is already installed
pub fn init_global(manager: LogManager) -> Result<()> {
    GLOBAL
        .set(manager)
        .map_err(|_| LoggerError::other("global log manager already initialized"))
}

/// The process-wide manager, if installed
pub fn global() -> Option<&'static LogManager> {
    GLOBAL.get()
}

/// Logger from the process-wide manager
///
/// # Errors
///
/// `InvalidConfiguration` if [`init_global`] has not been called, otherwise
/// whatever [`LogManager::get_logger`] reports.
pub fn get_logger(name: &str) -> Result<Arc<Logger>> {
    match GLOBAL.get() {
        Some(manager) => manager.get_logger(name),
        None => Err(LoggerError::config(
            "registry",
            "global log manager not initialized",
        )),
    }
}
