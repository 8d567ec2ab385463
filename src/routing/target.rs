//! Target descriptor builder
//!
//! Turns one `(target kind, stream name)` pair into a ready sink, wrapped in
//! a lazy formatter when the target asks for human-readable output.

use crate::config::{TargetKind, TargetsConfig};
use crate::core::{
    FormatOptions, LazyFormatter, LoggerError, MessageFormat, Prettifier, PrettyOptions, Result,
    Sink, TimestampFormat,
};
use crate::provision::{DirectoryProvisioner, FsProvisioner};
use crate::sinks::{
    ConsoleSink, ElasticSink, FileTemplate, RemoteSink, RotatingFileSink, RotationPolicy,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Placeholder replaced by the stream name in file names
pub const FILE_NAME_PLACEHOLDER: &str = "%fileName%";

/// Produces the writer behind each console sink
pub type ConsoleWriterFn = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

/// A built sink and the identity used to deduplicate it
pub struct SinkDescriptor {
    pub kind: TargetKind,
    pub key: String,
    pub destination: Box<dyn Sink>,
}

impl std::fmt::Debug for SinkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkDescriptor")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("destination", &self.destination.name())
            .finish()
    }
}

/// Builds sinks for every target kind
#[derive(Clone)]
pub struct SinkFactory {
    log_dir: PathBuf,
    provisioner: Arc<dyn DirectoryProvisioner>,
    prettifier: Option<Prettifier>,
    format_options: FormatOptions,
    console_writer: Option<ConsoleWriterFn>,
}

impl SinkFactory {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            provisioner: Arc::new(FsProvisioner::default()),
            prettifier: None,
            format_options: FormatOptions::default(),
            console_writer: None,
        }
    }

    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Arc<dyn DirectoryProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Replace the default renderer of every formatted target
    #[must_use]
    pub fn with_prettifier(mut self, prettifier: Prettifier) -> Self {
        self.prettifier = Some(prettifier);
        self
    }

    #[must_use]
    pub fn with_format_options(mut self, options: FormatOptions) -> Self {
        self.format_options = options;
        self
    }

    /// Send console output somewhere other than stdout
    #[must_use]
    pub fn with_console_writer(mut self, writer: ConsoleWriterFn) -> Self {
        self.console_writer = Some(writer);
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Destination identity of `kind` for `stream_name`, without building it
    pub fn destination_key(
        &self,
        kind: TargetKind,
        targets: &TargetsConfig,
        stream_name: &str,
    ) -> String {
        match kind {
            TargetKind::Console => "console".to_string(),
            TargetKind::File => {
                let template = targets
                    .file
                    .as_ref()
                    .map(|file| self.file_template(stream_name, &file.file_name, &file.ext));
                match template {
                    Some(template) => {
                        let mut path = template.dir.join(&template.file_name).display().to_string();
                        if !template.ext.is_empty() {
                            path.push('.');
                            path.push_str(&template.ext);
                        }
                        format!("file:{}", path)
                    }
                    None => "file".to_string(),
                }
            }
            TargetKind::Remote => format!(
                "remote:{}",
                targets.remote.as_ref().map(|r| r.url.as_str()).unwrap_or_default()
            ),
            TargetKind::Elastic => match targets.elastic {
                Some(ref elastic) => format!("elastic:{}/{}", elastic.uri, elastic.index_name),
                None => "elastic".to_string(),
            },
        }
    }

    /// Build the sink of `kind`; `None` when the target is declared but inert
    ///
    /// # Errors
    ///
    /// `UnknownOutputMode` if `kind` has no configuration in `targets`, or an
    /// invalid configuration error for an unusable endpoint.
    pub fn build(
        &self,
        kind: TargetKind,
        targets: &TargetsConfig,
        stream_name: &str,
    ) -> Result<Option<SinkDescriptor>> {
        let key = self.destination_key(kind, targets, stream_name);
        let destination = match kind {
            TargetKind::Console => {
                let target = targets
                    .console
                    .as_ref()
                    .ok_or_else(|| LoggerError::unknown_output_mode(kind.as_str()))?;
                target.pretty.validate()?;
                let options = target.pretty.apply(
                    PrettyOptions::default()
                        .with_hide_object(true)
                        .with_message_format(MessageFormat::Message),
                );
                let console = match self.console_writer {
                    Some(ref writer) => ConsoleSink::with_writer(writer()),
                    None => ConsoleSink::new(),
                };
                Some(self.formatted(Box::new(console), options))
            }
            TargetKind::File => {
                let target = targets
                    .file
                    .as_ref()
                    .ok_or_else(|| LoggerError::unknown_output_mode(kind.as_str()))?;
                let template = self
                    .file_template(stream_name, &target.file_name, &target.ext)
                    .with_date_format(TimestampFormat::from_dayjs(&target.date_format));
                self.provision(&template);

                let policy = RotationPolicy::new()
                    .with_max_size(target.size.0)
                    .with_retention(target.max_logs)
                    .with_compression(target.compress);
                let file: Box<dyn Sink> = Box::new(RotatingFileSink::new(template, policy));
                match target.pretty_config {
                    Some(ref pretty) => {
                        pretty.validate()?;
                        let options = pretty.apply(
                            PrettyOptions::file_defaults()
                                .with_hide_object(true)
                                .with_message_format(MessageFormat::ErrorReport),
                        );
                        Some(self.formatted(file, options))
                    }
                    None => Some(file),
                }
            }
            TargetKind::Remote => {
                let target = targets
                    .remote
                    .as_ref()
                    .ok_or_else(|| LoggerError::unknown_output_mode(kind.as_str()))?;
                if target.url.is_empty() {
                    eprintln!("[WARN] remote target has no url, skipping it for '{}'", stream_name);
                    None
                } else {
                    let remote: Box<dyn Sink> = Box::new(RemoteSink::new(&target.url)?);
                    match target.pretty_config {
                        Some(ref pretty) => {
                            pretty.validate()?;
                            Some(self.formatted(remote, pretty.apply(PrettyOptions::default())))
                        }
                        None => Some(remote),
                    }
                }
            }
            TargetKind::Elastic => {
                let target = targets
                    .elastic
                    .as_ref()
                    .ok_or_else(|| LoggerError::unknown_output_mode(kind.as_str()))?;
                if target.uri.is_empty() || target.index_name.is_empty() {
                    eprintln!(
                        "[WARN] elastic target has no uri or index name, skipping it for '{}'",
                        stream_name
                    );
                    None
                } else {
                    Some(Box::new(ElasticSink::new(
                        &target.uri,
                        target.index_name.as_str(),
                        target.doc_type.as_str(),
                        target.fields.clone(),
                    )?) as Box<dyn Sink>)
                }
            }
        };

        Ok(destination.map(|destination| SinkDescriptor {
            kind,
            key,
            destination,
        }))
    }

    fn file_template(&self, stream_name: &str, file_name: &str, ext: &str) -> FileTemplate {
        FileTemplate::new(
            self.log_dir.clone(),
            file_name.replace(FILE_NAME_PLACEHOLDER, stream_name),
            ext,
        )
    }

    fn provision(&self, template: &FileTemplate) {
        let path = template.resolve();
        let dir = path.parent().unwrap_or(self.log_dir.as_path());
        if let Err(e) = self.provisioner.ensure_directory(dir) {
            eprintln!("[WARN] {}", e);
        }
    }

    fn formatted(&self, inner: Box<dyn Sink>, options: PrettyOptions) -> Box<dyn Sink> {
        let prettifier = match self.prettifier {
            Some(ref custom) => Arc::clone(custom),
            None => options.into_prettifier(),
        };
        Box::new(LazyFormatter::with_options(inner, prettifier, self.format_options))
    }
}

impl std::fmt::Debug for SinkFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkFactory")
            .field("log_dir", &self.log_dir)
            .field("prettifier", &self.prettifier.is_some())
            .field("format_options", &self.format_options)
            .field("console_writer", &self.console_writer.is_some())
            .finish()
    }
}
