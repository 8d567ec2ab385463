//! Log directory provisioning

use crate::core::{LoggerError, Result};
use std::path::{Component, Path};

/// Characters Windows refuses in path components
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

#[cfg(unix)]
const DIR_MODE: u32 = 0o777;

/// Creates log destinations before file sinks open them
///
/// Implementations must be idempotent: an existing directory is success.
pub trait DirectoryProvisioner: Send + Sync {
    fn ensure_directory(&self, path: &Path) -> Result<()>;
}

/// Provisioner backed by the local file system
#[derive(Debug, Clone, Copy)]
pub struct FsProvisioner {
    reject_reserved_chars: bool,
}

impl Default for FsProvisioner {
    fn default() -> Self {
        Self {
            reject_reserved_chars: cfg!(windows),
        }
    }
}

impl FsProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject Windows-reserved characters regardless of the host
    #[must_use]
    pub fn with_reserved_char_check(mut self, enabled: bool) -> Self {
        self.reject_reserved_chars = enabled;
        self
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !self.reject_reserved_chars {
            return Ok(());
        }
        let invalid = path.components().any(|component| match component {
            Component::Normal(part) => part.to_string_lossy().contains(RESERVED_CHARS),
            _ => false,
        });
        if invalid {
            return Err(LoggerError::invalid_path(path.display().to_string()));
        }
        Ok(())
    }
}

impl DirectoryProvisioner for FsProvisioner {
    fn ensure_directory(&self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        self.validate(path)?;
        if path.is_dir() {
            return Ok(());
        }

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(path).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                path.display().to_string(),
                e,
            )
        })
    }
}
