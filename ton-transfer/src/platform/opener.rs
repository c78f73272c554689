//! Platform URL opener

use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Hands a URL to whatever application handles its scheme
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}

#[cfg(target_os = "macos")]
const OPEN_COMMAND: (&str, &[&str]) = ("open", &[]);

#[cfg(target_os = "windows")]
const OPEN_COMMAND: (&str, &[&str]) = ("rundll32", &["url.dll,FileProtocolHandler"]);

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPEN_COMMAND: (&str, &[&str]) = ("xdg-open", &[]);

/// Opens links with the desktop's URL handler command
#[derive(Debug, Clone)]
pub struct SystemLinkOpener {
    program: PathBuf,
    args: Vec<String>,
}

impl SystemLinkOpener {
    /// Locate the platform command, `None` when it is not installed
    pub fn detect() -> Option<Self> {
        let (program, args) = OPEN_COMMAND;
        let program = find_program(program)?;
        Some(Self {
            program,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }

    /// Path of the command used to open links
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

fn find_program(name: &str) -> Option<PathBuf> {
    let file_name = format!("{}{}", name, env::consts::EXE_SUFFIX);
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn open(&self, url: &str) -> Result<()> {
        debug!(program = %self.program.display(), "Opening link");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .status()
            .await
            .map_err(|e| Error::LinkOpenerUnavailable(format!("Failed to run {}: {}", self.program.display(), e)))?;

        if !status.success() {
            return Err(Error::Transaction(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}
