//! Process launch and termination.

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ActionError {
    /// Termination found no matching process.
    #[error("process is not running")]
    NotRunning,

    #[error("failed to launch: {0}")]
    Launch(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg_attr(test, mockall::automock)]
pub trait Launcher {
    /// Start `command` through the platform shell without waiting for it.
    fn launch(&self, command: &str) -> Result<(), ActionError>;

    /// Open `url` in the default browser.
    fn open_url(&self, url: &str) -> Result<(), ActionError>;

    /// Terminate every process whose image name is `handle`.
    fn terminate(&self, handle: &str) -> Result<(), ActionError>;
}

/// Launcher backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn spawn_detached(mut command: Command) -> Result<(), ActionError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ActionError::Launch)?;

        // Reap in the background so the child never lingers as a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, command: &str) -> Result<(), ActionError> {
        debug!("Launching: {}", command);

        #[cfg(windows)]
        let cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", command]);
            cmd
        };

        #[cfg(not(windows))]
        let cmd = {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };

        Self::spawn_detached(cmd)
    }

    fn open_url(&self, url: &str) -> Result<(), ActionError> {
        debug!("Opening URL: {}", url);

        #[cfg(windows)]
        let cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        };

        #[cfg(target_os = "macos")]
        let cmd = {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        };

        #[cfg(not(any(windows, target_os = "macos")))]
        let cmd = {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        };

        Self::spawn_detached(cmd)
    }

    fn terminate(&self, handle: &str) -> Result<(), ActionError> {
        debug!("Terminating: {}", handle);

        #[cfg(windows)]
        let status = Command::new("taskkill")
            .args(["/im", handle, "/f"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        #[cfg(not(windows))]
        let status = Command::new("pkill")
            .args(["-x", handle])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::NotRunning)
        }
    }
}
