//! Process-backed servo senders.
//!
//! The serial link is driven by a separate `send` process so the frame loop never blocks on the
//! hardware. [`SpawnSender`] launches one short-lived process per command; [`PipeSender`] keeps
//! a single `send --serve` process alive and streams command lines into its stdin.

use crate::{
    config::Config,
    dispatch::{ServoCommand, ServoSender},
    Error, Result,
};
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Resolve the program that provides the `send` subcommand
///
/// # Errors
///
/// Returns an error if no program is configured and the current executable cannot be located
pub fn resolve_sender_program(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_exe().map_err(Error::from),
    }
}

/// Settings every spawned `send` process inherits from the parent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderOptions {
    /// Configuration file the parent was started with
    pub config_path: Option<PathBuf>,
    /// Serial port; wins over the child's own configuration
    pub port: Option<String>,
    /// Baud rate; wins over the child's own configuration
    pub baud: Option<u32>,
}

impl SenderOptions {
    /// Carry the configured serial settings (and the file they came from) to the child
    #[must_use]
    pub fn from_config(config: &Config, config_path: Option<&Path>) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            port: config.dispatch.port.clone().or_else(|| config.serial.port.clone()),
            baud: Some(config.serial.baud),
        }
    }

    /// `send` invocation: global flags, the subcommand, then the serial overrides
    fn command_line(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.config_path {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        args.push("send".to_string());
        if let Some(baud) = self.baud {
            args.push("--baud".to_string());
            args.push(baud.to_string());
        }
        args
    }
}

/// Command-line arguments that make `send` deliver one command
#[must_use]
pub fn send_args(command: &ServoCommand, options: &SenderOptions) -> Vec<String> {
    let mut args = options.command_line();
    args.extend([
        "--channel".to_string(),
        command.channel.to_string(),
        "--angle".to_string(),
        command.angle.to_string(),
    ]);
    if let Some(port) = command.port.as_ref().or(options.port.as_ref()) {
        args.push("--port".to_string());
        args.push(port.clone());
    }
    args
}

/// Launches one `send` process per command without waiting for it
pub struct SpawnSender {
    program: PathBuf,
    options: SenderOptions,
    children: Vec<Child>,
}

impl SpawnSender {
    #[must_use]
    pub fn new(program: PathBuf, options: SenderOptions) -> Self {
        Self {
            program,
            options,
            children: Vec::new(),
        }
    }

    /// Collect exit statuses of finished children so they do not linger as zombies
    fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!("Sender process {} exited with {}", child.id(), status);
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Cannot poll sender process {}: {}", child.id(), e);
                false
            }
        });
    }

    /// Number of launched processes that have not been reaped yet
    #[must_use]
    pub fn pending(&self) -> usize {
        self.children.len()
    }
}

impl ServoSender for SpawnSender {
    fn send(&mut self, command: &ServoCommand) -> Result<()> {
        self.reap();

        let args = send_args(command, &self.options);
        debug!("$ {} {}", self.program.display(), args.join(" "));

        // stdout stays clear: it carries the tracker's ANGLE protocol
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| Error::DispatchError(format!("cannot launch {}: {e}", self.program.display())))?;

        self.children.push(child);
        Ok(())
    }
}

/// Command-line arguments for a long-lived `send --serve` process
#[must_use]
pub fn serve_args(channel: u8, options: &SenderOptions) -> Vec<String> {
    let mut args = options.command_line();
    args.extend(["--serve".to_string(), "--channel".to_string(), channel.to_string()]);
    if let Some(port) = &options.port {
        args.push("--port".to_string());
        args.push(port.clone());
    }
    args
}

/// Streams `<channel> <angle>` lines to a long-lived serve process
pub struct PipeSender<W: Write> {
    writer: Option<W>,
    child: Option<Child>,
}

impl PipeSender<ChildStdin> {
    /// Start `<program> [--config F] send --serve --channel C [--baud B] [--port P]` and attach to
    /// its stdin
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started
    pub fn spawn(program: &Path, channel: u8, options: &SenderOptions) -> Result<Self> {
        let args = serve_args(channel, options);

        info!("$ {} {}", program.display(), args.join(" "));
        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| Error::DispatchError(format!("failed to start hand server: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::DispatchError("hand server has no stdin".to_string()))?;

        Ok(Self {
            writer: Some(stdin),
            child: Some(child),
        })
    }
}

impl<W: Write> PipeSender<W> {
    /// Wrap an arbitrary writer; nothing is spawned
    pub const fn from_writer(writer: W) -> Self {
        Self {
            writer: Some(writer),
            child: None,
        }
    }

    /// Close the pipe and wait for the serve process to drain and exit
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the child fails
    pub fn shutdown(&mut self) -> Result<()> {
        drop(self.writer.take());
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            info!("Hand server exited with {}", status);
        }
        Ok(())
    }

    /// Kill the serve process without waiting for pending lines
    ///
    /// # Errors
    ///
    /// Returns an error if the child cannot be killed or reaped
    pub fn terminate(&mut self) -> Result<()> {
        drop(self.writer.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Hand server already gone: {}", e);
            }
            child.wait()?;
        }
        Ok(())
    }

    /// The underlying writer, if the pipe is still open
    pub fn writer(&self) -> Option<&W> {
        self.writer.as_ref()
    }
}

impl<W: Write> ServoSender for PipeSender<W> {
    fn send(&mut self, command: &ServoCommand) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::DispatchError("hand server pipe is closed".to_string()))?;

        writeln!(writer, "{command}")
            .and_then(|()| writer.flush())
            .map_err(|e| Error::DispatchError(format!("error writing to hand server stdin: {e}")))
    }
}

impl<W: Write> Drop for PipeSender<W> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Hand server shutdown failed: {}", e);
        }
    }
}

/// Logs commands instead of sending them
#[derive(Debug, Default)]
pub struct NullSender {
    sent: usize,
}

impl NullSender {
    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }
}

impl ServoSender for NullSender {
    fn send(&mut self, command: &ServoCommand) -> Result<()> {
        self.sent += 1;
        info!("Sending disabled, would send '{}'", command);
        Ok(())
    }
}
