//! The terminal-emulator collaborator seam.
//!
//! The core treats the embedded terminal emulator as an opaque handle:
//! create it against a working directory, send it input, ask for its current
//! working directory, and learn about title changes and process exit through
//! [`TermEvent`]s. Rendering and escape-sequence handling live entirely
//! behind this seam.
//!
//! [`PtyTerminalFactory`] is the default collaborator: it spawns a real
//! process in a PTY with a vt100 state machine, the way a stand-alone build
//! runs. [`NullTerminalFactory`] creates inert handles for headless use.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::event::TermEvent;
use crate::pane::{PaneId, PaneSize};

/// Configuration for terminals created by a factory.
#[derive(Clone, Debug)]
pub struct TerminalConfig {
    /// Command to run. If None, uses the default shell.
    pub command: Option<String>,

    /// Arguments to pass to the command.
    pub args: Vec<String>,

    /// Initial size of the terminal.
    pub size: PaneSize,

    /// Additional environment variables.
    pub env: HashMap<String, String>,

    /// Scrollback buffer size in lines.
    pub scrollback: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            size: PaneSize::new(24, 80),
            env: HashMap::new(),
            scrollback: 10_000,
        }
    }
}

impl TerminalConfig {
    /// Set the command to run.
    #[must_use]
    pub fn command(mut self, cmd: impl Into<String>) -> Self {
        self.command = Some(cmd.into());
        self
    }

    /// Set command arguments.
    #[must_use]
    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the scrollback buffer size.
    #[must_use]
    pub fn scrollback(mut self, lines: usize) -> Self {
        self.scrollback = lines;
        self
    }
}

/// An opaque handle to one embedded terminal instance.
pub trait TerminalHandle: Send {
    /// Send raw bytes to the terminal's input.
    ///
    /// # Errors
    /// Returns an error if the terminal has shut down.
    fn send_input(&mut self, data: &[u8]) -> Result<()>;

    /// Resize the terminal.
    ///
    /// # Errors
    /// Returns an error if the resize operation fails.
    fn resize(&mut self, size: PaneSize) -> Result<()>;

    /// The terminal's current working directory, if it can be determined.
    fn working_directory(&self) -> Option<PathBuf>;

    /// Shut the terminal down, releasing its process and tasks.
    fn shutdown(&mut self);
}

/// Creates terminal handles on behalf of new panes.
pub trait TerminalFactory: Send {
    /// Create a terminal bound to `cwd` for the given pane.
    ///
    /// Terminal tasks report back through `event_tx`, tagged with `pane_id`.
    ///
    /// # Errors
    /// Returns [`Error::TerminalUnavailable`] (or a PTY error) if the
    /// collaborator cannot be instantiated. The caller still creates the
    /// pane, degraded.
    fn create(
        &mut self,
        pane_id: PaneId,
        cwd: Option<&Path>,
        event_tx: &mpsc::Sender<TermEvent>,
    ) -> Result<Box<dyn TerminalHandle>>;
}

/// The default factory: a process in a PTY with a vt100 state machine.
pub struct PtyTerminalFactory {
    config: TerminalConfig,
}

impl PtyTerminalFactory {
    /// Create a factory spawning terminals with the given configuration.
    #[must_use]
    pub fn new(config: TerminalConfig) -> Self {
        Self { config }
    }
}

impl Default for PtyTerminalFactory {
    fn default() -> Self {
        Self::new(TerminalConfig::default())
    }
}

impl TerminalFactory for PtyTerminalFactory {
    fn create(
        &mut self,
        pane_id: PaneId,
        cwd: Option<&Path>,
        event_tx: &mpsc::Sender<TermEvent>,
    ) -> Result<Box<dyn TerminalHandle>> {
        let pty_system = native_pty_system();

        let pty_pair = pty_system
            .openpty(PtySize {
                rows: self.config.size.rows,
                cols: self.config.size.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyCreate(e.to_string()))?;

        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        let mut cmd = match &self.config.command {
            Some(c) => {
                let mut builder = CommandBuilder::new(c);
                for arg in &self.config.args {
                    builder.arg(arg);
                }
                builder
            }
            None => CommandBuilder::new(&shell),
        };

        if let Some(cwd) = cwd {
            cmd.cwd(cwd);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let child = pty_pair.slave.spawn_command(cmd)?;
        let child_pid = child.process_id();

        let parser = vt100::Parser::new(
            self.config.size.rows,
            self.config.size.cols,
            self.config.scrollback,
        );
        let screen = Arc::new(RwLock::new(parser));

        let (input_tx, input_rx) = mpsc::channel::<Vec<u8>>(256);

        let reader_handle = spawn_reader_task(
            pane_id,
            pty_pair.master.try_clone_reader()?,
            screen,
            event_tx.clone(),
        );
        let writer_handle = spawn_writer_task(pty_pair.master.take_writer()?, input_rx);
        let monitor_handle = spawn_monitor_task(pane_id, child, event_tx.clone());

        Ok(Box::new(PtyTerminal {
            input_tx,
            pty_master: pty_pair.master,
            child_pid,
            spawn_cwd: cwd.map(Path::to_path_buf),
            reader_handle,
            writer_handle,
            monitor_handle,
        }))
    }
}

/// A live PTY-backed terminal.
struct PtyTerminal {
    input_tx: mpsc::Sender<Vec<u8>>,
    pty_master: Box<dyn portable_pty::MasterPty + Send>,
    child_pid: Option<u32>,
    spawn_cwd: Option<PathBuf>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    monitor_handle: JoinHandle<()>,
}

impl TerminalHandle for PtyTerminal {
    fn send_input(&mut self, data: &[u8]) -> Result<()> {
        self.input_tx
            .try_send(data.to_vec())
            .map_err(|_| Error::TerminalClosed)
    }

    fn resize(&mut self, size: PaneSize) -> Result<()> {
        self.pty_master
            .resize(PtySize {
                rows: size.rows,
                cols: size.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Resize(e.to_string()))
    }

    fn working_directory(&self) -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        if let Some(pid) = self.child_pid {
            if let Ok(cwd) = std::fs::read_link(format!("/proc/{pid}/cwd")) {
                return Some(cwd);
            }
        }
        self.spawn_cwd.clone()
    }

    fn shutdown(&mut self) {
        self.reader_handle.abort();
        self.writer_handle.abort();
        self.monitor_handle.abort();
    }
}

impl Drop for PtyTerminal {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns the task that reads PTY output.
///
/// Output is fed through the vt100 parser; title changes detected there are
/// reported as [`TermEvent::TitleChanged`].
fn spawn_reader_task(
    pane_id: PaneId,
    mut reader: Box<dyn Read + Send>,
    screen: Arc<RwLock<vt100::Parser>>,
    event_tx: mpsc::Sender<TermEvent>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; 4096];
        let mut last_title = String::new();

        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    // EOF - process has closed
                    break;
                }
                Ok(n) => {
                    let data = &buf[..n];

                    let title = {
                        let mut screen = screen.write().expect("screen lock poisoned");
                        screen.process(data);
                        screen.screen().title().to_string()
                    };

                    if title != last_title {
                        last_title.clone_from(&title);
                        let _ = event_tx.blocking_send(TermEvent::TitleChanged { pane_id, title });
                    }

                    let _ = event_tx.blocking_send(TermEvent::Output { pane_id, len: n });
                }
                Err(e) => {
                    tracing::debug!("PTY read error for pane {}: {}", pane_id, e);
                    break;
                }
            }
        }

        tracing::debug!("Reader task for pane {} finished", pane_id);
    })
}

/// Spawns the task that writes to the PTY.
fn spawn_writer_task(
    mut writer: Box<dyn Write + Send>,
    mut input_rx: mpsc::Receiver<Vec<u8>>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while let Some(data) = input_rx.blocking_recv() {
            if let Err(e) = writer.write_all(&data) {
                tracing::debug!("PTY write error: {}", e);
                break;
            }
            if let Err(e) = writer.flush() {
                tracing::debug!("PTY flush error: {}", e);
                break;
            }
        }

        tracing::debug!("Writer task finished");
    })
}

/// Spawns the task that waits for process exit.
fn spawn_monitor_task(
    pane_id: PaneId,
    mut child: Box<dyn portable_pty::Child + Send>,
    event_tx: mpsc::Sender<TermEvent>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = child.wait() {
            tracing::debug!("wait failed for pane {}: {}", pane_id, e);
        }
        let _ = event_tx.blocking_send(TermEvent::Exited { pane_id });

        tracing::debug!("Monitor task for pane {} finished", pane_id);
    })
}

/// A factory producing inert terminals.
///
/// Useful for headless embeddings and for exercising the layout engine
/// without spawning processes. Input sent to its terminals is recorded in a
/// shared log.
#[derive(Clone, Default)]
pub struct NullTerminalFactory {
    log: Arc<Mutex<Vec<(PaneId, Vec<u8>)>>>,
    fail: bool,
}

impl NullTerminalFactory {
    /// Create a factory whose terminals accept and record input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory that refuses to instantiate terminals.
    ///
    /// Every pane created against it is degraded.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// All input sent to this factory's terminals, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<(PaneId, Vec<u8>)> {
        self.log.lock().expect("log lock poisoned").clone()
    }
}

impl TerminalFactory for NullTerminalFactory {
    fn create(
        &mut self,
        pane_id: PaneId,
        cwd: Option<&Path>,
        _event_tx: &mpsc::Sender<TermEvent>,
    ) -> Result<Box<dyn TerminalHandle>> {
        if self.fail {
            return Err(Error::TerminalUnavailable(
                "null factory configured to fail".to_string(),
            ));
        }
        Ok(Box::new(NullTerminal {
            pane_id,
            cwd: cwd.map(Path::to_path_buf),
            log: self.log.clone(),
        }))
    }
}

struct NullTerminal {
    pane_id: PaneId,
    cwd: Option<PathBuf>,
    log: Arc<Mutex<Vec<(PaneId, Vec<u8>)>>>,
}

impl TerminalHandle for NullTerminal {
    fn send_input(&mut self, data: &[u8]) -> Result<()> {
        self.log
            .lock()
            .expect("log lock poisoned")
            .push((self.pane_id, data.to_vec()));
        Ok(())
    }

    fn resize(&mut self, _size: PaneSize) -> Result<()> {
        Ok(())
    }

    fn working_directory(&self) -> Option<PathBuf> {
        self.cwd.clone()
    }

    fn shutdown(&mut self) {}
}
