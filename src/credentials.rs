//! Obtains the user and password for one invocation.
//!
//! Supplied values are used as they are. Otherwise the user is prompted on the
//! terminal; the password is read with echo off and can be interrupted, in
//! which case the terminal is restored and [`Error::Cancelled`] is returned.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rabbitmq::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretInput {
    Entered(String),
    Cancelled,
}

/// Blocking terminal I/O used by the resolver.
pub trait Terminal: Send + 'static {
    /// Prompt and read one echoed line.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Prompt and read a line without echo. Must return `Cancelled` soon after
    /// `cancel` fires, with the terminal back in its original mode.
    fn read_secret(&mut self, prompt: &str, cancel: &CancellationToken) -> io::Result<SecretInput>;
}

/// Resolves credentials, prompting when either value is missing. An interrupt
/// during password entry yields [`Error::Cancelled`].
pub async fn resolve_credentials<T: Terminal>(user: &str, password: &str, terminal: T) -> Result<Credentials> {
    let cancel = CancellationToken::new();
    resolve_credentials_with(user, password, terminal, cancel).await
}

/// Like [`resolve_credentials`], with a caller-owned token that cancels the
/// password read in addition to the interrupt signal.
pub async fn resolve_credentials_with<T: Terminal>(
    user: &str,
    password: &str,
    mut terminal: T,
    cancel: CancellationToken,
) -> Result<Credentials> {
    if !user.is_empty() && !password.is_empty() {
        return Ok(Credentials {
            user: user.to_string(),
            password: password.to_string(),
        });
    }

    debug!("Credentials incomplete, prompting");

    let (returned, line) = task::spawn_blocking(move || {
        let line = terminal.read_line("User: ");
        (terminal, line)
    })
    .await
    .map_err(|e| Error::CredentialInput(e.to_string()))?;
    terminal = returned;

    let user = line
        .map_err(|e| Error::CredentialInput(format!("error reading user from stdin: {}", e)))?
        .trim()
        .to_string();

    // Armed before the blocking read, disarmed when `_armed` drops.
    let disarm = CancellationToken::new();
    arm_interrupt_watcher(cancel.clone(), disarm.clone());
    let _armed = disarm.drop_guard();

    let secret = task::spawn_blocking(move || terminal.read_secret("Password: ", &cancel))
        .await
        .map_err(|e| Error::CredentialInput(e.to_string()))?
        .map_err(|e| Error::CredentialInput(format!("error reading password from stdin: {}", e)))?;

    match secret {
        SecretInput::Entered(password) => Ok(Credentials { user, password }),
        SecretInput::Cancelled => Err(Error::Cancelled),
    }
}

fn arm_interrupt_watcher(cancel: CancellationToken, disarm: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    debug!("Interrupt received during password entry");
                    cancel.cancel();
                }
                Err(e) => warn!("Failed to listen for interrupt: {}", e),
            },
            _ = disarm.cancelled() => {}
        }
    });
}

/// The controlling terminal, driven through crossterm.
#[derive(Debug, Default)]
pub struct ConsoleTerminal;

impl Terminal for ConsoleTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn read_secret(&mut self, prompt: &str, cancel: &CancellationToken) -> io::Result<SecretInput> {
        if !io::stdin().is_terminal() {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "stdin is not a terminal"));
        }

        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let outcome = {
            let _raw = RawMode::enable()?;
            read_keys(cancel)
        };

        writeln!(stderr)?;
        outcome
    }
}

/// Keeps the terminal in raw mode (no echo, no line buffering) while alive.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

fn read_keys(cancel: &CancellationToken) -> io::Result<SecretInput> {
    let mut secret = String::new();

    loop {
        if cancel.is_cancelled() {
            return Ok(SecretInput::Cancelled);
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match apply_key(&mut secret, key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Submit => return Ok(SecretInput::Entered(secret)),
                // Raw mode turns Ctrl-C into a key press instead of a signal.
                KeyOutcome::Interrupt => {
                    cancel.cancel();
                    return Ok(SecretInput::Cancelled);
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Submit,
    Interrupt,
}

fn apply_key(secret: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }

    match key.code {
        KeyCode::Enter => KeyOutcome::Submit,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyOutcome::Interrupt
        }
        KeyCode::Backspace => {
            secret.pop();
            KeyOutcome::Continue
        }
        // Other control chords are editing shortcuts, never password text.
        KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            KeyOutcome::Continue
        }
        KeyCode::Char(c) => {
            secret.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}
