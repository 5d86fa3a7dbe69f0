//! Sharing a post: native share when the host has it, clipboard otherwise

use anyhow::Result;
use base64::Engine;
use serde::Serialize;
use std::cell::RefCell;
use std::io::{Stdout, Write};

/// What gets shared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRequest {
    pub title: String,
    pub url: String,
}

/// Which path the share took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the host's native share capability
    Shared,
    /// URL written to the clipboard
    Copied,
}

/// Capabilities provided by whatever is displaying the post
pub trait ShareHost {
    /// Whether a native share capability exists
    fn supports_native_share(&self) -> bool {
        false
    }

    /// Share title and URL through the native capability
    fn native_share(&self, request: &ShareRequest) -> Result<()>;

    /// Write text to the clipboard
    fn write_clipboard(&self, text: &str) -> Result<()>;
}

/// Share `request` through `host`
pub fn share(host: &dyn ShareHost, request: &ShareRequest) -> Result<ShareOutcome> {
    if host.supports_native_share() {
        host.native_share(request)?;
        tracing::debug!("Shared {} natively", request.url);
        Ok(ShareOutcome::Shared)
    } else {
        host.write_clipboard(&request.url)?;
        tracing::debug!("Copied {} to clipboard", request.url);
        Ok(ShareOutcome::Copied)
    }
}

/// Share host for terminals. There is no native share; the clipboard is
/// written with the OSC 52 escape sequence, which most terminal emulators honor.
#[derive(Debug)]
pub struct TerminalShareHost<W = Stdout> {
    out: RefCell<W>,
}

impl TerminalShareHost {
    /// Host writing to the process's stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalShareHost<W> {
    /// Host writing escape sequences to `out`
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }
}

impl<W: Write> ShareHost for TerminalShareHost<W> {
    fn native_share(&self, _request: &ShareRequest) -> Result<()> {
        anyhow::bail!("terminals have no native share capability")
    }

    fn write_clipboard(&self, text: &str) -> Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(osc52(text).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// OSC 52 "set clipboard" sequence for `text`
fn osc52(text: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{}\x07", payload)
}
