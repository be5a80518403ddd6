//! Collaborators that turn mediator side effects into output lines.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tollgate_approval::{
    ApprovalError, ApprovalResult, OutboundMessage, Popup, PrivacyModeSource, PublicStateNotifier,
    Target, Transport, UnlockStateSource,
};

use super::protocol::OutputLine;

/// Wallet flag toggled by control lines and read by the mediator.
#[derive(Debug, Clone)]
pub(crate) struct SharedFlag(Arc<AtomicBool>);

impl SharedFlag {
    pub(crate) fn new(value: bool) -> Self {
        Self(Arc::new(AtomicBool::new(value)))
    }

    pub(crate) fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl UnlockStateSource for SharedFlag {
    fn is_unlocked(&self) -> bool {
        self.get()
    }
}

impl PrivacyModeSource for SharedFlag {
    fn privacy_mode(&self) -> bool {
        self.get()
    }
}

/// Sending half of the output stream.
///
/// Sends never block, so the mediator task never waits on stdout.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    tx: mpsc::UnboundedSender<OutputLine>,
}

impl Emitter {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<OutputLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a line. Returns `false` once the writer has gone away.
    pub(crate) fn emit(&self, line: OutputLine) -> bool {
        self.tx.send(line).is_ok()
    }
}

/// Write queued lines to `writer` until every [`Emitter`] is dropped.
///
/// Returns the writer and the number of lines written.
pub(crate) async fn write_lines<W>(
    mut rx: mpsc::UnboundedReceiver<OutputLine>,
    mut writer: W,
) -> std::io::Result<(W, usize)>
where
    W: AsyncWrite + Unpin,
{
    let mut written: usize = 0;
    while let Some(line) = rx.recv().await {
        let mut text = serde_json::to_string(&line)?;
        text.push('\n');
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        written = written.saturating_add(1);
    }
    Ok((writer, written))
}

/// Transport that writes `message` lines.
#[derive(Debug, Clone)]
pub(crate) struct LineTransport(pub(crate) Emitter);

impl Transport for LineTransport {
    fn send(&self, message: OutboundMessage, target: Target) -> ApprovalResult<()> {
        if self.0.emit(OutputLine::Message { target, message }) {
            Ok(())
        } else {
            Err(ApprovalError::Transport("output stream closed".to_owned()))
        }
    }
}

/// Popup that writes `popup` lines for the host UI.
#[derive(Debug, Clone)]
pub(crate) struct LinePopup(pub(crate) Emitter);

impl Popup for LinePopup {
    fn open(&self) {
        self.0.emit(OutputLine::Popup { open: true });
    }

    fn close(&self) {
        self.0.emit(OutputLine::Popup { open: false });
    }
}

/// Notifier that writes `public-state-changed` lines.
#[derive(Debug, Clone)]
pub(crate) struct LineNotifier(pub(crate) Emitter);

impl PublicStateNotifier for LineNotifier {
    fn notify_changed(&self) {
        self.0.emit(OutputLine::PublicStateChanged);
    }
}
