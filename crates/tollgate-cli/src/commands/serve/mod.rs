//! `tollgate serve`: drive the mediator from JSON lines.

mod host;
mod protocol;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tollgate_approval::{
    Mediator, MediatorHandle, Popup, PrivacyModeSource, PublicStateNotifier, Transport,
    UnlockStateSource,
};
use tollgate_config::Config;
use tracing::{debug, info, warn};

use crate::config_bridge;
use host::{Emitter, LineNotifier, LinePopup, LineTransport, SharedFlag, write_lines};
use protocol::{Control, InputLine, OutputLine, Skipped, parse_line};

/// Command-line overrides for the `[wallet]` section.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ServeOverrides {
    pub(crate) privacy_mode: Option<bool>,
    pub(crate) unlocked: bool,
}

/// Counters reported when input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ServeStats {
    pub(crate) lines: usize,
    pub(crate) ignored: usize,
    pub(crate) written: usize,
}

/// Serve over the process's stdin and stdout.
pub(crate) async fn run_stdio(config: &Config, overrides: ServeOverrides) -> Result<ServeStats> {
    let stdin = BufReader::new(tokio::io::stdin());
    let (_, stats) = serve(config, overrides, stdin, tokio::io::stdout()).await?;
    Ok(stats)
}

struct Wallet {
    unlocked: SharedFlag,
    privacy: SharedFlag,
}

/// Run the mediator until `reader` reaches end of input.
///
/// Returns the writer once every queued output line has been flushed.
pub(crate) async fn serve<R, W>(
    config: &Config,
    overrides: ServeOverrides,
    reader: R,
    writer: W,
) -> Result<(W, ServeStats)>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let wallet = Wallet {
        unlocked: SharedFlag::new(overrides.unlocked || config.wallet.start_unlocked),
        privacy: SharedFlag::new(overrides.privacy_mode.unwrap_or(config.wallet.privacy_mode)),
    };
    let policy = config_bridge::to_duplicate_policy(config);
    info!(
        privacy_mode = wallet.privacy.get(),
        unlocked = wallet.unlocked.get(),
        duplicate_policy = %policy,
        "starting mediator"
    );

    let (emitter, rx) = Emitter::channel();
    let writer_task = tokio::spawn(write_lines(rx, writer));

    let mediator = Mediator::builder()
        .unlock_state(Arc::new(wallet.unlocked.clone()) as Arc<dyn UnlockStateSource>)
        .privacy_mode(Arc::new(wallet.privacy.clone()) as Arc<dyn PrivacyModeSource>)
        .popup(Arc::new(LinePopup(emitter.clone())) as Arc<dyn Popup>)
        .transport(Arc::new(LineTransport(emitter.clone())) as Arc<dyn Transport>)
        .notifier(Arc::new(LineNotifier(emitter.clone())) as Arc<dyn PublicStateNotifier>)
        .duplicate_policy(policy)
        .build()?;
    let (handle, actor) = tollgate_approval::spawn(mediator, config.mediator.mailbox_capacity);

    let mut stats = ServeStats::default();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        stats.lines = stats.lines.saturating_add(1);
        match parse_line(&line) {
            Ok(input) => apply(&handle, &wallet, &emitter, input).await?,
            Err(Skipped::Blank) => {},
            Err(Skipped::Invalid(reason)) => {
                debug!(line = stats.lines, "ignoring input line: {reason}");
                stats.ignored = stats.ignored.saturating_add(1);
            },
        }
    }

    drop(handle);
    actor.await.context("mediator task failed")?;
    drop(emitter);
    let (writer, written) = writer_task
        .await
        .context("output task failed")?
        .context("failed to write output")?;
    stats.written = written;
    Ok((writer, stats))
}

async fn apply(
    handle: &MediatorHandle,
    wallet: &Wallet,
    emitter: &Emitter,
    input: InputLine,
) -> Result<()> {
    match input {
        InputLine::Page(message) => {
            let action = message.action();
            let transition = handle.inbound(message).await?;
            debug!(action, ?transition, "page message applied");
        },
        InputLine::Control(control) => apply_control(handle, wallet, emitter, control).await?,
    }
    Ok(())
}

async fn apply_control(
    handle: &MediatorHandle,
    wallet: &Wallet,
    emitter: &Emitter,
    control: Control,
) -> Result<()> {
    match control {
        Control::Approve { origin } => {
            handle.approve(origin).await?;
        },
        Control::Reject { origin } => {
            handle.reject(origin).await?;
        },
        Control::Lock => {
            wallet.unlocked.set(false);
            handle.lock().await?;
        },
        Control::Unlock => {
            wallet.unlocked.set(true);
            info!("wallet unlocked");
        },
        Control::SetPrivacy { enabled } => {
            wallet.privacy.set(enabled);
            info!(enabled, "privacy mode changed");
        },
        Control::Clear => {
            handle.clear_approved_origins().await?;
        },
        Control::Pending => {
            let requests = handle.pending().await?;
            if !emitter.emit(OutputLine::Pending { requests }) {
                warn!("output stream closed, dropping pending list");
            }
        },
    }
    Ok(())
}
