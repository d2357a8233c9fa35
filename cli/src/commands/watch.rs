use anyhow::Context;
use tracing::warn;

use reachr_common::target::Target;
use reachr_core::monitor::ReachabilityMonitor;
use reachr_core::system::SystemFlagSource;

use crate::terminal::{print, spinner};

/// Watches a target until Ctrl-C, printing one line per status change.
pub async fn watch(target: Target) -> anyhow::Result<()> {
    let source = SystemFlagSource::new();
    let monitor = ReachabilityMonitor::new(target.clone(), source)?;

    let bar = spinner::watching(&target);

    let changes = bar.clone();
    let change_target = target.clone();
    let attached = monitor.start(move |status, required| {
        changes.suspend(|| print::status_line(&change_target, status, required));
    });

    if !attached {
        warn!("change events unavailable, showing the initial state only");
    }

    bar.suspend(|| print::status_line(&target, monitor.status(), monitor.is_connection_required()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    monitor.stop();
    bar.finish_and_clear();

    Ok(())
}
