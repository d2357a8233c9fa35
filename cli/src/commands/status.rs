use reachr_common::target::Target;
use reachr_core::monitor::ReachabilityMonitor;
use reachr_core::system::SystemFlagSource;

use crate::terminal::print;

/// One-shot query: resolve, classify once, print, exit.
pub fn status(target: &Target) -> anyhow::Result<()> {
    let source = SystemFlagSource::new();
    let monitor = ReachabilityMonitor::new(target.clone(), source)?;

    monitor.refresh();
    print::status_line(target, monitor.status(), monitor.is_connection_required());

    Ok(())
}
