use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use reachr_common::target::Target;

/// Idle spinner shown while a watch waits for the next change.
pub fn watching(target: &Target) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(format!("watching {target} (ctrl-c to stop)"));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
