use colored::*;

use reachr_common::status::ReachabilityStatus;
use reachr_common::target::Target;

/// One status line: `target  status  [connection required]`.
pub fn status_line(target: &Target, status: ReachabilityStatus, connection_required: bool) {
    let rendered = match status {
        ReachabilityStatus::Unknown => "unknown".dimmed(),
        ReachabilityStatus::NotReachable => "not reachable".red().bold(),
        ReachabilityStatus::ReachableViaWiFi => "reachable (wi-fi)".green().bold(),
        ReachabilityStatus::ReachableViaWwan => "reachable (wwan)".green(),
    };

    if connection_required {
        println!(
            "{} {} {}",
            target.to_string().bold(),
            rendered,
            "(connection required)".yellow()
        );
    } else {
        println!("{} {}", target.to_string().bold(), rendered);
    }
}
