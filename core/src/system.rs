//! # System Flag Source
//!
//! The real [`FlagSource`]: derives connectivity flags for a target from the
//! host's network interfaces and turns interface churn into flags-changed
//! events via a low-frequency polling thread.
//!
//! This is an approximation of what a native reachability facility reports.
//! It does not resolve host names and does not consult routing tables beyond
//! "is there a viable egress interface"; named hosts are therefore evaluated
//! like the default route. Good enough for the flags the classifier cares
//! about, and entirely dependency-free at runtime.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::{debug, trace};

use reachr_common::error::{QueryError, ResolveError, SubscribeError};
use reachr_common::flags::RawFlags;
use reachr_common::target::Target;

use crate::source::{EventSink, FlagSource, SubscriptionId, TargetHandle};

/// How often the poll thread re-snapshots the interfaces.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// [`FlagSource`] backed by the host's network interfaces.
pub struct SystemFlagSource {
    next_id: AtomicU64,
    /// Stop flag per live poll thread, keyed by subscription id.
    watchers: Mutex<HashMap<u64, Arc<AtomicBool>>>,
}

impl SystemFlagSource {
    pub fn new() -> Arc<Self> {
        Arc::new(SystemFlagSource {
            next_id: AtomicU64::new(1),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    fn snapshot(&self, target: &Target) -> RawFlags {
        flags_for(target, &datalink::interfaces())
    }
}

impl FlagSource for SystemFlagSource {
    fn resolve(&self, target: &Target) -> Result<TargetHandle, ResolveError> {
        // Every target kind is evaluatable against the interface table; only
        // a LocalWiFi watch on a machine with no wireless hardware at all is
        // hopeless enough to refuse up front.
        if matches!(target, Target::LocalWiFi)
            && !datalink::interfaces().iter().any(|i| is_wireless(i))
        {
            return Err(ResolveError::Unsupported {
                target: target.to_string(),
            });
        }
        Ok(TargetHandle::new(target.clone()))
    }

    fn query(&self, handle: &TargetHandle) -> Result<RawFlags, QueryError> {
        let flags = self.snapshot(handle.target());
        trace!(watching = %handle.target(), %flags, "interface snapshot");
        Ok(flags)
    }

    fn subscribe(
        &self,
        handle: &TargetHandle,
        sink: EventSink,
    ) -> Result<SubscriptionId, SubscribeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stop = Arc::new(AtomicBool::new(false));

        let target = handle.target().clone();
        let thread_stop = Arc::clone(&stop);

        let spawned = thread::Builder::new()
            .name(format!("reachr-poll-{id}"))
            .spawn(move || {
                let mut last = flags_for(&target, &datalink::interfaces());
                while !thread_stop.load(Ordering::Relaxed) {
                    thread::sleep(POLL_INTERVAL);
                    if thread_stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let current = flags_for(&target, &datalink::interfaces());
                    if current != last {
                        debug!(watching = %target, from = %last, to = %current, "flags changed");
                        last = current;
                        sink();
                    }
                }
            });

        if spawned.is_err() {
            return Err(SubscribeError::new("could not spawn poll thread"));
        }

        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, stop);

        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        // Signal only. The poll thread exits on its next tick; joining here
        // would deadlock when unsubscribe runs on the poll thread itself
        // (a handler stopping its own monitor).
        let stop = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0);
        if let Some(stop) = stop {
            stop.store(true, Ordering::Relaxed);
        }
    }

    fn supports_wwan(&self) -> bool {
        datalink::interfaces().iter().any(|i| is_wwan(i))
    }
}

/// Derives the flag word for a target from an interface table.
fn flags_for(target: &Target, interfaces: &[NetworkInterface]) -> RawFlags {
    match target {
        Target::LocalWiFi => local_wifi_flags(interfaces),
        // Every other target normalizes to its sentinel endpoint; named
        // hosts have none (resolution is out of our hands) and come down to
        // "is there any egress path", same as the zero address.
        other => match other.endpoint() {
            Some(endpoint) => address_flags(*endpoint.ip(), interfaces),
            None => egress_flags(interfaces),
        },
    }
}

fn egress_flags(interfaces: &[NetworkInterface]) -> RawFlags {
    let Some(egress) = best_egress(interfaces) else {
        return RawFlags::EMPTY;
    };

    let mut flags = RawFlags::REACHABLE;
    if is_wwan(egress) {
        flags |= RawFlags::IS_WWAN;
        if egress.is_point_to_point() {
            flags |= RawFlags::TRANSIENT_CONNECTION;
        }
    }
    flags
}

fn address_flags(addr: Ipv4Addr, interfaces: &[NetworkInterface]) -> RawFlags {
    // Zero address is the default-route sentinel even when it arrives as a
    // plain Address target.
    if addr.is_unspecified() {
        return egress_flags(interfaces);
    }

    let mut flags = RawFlags::EMPTY;

    for iface in viable(interfaces) {
        for net in &iface.ips {
            let IpNetwork::V4(v4) = net else { continue };
            if v4.ip() == addr {
                flags |= RawFlags::REACHABLE | RawFlags::IS_LOCAL_ADDRESS;
            } else if v4.contains(addr) {
                flags |= RawFlags::REACHABLE | RawFlags::IS_DIRECT;
            }
        }
    }

    if !flags.is_empty() {
        return flags;
    }

    // Not on any local segment: reachable iff something can route it out.
    egress_flags(interfaces)
}

fn local_wifi_flags(interfaces: &[NetworkInterface]) -> RawFlags {
    let has_wifi = viable(interfaces)
        .any(|iface| is_wireless(iface) && iface.ips.iter().any(|net| net.is_ipv4()));

    if has_wifi {
        RawFlags::REACHABLE | RawFlags::IS_DIRECT
    } else {
        RawFlags::EMPTY
    }
}

/// Up, non-loopback interfaces that carry at least one address.
fn viable(interfaces: &[NetworkInterface]) -> impl Iterator<Item = &NetworkInterface> {
    interfaces
        .iter()
        .filter(|i| i.is_up() && !i.is_loopback() && !i.ips.is_empty())
}

fn best_egress(interfaces: &[NetworkInterface]) -> Option<&NetworkInterface> {
    // Prefer non-cellular egress when both are up, matching how platforms
    // report transport for multi-homed devices.
    let mut cellular = None;
    for iface in viable(interfaces) {
        let routable = iface.ips.iter().any(|net| match net {
            IpNetwork::V4(v4) => !v4.ip().is_link_local(),
            IpNetwork::V6(_) => false,
        });
        if !routable {
            continue;
        }
        if is_wwan(iface) {
            cellular.get_or_insert(iface);
        } else {
            return Some(iface);
        }
    }
    cellular
}

/// Cellular interfaces are recognized by conventional names.
fn is_wwan(interface: &NetworkInterface) -> bool {
    let name = interface.name.as_str();
    ["wwan", "rmnet", "ppp", "wwp"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

#[cfg(target_os = "linux")]
fn is_wireless(interface: &NetworkInterface) -> bool {
    std::path::Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
}

#[cfg(target_os = "macos")]
fn is_wireless(interface: &NetworkInterface) -> bool {
    macos_impl::wireless_devices().contains(&interface.name)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn is_wireless(interface: &NetworkInterface) -> bool {
    let name = interface.name.as_str();
    ["wlan", "wlp", "wifi", "ath"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    /// Device names of Wi-Fi hardware ports, resolved once per process.
    pub fn wireless_devices() -> &'static HashSet<String> {
        static DEVICES: OnceLock<HashSet<String>> = OnceLock::new();

        DEVICES.get_or_init(|| {
            let mut devices = HashSet::new();
            let Ok(output) = Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()
            else {
                return devices;
            };

            let stdout = String::from_utf8_lossy(&output.stdout);
            let mut in_wifi_port = false;
            for line in stdout.lines() {
                if let Some(port) = line.strip_prefix("Hardware Port: ") {
                    in_wifi_port = port.contains("Wi-Fi") || port.contains("AirPort");
                } else if let Some(device) = line.strip_prefix("Device: ") {
                    if in_wifi_port {
                        devices.insert(device.trim().to_string());
                    }
                }
            }
            devices
        })
    }
}
