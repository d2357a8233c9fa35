//! End-to-end monitor behavior against the scripted mock source.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use reachr_common::error::ConstructionError;
use reachr_common::flags::RawFlags;
use reachr_common::status::ReachabilityStatus;
use reachr_core::monitor::ReachabilityMonitor;
use reachr_integration_tests::MockFlagSource;

fn counted_handler() -> (Arc<AtomicUsize>, impl Fn(ReachabilityStatus, bool) + Send + Sync) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    (calls, move |_, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn default_route_address_reads_wifi() {
    // Address 0.0.0.0 is the default-route form.
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let monitor = ReachabilityMonitor::for_address(
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
        source,
    )
    .unwrap();

    let (calls, handler) = counted_handler();
    assert!(monitor.start(handler));

    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
    assert!(!monitor.is_connection_required());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn host_transitions_to_wwan_once() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY).wwan_capable());
    let monitor =
        ReachabilityMonitor::for_host("example.com", Arc::clone(&source) as _).unwrap();

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    assert!(monitor.start(move |status, required| {
        sink.lock().unwrap().push((status, required));
    }));
    assert_eq!(monitor.status(), ReachabilityStatus::NotReachable);

    source.set_flags(RawFlags::REACHABLE | RawFlags::IS_WWAN);
    source.fire();

    assert_eq!(
        observed.lock().unwrap().as_slice(),
        &[(ReachabilityStatus::ReachableViaWwan, false)]
    );
    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWwan);
}

#[test]
fn local_wifi_reports_connection_required() {
    let flags = RawFlags::REACHABLE | RawFlags::CONNECTION_REQUIRED;
    let source = Arc::new(MockFlagSource::new(flags).wwan_capable());
    let monitor = ReachabilityMonitor::for_local_wifi(source).unwrap();

    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));

    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
    assert!(monitor.is_connection_required());
}

#[test]
fn local_wifi_never_classifies_as_wwan() {
    // Even on a WWAN-capable platform with the WWAN bit set, the local
    // segment target stays on the Wi-Fi arm.
    let flags = RawFlags::REACHABLE | RawFlags::IS_WWAN;
    let source = Arc::new(MockFlagSource::new(flags).wwan_capable());
    let monitor = ReachabilityMonitor::for_local_wifi(source).unwrap();

    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));

    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
}

#[test]
fn empty_host_name_is_a_construction_error() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let result = ReachabilityMonitor::for_host("", source);

    assert!(matches!(result, Err(ConstructionError::EmptyHostName)));
}

#[test]
fn identical_events_deliver_at_most_once() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let (calls, handler) = counted_handler();
    assert!(monitor.start(handler));

    source.set_flags(RawFlags::REACHABLE);
    source.fire();
    source.fire();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn start_then_immediate_stop_never_delivers() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let (calls, handler) = counted_handler();
    assert!(monitor.start(handler));
    monitor.stop();

    assert_eq!(source.live_subscriptions(), 0);

    // A late platform event racing the detach reaches a cleared handler.
    source.set_flags(RawFlags::REACHABLE);
    source.fire_stale();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stopped_monitor_still_stores_classifications() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let (calls, handler) = counted_handler();
    assert!(monitor.start(handler));
    assert_eq!(monitor.status(), ReachabilityStatus::NotReachable);
    monitor.stop();

    source.set_flags(RawFlags::REACHABLE);
    source.fire_stale();

    // Polling stays live without a subscriber.
    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stop_is_idempotent() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let monitor = ReachabilityMonitor::for_internet(source).unwrap();

    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));

    monitor.stop();
    monitor.stop();
    monitor.stop();
}

#[test]
fn failed_query_mid_watch_degrades_to_unknown() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    assert!(monitor.start(move |status, required| {
        sink.lock().unwrap().push((status, required));
    }));
    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);

    source.fail_queries("backend went away");
    source.fire();

    assert_eq!(
        observed.lock().unwrap().as_slice(),
        &[(ReachabilityStatus::Unknown, false)]
    );
    assert!(!monitor.is_connection_required());
}

#[test]
fn refused_subscription_leaves_polling_alive() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE).refusing_subscribe());
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let (calls, handler) = counted_handler();
    assert!(!monitor.start(handler));

    // Seed still happened; manual refresh keeps working.
    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
    source.set_flags(RawFlags::EMPTY);
    monitor.refresh();
    assert_eq!(monitor.status(), ReachabilityStatus::NotReachable);

    // The refresh counts as a change and reaches the handler even in
    // degraded mode; no spontaneous deliveries ever happen though.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn stop_blocks_until_in_flight_delivery_drains() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor =
        Arc::new(ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap());

    let (entered_tx, entered_rx) = mpsc::channel();
    let handler_done = Arc::new(AtomicBool::new(false));

    let done = Arc::clone(&handler_done);
    assert!(monitor.start(move |_, _| {
        entered_tx.send(()).expect("test observer gone");
        thread::sleep(Duration::from_millis(150));
        done.store(true, Ordering::SeqCst);
    }));

    source.set_flags(RawFlags::REACHABLE);
    let delivery_source = Arc::clone(&source);
    let delivery = thread::spawn(move || delivery_source.fire());

    // Wait until the handler is mid-flight, then stop from this thread.
    entered_rx.recv().expect("handler never entered");
    monitor.stop();

    // stop() only returns once the in-flight delivery has drained.
    assert!(handler_done.load(Ordering::SeqCst));

    delivery.join().expect("delivery thread panicked");
}

#[test]
fn refresh_inside_handler_queues_a_second_delivery() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor =
        Arc::new(ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap());

    let depth = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicBool::new(false));
    let observed = Arc::new(Mutex::new(Vec::new()));

    let h_depth = Arc::clone(&depth);
    let h_overlapped = Arc::clone(&overlapped);
    let h_observed = Arc::clone(&observed);
    let h_source = Arc::clone(&source);
    let h_monitor = Arc::clone(&monitor);
    assert!(monitor.start(move |status, required| {
        if h_depth.fetch_add(1, Ordering::SeqCst) > 0 {
            h_overlapped.store(true, Ordering::SeqCst);
        }

        let first = {
            let mut observed = h_observed.lock().unwrap();
            observed.push((status, required));
            observed.len() == 1
        };

        // The first invocation changes the world and re-queries its own
        // monitor before returning.
        if first {
            h_source.set_flags(RawFlags::REACHABLE | RawFlags::CONNECTION_REQUIRED);
            h_monitor.refresh();
        }

        h_depth.fetch_sub(1, Ordering::SeqCst);
    }));

    source.set_flags(RawFlags::REACHABLE);
    source.fire();

    // The inner refresh is delivered after the first invocation returns,
    // never inside it.
    assert!(!overlapped.load(Ordering::SeqCst), "handler invocations overlapped");
    assert_eq!(
        observed.lock().unwrap().as_slice(),
        &[
            (ReachabilityStatus::ReachableViaWiFi, false),
            (ReachabilityStatus::ReachableViaWiFi, true),
        ]
    );
    assert_eq!(monitor.status(), ReachabilityStatus::ReachableViaWiFi);
    assert!(monitor.is_connection_required());
}

#[test]
fn restart_mid_delivery_lets_the_old_handler_finish() {
    let source = Arc::new(MockFlagSource::new(RawFlags::EMPTY));
    let monitor =
        Arc::new(ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap());

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    let first_calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&first_calls);
    assert!(monitor.start(move |_, _| {
        seen.fetch_add(1, Ordering::SeqCst);
        entered_tx.send(()).expect("test observer gone");
        release_rx
            .lock()
            .unwrap()
            .recv()
            .expect("release signal lost");
    }));

    source.set_flags(RawFlags::REACHABLE);
    let delivery_source = Arc::clone(&source);
    let delivery = thread::spawn(move || delivery_source.fire());

    // While the first handler is mid-flight, swap in a replacement.
    entered_rx.recv().expect("handler never entered");
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    assert!(monitor.start(move |status, required| {
        sink.lock().unwrap().push((status, required));
    }));
    release_tx.send(()).expect("handler gone");
    delivery.join().expect("delivery thread panicked");

    // The in-flight invocation ran to completion under the old handler and
    // the replacement saw none of it.
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert!(observed.lock().unwrap().is_empty());

    // The next change reaches only the replacement.
    source.set_flags(RawFlags::REACHABLE | RawFlags::CONNECTION_REQUIRED);
    source.fire();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        observed.lock().unwrap().as_slice(),
        &[(ReachabilityStatus::ReachableViaWiFi, true)]
    );
}

#[test]
fn dropping_the_monitor_detaches() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));
    assert_eq!(source.live_subscriptions(), 1);

    drop(monitor);
    assert_eq!(source.live_subscriptions(), 0);
}

#[test]
fn seed_queries_exactly_once() {
    let source = Arc::new(MockFlagSource::new(RawFlags::REACHABLE));
    let monitor = ReachabilityMonitor::for_internet(Arc::clone(&source) as _).unwrap();

    assert_eq!(source.query_count(), 0);

    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));
    assert_eq!(source.query_count(), 1);

    // Re-start keeps the cached value instead of querying again.
    let (_, handler) = counted_handler();
    assert!(monitor.start(handler));
    assert_eq!(source.query_count(), 1);
}
