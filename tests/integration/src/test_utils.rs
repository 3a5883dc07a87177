//! Shared fixtures for router integration tests

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, Once, PoisonError};
use tidelink_core::{ManualClock, RouterConfig};
use tidelink_router::{
    AcousticFrame, Announce, CommandBatch, CommandQueue, Forwarder, InMemoryCommandQueue,
    NavigationState, Observation, RecordingDispatcher, Router, StaticIdentityResolver, SystemId,
};

static LOGGING: Once = Once::new();

/// Install a test subscriber once per process; honours `RUST_LOG`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fleet of `size` vehicles named `auv-<n>` with system id `20 + n`.
pub fn fleet_resolver(size: u16) -> StaticIdentityResolver {
    let mut resolver = StaticIdentityResolver::new();
    for n in 0..size {
        resolver.insert(&vehicle_name(n), vehicle_id(n));
    }
    resolver
}

/// Display name of fleet vehicle `n`.
pub fn vehicle_name(n: u16) -> String {
    format!("auv-{n}")
}

/// System id of fleet vehicle `n`.
pub fn vehicle_id(n: u16) -> SystemId {
    20 + n
}

/// Router, forwarder and instrumented collaborators sharing one clock.
pub struct TestNode {
    pub router: Arc<Router>,
    pub forwarder: Arc<Forwarder>,
    pub queue: Arc<InMemoryCommandQueue>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub clock: Arc<ManualClock>,
}

impl TestNode {
    /// Node with default windows over a fleet of `size` vehicles, clock at zero.
    pub fn new(size: u16) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::new(0.0));
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let queue = Arc::new(InMemoryCommandQueue::new());
        let router = Arc::new(Router::new(
            &RouterConfig::default(),
            Arc::new(fleet_resolver(size)),
            dispatcher.clone(),
            clock.clone(),
        ));
        let forwarder = Arc::new(Forwarder::new(router.clone(), queue.clone()));
        Self { router, forwarder, queue, dispatcher, clock }
    }
}

/// Wireless announce from fleet vehicle `n` at `timestamp`.
pub fn announce(n: u16, timestamp: f64) -> Observation {
    Observation::Announce(Announce {
        sys_name: vehicle_name(n),
        source: vehicle_id(n),
        lat: 0.7188,
        lon: -0.1526,
        services: format!("imc+udp://10.0.10.{}:6002/", vehicle_id(n)),
        timestamp,
    })
}

/// Acoustic frame from fleet vehicle `n` received at `timestamp`.
pub fn acoustic_frame(n: u16, timestamp: f64) -> Observation {
    Observation::AcousticFrame(AcousticFrame {
        sys_src: vehicle_name(n),
        sys_dst: "base".to_string(),
        timestamp,
        data: vec![0x54, 0x01],
    })
}

/// Navigation update from fleet vehicle `n`.
pub fn navigation(n: u16, depth: f32) -> Observation {
    Observation::Navigation(NavigationState {
        source: vehicle_id(n),
        lat: 0.7188,
        lon: -0.1526,
        depth,
        heading: 0.0,
        timestamp: 0.0,
    })
}

/// Command queue whose polls block until the test releases them.
///
/// Each poll first reports on `entered`, then waits for one message on
/// `release` before delegating to the inner queue.
pub struct GatedCommandQueue {
    inner: InMemoryCommandQueue,
    entered: Mutex<Sender<SystemId>>,
    release: Mutex<Receiver<()>>,
}

impl GatedCommandQueue {
    /// Gated queue plus the test's ends of the gate.
    pub fn new() -> (Arc<Self>, Receiver<SystemId>, Sender<()>) {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let queue = Arc::new(Self {
            inner: InMemoryCommandQueue::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        (queue, entered_rx, release_tx)
    }

    /// Queue a command on the inner queue.
    pub fn enqueue(&self, destination: SystemId, payload: Vec<u8>) -> u64 {
        self.inner.enqueue(destination, payload)
    }
}

impl CommandQueue for GatedCommandQueue {
    fn poll_pending_commands(&self, destination: SystemId, max_bytes: usize) -> Option<CommandBatch> {
        let _ = self
            .entered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(destination);
        let _ = self.release.lock().unwrap_or_else(PoisonError::into_inner).recv();
        self.inner.poll_pending_commands(destination, max_bytes)
    }
}
