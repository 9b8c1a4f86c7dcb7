// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup plus an engine wired to an in-memory store, manual clock, and event channel.

use chrono::{TimeZone, Utc};
use rollout::clock::ManualClock;
use rollout::deploy::{Deployment, Engine, NewDeployment, Outcome};
use rollout::events::{ChannelSink, LifecycleEvent};
use rollout::store::MemoryStore;
use std::sync::{Arc, Once};
use tokio::sync::mpsc::UnboundedReceiver;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rollout=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub type TestEngine = Engine<Arc<MemoryStore>, Arc<ManualClock>>;

/// An engine plus handles to everything it touches.
#[allow(dead_code)]
pub struct Harness {
    pub engine: TestEngine,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub events: UnboundedReceiver<LifecycleEvent>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        ));
        let (sink, events) = ChannelSink::new();
        let engine = Engine::with_clock(store.clone(), clock.clone()).events(sink);
        Self {
            engine,
            store,
            clock,
            events,
        }
    }

    /// Drain every event emitted so far.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Create, start, and complete a deployment successfully.
    pub async fn succeeded(&self, spec: NewDeployment) -> Deployment {
        let created = self.engine.create(spec).await.unwrap();
        self.engine.start(&created.id).await.unwrap();
        self.clock.advance(chrono::Duration::seconds(30));
        self.engine
            .complete(&created.id, Outcome::Success)
            .await
            .unwrap()
    }
}
