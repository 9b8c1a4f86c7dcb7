// ABOUTME: The event sink trait and the built-in sinks.
// ABOUTME: Tracing, channel, null, and fan-out delivery of lifecycle events.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::LifecycleEvent;

/// Errors from delivering an event.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("event receiver closed")]
    Closed,

    #[error("{hook} hook failed with exit code {exit_code:?}: {stderr}")]
    Hook {
        hook: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{failed} of {total} sinks failed: {first}")]
    Partial {
        failed: usize,
        total: usize,
        first: Box<SinkError>,
    },
}

/// Receiver of lifecycle events. Delivery is fire-and-forget for the engine.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError>;
}

/// Logs each event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        tracing::info!(
            event = event.kind.name(),
            deployment_id = %event.deployment_id,
            name = %event.name,
            version = %event.version,
            environment = %event.environment,
            status = %event.status,
            "deployment lifecycle event"
        );
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: &LifecycleEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards events to an in-process receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        self.tx.send(event.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Delivers to several sinks concurrently; one failure does not stop the rest.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for Fanout {
    async fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        let results =
            futures::future::join_all(self.sinks.iter().map(|sink| sink.emit(event))).await;

        let total = results.len();
        let mut errors = results.into_iter().filter_map(Result::err);
        match errors.next() {
            None => Ok(()),
            Some(first) => Err(SinkError::Partial {
                failed: 1 + errors.count(),
                total,
                first: Box::new(first),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::NewDeployment;
    use crate::events::EventKind;
    use crate::types::DeploymentId;
    use chrono::Utc;

    fn event() -> LifecycleEvent {
        let deployment = NewDeployment::new("api", "1.0.0")
            .into_pending(DeploymentId::generate(), Utc::now())
            .unwrap();
        LifecycleEvent::new(EventKind::Created, &deployment, Utc::now())
    }

    #[tokio::test]
    async fn channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();
        let sent = event();
        sink.emit(&sent).await.unwrap();
        assert_eq!(rx.recv().await, Some(sent));
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(sink.emit(&event()).await, Err(SinkError::Closed)));
    }

    #[tokio::test]
    async fn fanout_delivers_past_a_failing_sink() {
        let (closed, rx) = ChannelSink::new();
        drop(rx);
        let (open, mut open_rx) = ChannelSink::new();

        let fanout = Fanout::new().with(closed).with(TracingSink).with(open);
        let err = fanout.emit(&event()).await.unwrap_err();

        assert!(matches!(
            err,
            SinkError::Partial {
                failed: 1,
                total: 3,
                ..
            }
        ));
        assert!(open_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn empty_fanout_succeeds() {
        assert!(Fanout::new().emit(&event()).await.is_ok());
    }
}
