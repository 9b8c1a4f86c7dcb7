// ABOUTME: Command module aggregator for the rollout CLI.
// ABOUTME: Holds the shared command context and re-exports lifecycle and query handlers.

mod lifecycle;
mod query;

pub use lifecycle::{
    cancel, complete, create, delete, promote, quick_deploy, quick_rollback, rollback, start,
};
pub use query::{list, show, stats};

use rollout::config::Config;
use rollout::deploy::Engine;
use rollout::error::Result;
use rollout::output::Output;
use rollout::store::FileStore;

/// Everything a command handler needs.
pub struct Context<'a> {
    pub config: Config,
    pub engine: Engine<FileStore>,
    pub output: &'a Output,
}

impl<'a> Context<'a> {
    pub fn open(config: Config, output: &'a Output) -> Result<Self> {
        let store = config.open_store()?;
        tracing::debug!("Using store {}", store.path().display());

        let engine = Engine::new(store)
            .events(config.build_events()?)
            .event_timeout(config.events.timeout);

        Ok(Self {
            config,
            engine,
            output,
        })
    }
}
