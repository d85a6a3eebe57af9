//! Run command implementation

use super::render::render_snapshot;
use crate::config::Config;
use crate::pipeline::{Pipeline, Poller, SnapshotStore};
use chrono::Utc;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Print snapshots as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Skip all network requests and use fallback values
    #[arg(long)]
    pub offline: bool,

    /// Display currency
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let pipeline = Arc::new(Pipeline::new(config, super::transport(config, self.offline)?));
        let store = Arc::new(SnapshotStore::new(pipeline.bootstrap()));

        let mut poller = Poller::new(
            pipeline,
            store,
            Duration::from_secs(config.pipeline.poll_interval_secs),
        );
        if let Some(cycles) = self.cycles {
            poller = poller.with_max_cycles(cycles);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received");
                let _ = shutdown_tx.send(true);
            }
        });

        let (handle, mut snapshots) = poller.spawn(shutdown_rx);

        while let Some(snapshot) = snapshots.recv().await {
            if self.json {
                println!("{}", serde_json::to_string(snapshot.as_ref())?);
            } else {
                println!("{}\n", render_snapshot(&snapshot, &self.currency, Utc::now()));
            }
        }

        handle.await?;
        Ok(())
    }
}
