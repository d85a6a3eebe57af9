//! Serve command implementation

use crate::config::Config;
use crate::worker::{self, WorkerState};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, overriding `worker.bind`
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let bind = self.bind.as_deref().unwrap_or(&config.worker.bind);
        let state = Arc::new(WorkerState::new(
            config.worker.clone(),
            super::transport(config, false)?,
        ));
        worker::serve(state, bind).await
    }
}
