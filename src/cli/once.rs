//! Once command implementation

use super::render::render_snapshot;
use crate::config::Config;
use crate::pipeline::Pipeline;
use chrono::Utc;
use clap::Args;

#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip all network requests and use fallback values
    #[arg(long)]
    pub offline: bool,

    /// Display currency
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

impl OnceArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let pipeline = Pipeline::new(config, super::transport(config, self.offline)?);
        let snapshot = pipeline.cycle(&pipeline.bootstrap()).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!("{}", render_snapshot(&snapshot, &self.currency, Utc::now()));
        }
        Ok(())
    }
}
