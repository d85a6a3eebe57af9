//! Convert command implementation

use super::render::{format_money, provenance_tag};
use crate::config::Config;
use crate::model::units::{value_of, WeightUnit};
use crate::model::Metal;
use crate::pipeline::Pipeline;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Metal to value (gold, silver, platinum, copper)
    #[arg(long)]
    pub metal: Metal,

    /// Amount of metal
    #[arg(long)]
    pub amount: Decimal,

    /// Weight unit (oz, g, kg)
    #[arg(long, default_value = "oz")]
    pub unit: WeightUnit,

    /// Currency for the result
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Skip all network requests and use fallback values
    #[arg(long)]
    pub offline: bool,
}

impl ConvertArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.amount.is_sign_negative() {
            anyhow::bail!("Amount must not be negative: {}", self.amount);
        }

        let pipeline = Pipeline::new(config, super::transport(config, self.offline)?);
        let snapshot = pipeline.cycle(&pipeline.bootstrap()).await;

        let quote = snapshot
            .quote(self.metal)
            .ok_or_else(|| anyhow::anyhow!("{} is not enabled in the pipeline", self.metal))?;

        let currency = self.currency.to_uppercase();
        let usd = value_of(self.amount, self.unit, quote.value.price)
            .ok_or_else(|| anyhow::anyhow!("Amount too large to value: {}", self.amount))?;
        let value = snapshot
            .rates
            .from_usd(usd, &currency)
            .ok_or_else(|| anyhow::anyhow!("No usable exchange rate for {}", currency))?;

        println!(
            "{} {} {} = {}  [{}]",
            self.amount,
            self.unit,
            self.metal,
            format_money(value, &currency, 2),
            provenance_tag(&quote.provenance)
        );
        Ok(())
    }
}
