use clap::{Args, Subcommand};
use fueltrack_core::{DateKey, DocumentStore, ProfileService};
use std::sync::Arc;

use super::{date_or_today, history_range, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct WeightCommand {
    #[command(subcommand)]
    pub command: WeightSubcommand,
}

#[derive(Subcommand)]
pub enum WeightSubcommand {
    /// Record a weight (kg)
    Add {
        weight: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,
    },

    /// List recorded weights
    List {
        /// Start date (YYYY-MM-DD), defaults to 6 days before --to
        #[arg(long)]
        from: Option<DateKey>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<DateKey>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl WeightCommand {
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let uid = config.user.value.as_str();
        let profiles = ProfileService::new(store);

        match &self.command {
            WeightSubcommand::Add { weight, date } => {
                let record = profiles
                    .add_weight_entry(uid, *weight, date_or_today(*date))
                    .await?;
                println!("Recorded {}", record);
                Ok(())
            }
            WeightSubcommand::List { from, to, format } => {
                let (from, to) = history_range(*from, *to)?;
                let entries = profiles.weight_entries(uid, from, to).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        if entries.is_empty() {
                            println!("No weights recorded from {} to {}.", from, to);
                        }
                        for entry in &entries {
                            println!("{}", entry);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
