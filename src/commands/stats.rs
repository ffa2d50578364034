use clap::Args;
use fueltrack_core::{
    DateKey, DocumentStore, Granularity, ReportWindow, StatsBucketSet, StatsService, WeightSeries,
};
use std::sync::Arc;

use super::{date_or_today, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct StatsCommand {
    /// Reporting period (week, month, year)
    #[arg(long, short, default_value = "week")]
    pub period: Granularity,

    /// Last day of the report (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub today: Option<DateKey>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl StatsCommand {
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let window = ReportWindow::ending_on(self.period, date_or_today(self.today));
        let report = StatsService::new(store)
            .report(&config.user.value, &window)
            .await?;

        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "window": window,
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                println!(
                    "Stats for the {} {} to {}",
                    window.granularity, window.start, window.end
                );
                println!();
                print!("{}", render_table(&report));
                println!();
                println!("Average: {} kcal", report.average_calories);
                print_weights(&report.weight);
            }
        }
        Ok(())
    }
}

/// One row per bucket: label, calories, then protein/carbs/fats grams.
fn render_table(report: &StatsBucketSet) -> String {
    let width = report.labels.iter().map(String::len).max().unwrap_or(0);
    let mut out = String::new();

    for ((label, calories), macros) in report
        .labels
        .iter()
        .zip(&report.calories)
        .zip(&report.macros)
    {
        out.push_str(&format!(
            "{:<width$}  {:>6.0} kcal  P {:>4.0}g  C {:>4.0}g  F {:>4.0}g\n",
            label,
            calories,
            macros.protein,
            macros.carbs,
            macros.fats,
            width = width
        ));
    }
    out
}

fn print_weights(weight: &WeightSeries) {
    if weight.is_empty() {
        println!("No weights recorded in this period.");
        return;
    }

    match weight {
        WeightSeries::Daily(slots) => {
            let known: Vec<f64> = slots.iter().flatten().copied().collect();
            if let (Some(first), Some(last)) = (known.first(), known.last()) {
                println!("Weight: {} kg -> {} kg", first, last);
            }
        }
        WeightSeries::Samples(samples) => {
            println!("Weights:");
            for sample in samples {
                println!("  {}", sample);
            }
        }
    }
}
