use clap::{Args, Subcommand};
use fueltrack_core::{
    group_by_section, DailySummary, DateKey, DocumentStore, MealJournal, MealRecord,
    ProfileService, Section,
};
use serde_json::json;
use std::sync::Arc;

use super::{date_or_today, history_range, FoodArgs, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Log an eaten meal
    Log {
        /// Section (breakfast, lunch, dinner, snacks)
        #[arg(long, short)]
        section: Section,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,

        #[command(flatten)]
        food: FoodArgs,
    },

    /// List logged meals
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

    /// Delete a logged meal by id
    Delete {
        /// Meal id shown by `meal list`
        id: String,
    },

    /// Show one day's meals against the daily goals
    Today {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl MealCommand {
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let uid = config.user.value.as_str();
        let journal = MealJournal::new(Arc::clone(&store));

        match &self.command {
            MealSubcommand::Log {
                section,
                date,
                food,
            } => {
                let record = food.to_record(date_or_today(*date), *section);
                let logged = journal.add_meal(uid, record).await?;

                println!("Logged meal:");
                println!();
                print_meal(&logged);
                Ok(())
            }
            MealSubcommand::List { from, to, format } => {
                let (from, to) = history_range(*from, *to)?;
                let meals = journal.meals_between(uid, from, to).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&meals)?);
                    }
                    OutputFormat::Text => {
                        if meals.is_empty() {
                            println!("No meals logged from {} to {}.", from, to);
                            return Ok(());
                        }
                        for meal in &meals {
                            print_meal(meal);
                            println!();
                        }
                        let total: f64 = meals.iter().map(|m| m.calories).sum();
                        println!("{} meals, {} kcal", meals.len(), total);
                    }
                }
                Ok(())
            }
            MealSubcommand::Delete { id } => {
                journal.delete_meal(uid, id).await?;
                println!("Deleted meal {}", id);
                Ok(())
            }
            MealSubcommand::Today { date, format } => {
                let date = date_or_today(*date);
                let meals = journal.meals_between(uid, date, date).await?;
                let day = group_by_section(&meals, date);

                let profile = ProfileService::new(store).get_profile(uid).await?;
                let goals = match &profile {
                    Some(profile) => config.goals.value.with_profile(profile),
                    None => config.goals.value,
                };
                let summary = DailySummary::new(&day, &goals);

                match format {
                    OutputFormat::Json => {
                        let output = json!({
                            "date": date,
                            "meals": day,
                            "summary": summary,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", date);
                        println!();
                        println!("{}", day);
                        println!();
                        println!("{}", summary);
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_meal(meal: &MealRecord) {
    println!("ID:      {}", meal.id.as_deref().unwrap_or("-"));
    println!("Date:    {}", meal.date);
    println!("Section: {}", meal.section);
    println!("Meal:    {}", meal);
}
