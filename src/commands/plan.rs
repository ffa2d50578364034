use clap::{Args, Subcommand};
use fueltrack_core::{
    DateKey, DocumentStore, LoadOutcome, PlanStore, Section, WriteBack, WriteOutcome,
};
use std::sync::Arc;

use super::{date_or_today, FoodArgs, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Show the plan for a day
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a food to a section of the plan
    Add {
        /// Section (breakfast, lunch, dinner, snacks)
        #[arg(long, short)]
        section: Section,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,

        #[command(flatten)]
        food: FoodArgs,
    },

    /// Remove a food from a section by its position
    Remove {
        /// Section (breakfast, lunch, dinner, snacks)
        #[arg(long, short)]
        section: Section,

        /// Position shown by `plan show`
        index: usize,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<DateKey>,
    },
}

impl PlanCommand {
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let uid = config.user.value.as_str();
        let plans = PlanStore::new(store, Some(uid.to_string()));

        match &self.command {
            PlanSubcommand::Show { date, format } => {
                let date = date_or_today(*date);
                let outcome = plans.load_plan_for_date(uid, date).await?;
                let plan = plans.plan_for(date).unwrap_or_default();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&plan)?);
                    }
                    OutputFormat::Text => {
                        println!("Plan for {}", date);
                        if outcome == LoadOutcome::Missing {
                            println!("(no plan saved yet)");
                        }
                        println!();
                        println!("{}", plan);
                    }
                }
                Ok(())
            }
            PlanSubcommand::Add {
                section,
                date,
                food,
            } => {
                let date = date_or_today(*date);
                // The write-back sends the whole section, so the stored
                // section has to be in the cache first.
                plans.load_plan_for_date(uid, date).await?;

                let item = food.to_record(date, *section);
                let name = item.name.clone();
                let write = plans.add_plan_food(date, *section, item)?;
                finish_write(write).await?;

                println!("Added '{}' to {} on {}", name, section, date);
                Ok(())
            }
            PlanSubcommand::Remove {
                section,
                index,
                date,
            } => {
                let date = date_or_today(*date);
                plans.load_plan_for_date(uid, date).await?;

                let write = plans.delete_plan_food(date, *section, *index)?;
                finish_write(write).await?;

                println!("Removed item {} from {} on {}", index, section, date);
                Ok(())
            }
        }
    }
}

/// The process exits after the command, so the write-back is awaited here
/// instead of being left to run in the background.
async fn finish_write(write: WriteBack) -> Result<(), Box<dyn std::error::Error>> {
    if write.wait().await? == WriteOutcome::Skipped {
        tracing::warn!("Plan change was not saved: no user configured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_config;
    use fueltrack_core::{DocPath, MemoryStore};

    fn key(d: u32) -> DateKey {
        DateKey::from_ymd(2024, 3, d).unwrap()
    }

    fn add(name: &str, section: Section) -> PlanCommand {
        PlanCommand {
            command: PlanSubcommand::Add {
                section,
                date: Some(key(4)),
                food: FoodArgs {
                    name: name.to_string(),
                    calories: 250.0,
                    servings: 1.0,
                    protein: None,
                    carbs: None,
                    fats: None,
                },
            },
        }
    }

    async fn stored_names(store: &MemoryStore, section: Section) -> Vec<String> {
        let path = DocPath::meal_plan("u1", &key(4)).unwrap();
        let fields = store.peek(&path).await.unwrap_or_default();
        fields
            .get(section.field_name())
            .and_then(|items| items.as_array().cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(|item| item.get("name").and_then(|n| n.as_str()).map(String::from))
            .collect()
    }

    #[tokio::test]
    async fn test_add_keeps_previously_stored_items() {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();

        add("Eggs", Section::Breakfast)
            .run(store.clone(), &config)
            .await
            .unwrap();
        add("Toast", Section::Breakfast)
            .run(store.clone(), &config)
            .await
            .unwrap();

        assert_eq!(
            stored_names(&store, Section::Breakfast).await,
            vec!["Eggs", "Toast"]
        );
    }

    #[tokio::test]
    async fn test_remove_by_index() {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();

        add("Eggs", Section::Lunch).run(store.clone(), &config).await.unwrap();
        add("Soup", Section::Lunch).run(store.clone(), &config).await.unwrap();

        let remove = PlanCommand {
            command: PlanSubcommand::Remove {
                section: Section::Lunch,
                index: 0,
                date: Some(key(4)),
            },
        };
        remove.run(store.clone(), &config).await.unwrap();

        assert_eq!(stored_names(&store, Section::Lunch).await, vec!["Soup"]);
    }

    #[tokio::test]
    async fn test_remove_out_of_range_fails() {
        let store = Arc::new(MemoryStore::new());
        let remove = PlanCommand {
            command: PlanSubcommand::Remove {
                section: Section::Dinner,
                index: 3,
                date: Some(key(4)),
            },
        };

        assert!(remove.run(store, &test_config()).await.is_err());
    }
}
