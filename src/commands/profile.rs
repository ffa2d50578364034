use clap::{Args, Subcommand};
use fueltrack_core::{DateKey, DocumentStore, Goal, GoalsUpdate, Onboarding, ProfileService};
use std::sync::Arc;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Show the profile
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create the profile, replacing any existing one
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Record age, body measurements and goal
    Onboard {
        #[arg(long)]
        age: u32,

        /// Weight (kg)
        #[arg(long)]
        weight: f64,

        /// Height (cm)
        #[arg(long)]
        height: f64,

        /// Goal (build, lose, maintain)
        #[arg(long)]
        goal: Goal,
    },

    /// Update weight, goal weight or daily calorie goal
    Goals {
        /// Current weight (kg); also added to the weight history
        #[arg(long)]
        weight: Option<f64>,

        /// Goal weight (kg)
        #[arg(long)]
        goal_weight: Option<f64>,

        /// Daily calorie goal (kcal)
        #[arg(long)]
        calories: Option<u32>,
    },
}

impl ProfileCommand {
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let uid = config.user.value.as_str();
        let profiles = ProfileService::new(store);

        match &self.command {
            ProfileSubcommand::Show { format } => {
                let profile = profiles
                    .get_profile(uid)
                    .await?
                    .ok_or_else(|| format!("No profile for '{}'; run `profile create`", uid))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&profile)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", profile);
                        if let Some(last) = profile.weight_history.last() {
                            println!("Last weigh-in: {}", last);
                        }
                    }
                }
                Ok(())
            }
            ProfileSubcommand::Create { email, name } => {
                profiles.create_profile(uid, email, name.as_deref()).await?;
                println!("Created profile for {}", uid);
                Ok(())
            }
            ProfileSubcommand::Onboard {
                age,
                weight,
                height,
                goal,
            } => {
                let onboarding = Onboarding {
                    age: *age,
                    weight: *weight,
                    height: *height,
                    goal: *goal,
                };
                profiles.record_onboarding(uid, &onboarding).await?;
                println!("Saved onboarding details for {}", uid);
                Ok(())
            }
            ProfileSubcommand::Goals {
                weight,
                goal_weight,
                calories,
            } => {
                let update = GoalsUpdate {
                    weight: *weight,
                    goal_weight: *goal_weight,
                    cal_intake_goal: *calories,
                };
                if update.is_empty() {
                    return Err("Nothing to update; pass --weight, --goal-weight or --calories".into());
                }

                profiles.update_goals(uid, &update, DateKey::today()).await?;
                println!("Updated goals for {}", uid);
                Ok(())
            }
        }
    }
}
