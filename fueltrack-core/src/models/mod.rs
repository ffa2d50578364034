mod day_plan;
mod macros;
mod meal;
mod profile;
mod section;
mod weight;

pub use day_plan::DayPlan;
pub use macros::Macros;
pub use meal::MealRecord;
pub use profile::{Goal, UserProfile};
pub use section::Section;
pub use weight::WeightRecord;
