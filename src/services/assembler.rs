//! Final shaping of a validated plan.
//!
//! Day labels proposed by the model are always discarded. Position `i` of the generated
//! sequence becomes weekday `i` (Monday first) for weekly plans, and a daily plan keeps
//! only its first day under a fixed marker. Ordering-sensitive data is never taken from
//! the model's own day naming.

use crate::error::IncompletePlan;
use crate::models::{MealDay, PlanHorizon, WorkoutDay};

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A day entry whose label the assembler owns.
pub trait PlanDay {
    fn set_label(&mut self, label: &str);
}

impl PlanDay for MealDay {
    fn set_label(&mut self, label: &str) {
        self.day = label.to_string();
    }
}

impl PlanDay for WorkoutDay {
    fn set_label(&mut self, label: &str) {
        self.day = label.to_string();
    }
}

pub fn assemble<D: PlanDay>(
    mut days: Vec<D>,
    horizon: PlanHorizon,
    today_label: &str,
) -> Result<Vec<D>, IncompletePlan> {
    let requested = horizon.day_count();
    if days.len() < requested {
        return Err(IncompletePlan {
            requested,
            generated: days.len(),
        });
    }

    if days.len() > requested {
        log::debug!("✂️ Dropping {} extra generated day(s)", days.len() - requested);
        days.truncate(requested);
    }

    match horizon {
        PlanHorizon::Daily => {
            for day in &mut days {
                day.set_label(today_label);
            }
        }
        PlanHorizon::Weekly => {
            for (day, label) in days.iter_mut().zip(WEEKDAYS) {
                day.set_label(label);
            }
        }
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Meals;

    fn meal_day(label: &str) -> MealDay {
        MealDay {
            day: label.to_string(),
            meals: Meals {
                breakfast: format!("{} breakfast", label),
                lunch: "lunch".into(),
                dinner: "dinner".into(),
                snacks: vec!["fruit".into()],
            },
        }
    }

    fn generated(labels: &[&str]) -> Vec<MealDay> {
        labels.iter().map(|label| meal_day(label)).collect()
    }

    #[test]
    fn test_weekly_labels_replace_model_labels_in_order() {
        let days = generated(&["Domingo", "Day 2", "", "Friday", "x", "y", "Monday"]);
        let plan = assemble(days, PlanHorizon::Weekly, "Today's plan").unwrap();

        let labels: Vec<&str> = plan.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, WEEKDAYS);
        assert_eq!(plan[0].meals.breakfast, "Domingo breakfast");
        assert_eq!(plan[6].meals.breakfast, "Monday breakfast");
    }

    #[test]
    fn test_weekly_drops_extra_days() {
        let days = generated(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let plan = assemble(days, PlanHorizon::Weekly, "Today's plan").unwrap();

        assert_eq!(plan.len(), 7);
        assert_eq!(plan[6].day, "Sunday");
        assert_eq!(plan[6].meals.breakfast, "7 breakfast");
    }

    #[test]
    fn test_weekly_shortfall_is_incomplete() {
        let err = assemble(generated(&["1", "2", "3", "4", "5"]), PlanHorizon::Weekly, "Today's plan").unwrap_err();
        assert_eq!(
            err,
            IncompletePlan {
                requested: 7,
                generated: 5
            }
        );
    }

    #[test]
    fn test_daily_keeps_first_day_only() {
        let plan = assemble(generated(&["Segunda", "Terça"]), PlanHorizon::Daily, "Today's plan").unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].day, "Today's plan");
        assert_eq!(plan[0].meals.breakfast, "Segunda breakfast");
    }

    #[test]
    fn test_daily_with_nothing_generated() {
        let err = assemble(Vec::<MealDay>::new(), PlanHorizon::Daily, "Today's plan").unwrap_err();
        assert_eq!(err.generated, 0);
        assert_eq!(err.requested, 1);
    }

    #[test]
    fn test_workout_days_are_relabeled() {
        let days = vec![WorkoutDay {
            day: "Leg day".into(),
            exercises: Vec::new(),
        }];
        let plan = assemble(days, PlanHorizon::Daily, "Today's workout").unwrap();
        assert_eq!(plan[0].day, "Today's workout");
    }
}
