use serde::{de, Deserialize, Deserializer, Serialize};

/// Nutrition estimate for one photographed meal. Every numeric field is finite and >= 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEstimate {
    pub food: String,
    pub quantity_grams: f64,
    pub protein_g: f64,
    pub fiber_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub calories: f64,
    pub vitamins: String,
    pub minerals: String,
    pub amino_acids: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanHorizon {
    Daily,
    Weekly,
}

impl PlanHorizon {
    pub fn day_count(self) -> usize {
        match self {
            PlanHorizon::Daily => 1,
            PlanHorizon::Weekly => 7,
        }
    }
}

impl std::fmt::Display for PlanHorizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanHorizon::Daily => "daily",
            PlanHorizon::Weekly => "weekly",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Meal,
    Workout,
}

impl PlanKind {
    /// Fixed label given to the single day of a daily plan.
    pub fn today_label(self) -> &'static str {
        match self {
            PlanKind::Meal => "Today's plan",
            PlanKind::Workout => "Today's workout",
        }
    }
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanKind::Meal => "meal",
            PlanKind::Workout => "workout",
        };
        write!(f, "{}", s)
    }
}

/// Health questionnaire answers. The web form stores numbers as strings, so numeric
/// fields accept both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub age: f64,
    #[serde(alias = "height", deserialize_with = "number_or_numeric_string")]
    pub height_cm: f64,
    #[serde(alias = "weight", deserialize_with = "number_or_numeric_string")]
    pub weight_kg: f64,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub diet: String,
    #[serde(default)]
    pub diet_other: String,
    #[serde(default)]
    pub main_goal: String,
    #[serde(default)]
    pub exercise_frequency: String,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub health_condition_other: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub meals_per_day: String,
    #[serde(default)]
    pub allergies: String,
}

impl UserProfile {
    /// Range checks applied at the request boundary.
    pub fn validate(&self) -> Result<(), String> {
        check_range("age", self.age, 130.0)?;
        check_range("height", self.height_cm, 300.0)?;
        check_range("weight", self.weight_kg, 700.0)?;
        Ok(())
    }

    /// Selected conditions plus the free-text "other" answer, blanks removed.
    pub fn conditions(&self) -> Vec<String> {
        self.health_conditions
            .iter()
            .chain(std::iter::once(&self.health_condition_other))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("other"))
            .map(str::to_string)
            .collect()
    }

    /// Diet answer, preferring the free-text value when "other" was picked.
    pub fn diet_description(&self) -> &str {
        if self.diet.trim().eq_ignore_ascii_case("other") && !self.diet_other.trim().is_empty() {
            self.diet_other.trim()
        } else {
            self.diet.trim()
        }
    }
}

fn check_range(field: &str, value: f64, max: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(format!("{} must be between 0 and {}", field, max))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meals {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
    pub snacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealDay {
    pub day: String,
    pub meals: Meals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub description: String,
    pub sets: String,
    pub reps: String,
    pub image_url: String,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutDay {
    pub day: String,
    pub exercises: Vec<Exercise>,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got '{}'", s))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
