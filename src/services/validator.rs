//! Checks extracted model output against the response contracts and normalizes it.
//!
//! Required fields that are absent or fail coercion are collected into one
//! [`SchemaViolation`] so the log line shows every problem at once.

use serde_json::Value;

use crate::error::SchemaViolation;
use crate::models::{Exercise, MealDay, Meals, NutritionEstimate, WorkoutDay};
use crate::services::extractor::JsonObject;

const MAX_INSTRUCTIONS: usize = 5;

/// Optional numeric fields of a nutrition estimate: output name, then accepted keys.
const NUTRIENT_FIELDS: [(&str, &[&str]); 5] = [
    ("proteinG", &["proteinG", "protein", "protein_g"]),
    ("fiberG", &["fiberG", "fiber", "fiber_g", "fibre"]),
    ("carbsG", &["carbsG", "carbs", "carbs_g", "carbohydrates"]),
    ("fatG", &["fatG", "fat", "fat_g"]),
    ("calories", &["calories", "kcal", "energy"]),
];

pub fn validate_nutrition(object: &JsonObject) -> Result<NutritionEstimate, SchemaViolation> {
    let mut violation = SchemaViolation::default();

    let food = required_text(object, &["food", "dish", "name"], "food", &mut violation);
    let quantity_grams = match lookup(object, &["quantityGrams", "quantity", "quantity_grams", "weightGrams"]) {
        Some(value) => coerce_number(value).unwrap_or_else(|| {
            violation.invalid("quantityGrams");
            0.0
        }),
        None => {
            violation.missing("quantityGrams");
            0.0
        }
    };

    let mut nutrients = [0.0; NUTRIENT_FIELDS.len()];
    for (slot, (name, keys)) in nutrients.iter_mut().zip(NUTRIENT_FIELDS) {
        if let Some(value) = lookup(object, keys) {
            match coerce_number(value) {
                Some(n) => *slot = n,
                None => violation.invalid(name),
            }
        }
    }
    let [protein_g, fiber_g, carbs_g, fat_g, calories] = nutrients;

    let vitamins = optional_text(object, &["vitamins"], "vitamins", &mut violation);
    let minerals = optional_text(object, &["minerals"], "minerals", &mut violation);
    let amino_acids = optional_text(
        object,
        &["aminoAcids", "aminoacids", "amino_acids"],
        "aminoAcids",
        &mut violation,
    );

    violation.into_result(NutritionEstimate {
        food,
        quantity_grams,
        protein_g,
        fiber_g,
        carbs_g,
        fat_g,
        calories,
        vitamins,
        minerals,
        amino_acids,
    })
}

/// Validates `{ "plan": [ { "day", "meals": { breakfast, lunch, dinner, snacks } } ] }`.
///
/// Day objects without the `meals` wrapper are read flat. Day labels are kept as
/// generated; the assembler replaces them. Only the first `limit` days are checked.
pub fn validate_meal_plan(object: &JsonObject, limit: usize) -> Result<Vec<MealDay>, SchemaViolation> {
    let mut violation = SchemaViolation::default();
    let mut days = Vec::new();

    for (index, day) in plan_days(object, limit, &mut violation).iter().enumerate() {
        let path = format!("plan[{}]", index);
        let Some(day) = day.as_object() else {
            violation.invalid(path);
            continue;
        };

        let (meals, meals_path) = match day.get("meals") {
            Some(Value::Object(meals)) => (meals, format!("{}.meals", path)),
            Some(_) => {
                violation.invalid(format!("{}.meals", path));
                continue;
            }
            None => (day, path.clone()),
        };

        let breakfast = required_text(meals, &["breakfast"], &format!("{}.breakfast", meals_path), &mut violation);
        let lunch = required_text(meals, &["lunch"], &format!("{}.lunch", meals_path), &mut violation);
        let dinner = required_text(meals, &["dinner"], &format!("{}.dinner", meals_path), &mut violation);
        let snacks = required_list(meals, &["snacks", "snack"], &format!("{}.snacks", meals_path), &mut violation);

        days.push(MealDay {
            day: label_of(day),
            meals: Meals {
                breakfast,
                lunch,
                dinner,
                snacks,
            },
        });
    }

    violation.into_result(days)
}

/// Validates `{ "plan": [ { "day", "exercises": [ Exercise ] } ] }`, first `limit` days only.
pub fn validate_workout_plan(object: &JsonObject, limit: usize) -> Result<Vec<WorkoutDay>, SchemaViolation> {
    let mut violation = SchemaViolation::default();
    let mut days = Vec::new();

    for (index, day) in plan_days(object, limit, &mut violation).iter().enumerate() {
        let path = format!("plan[{}]", index);
        let Some(day) = day.as_object() else {
            violation.invalid(path);
            continue;
        };

        let exercises_path = format!("{}.exercises", path);
        let entries = match lookup(day, &["exercises"]) {
            Some(Value::Array(entries)) if !entries.is_empty() => entries.as_slice(),
            Some(_) => {
                violation.invalid(exercises_path);
                continue;
            }
            None => {
                violation.missing(exercises_path);
                continue;
            }
        };

        let mut exercises = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let entry_path = format!("{}[{}]", exercises_path, position);
            let Some(entry) = entry.as_object() else {
                violation.invalid(entry_path);
                continue;
            };
            exercises.push(validate_exercise(entry, &entry_path, &mut violation));
        }

        days.push(WorkoutDay {
            day: label_of(day),
            exercises,
        });
    }

    violation.into_result(days)
}

fn validate_exercise(entry: &JsonObject, path: &str, violation: &mut SchemaViolation) -> Exercise {
    let field = |name: &str| format!("{}.{}", path, name);

    let mut instructions = required_list(entry, &["instructions", "steps"], &field("instructions"), violation);
    instructions.truncate(MAX_INSTRUCTIONS);

    Exercise {
        name: required_text(entry, &["name"], &field("name"), violation),
        description: optional_text(entry, &["description"], &field("description"), violation),
        sets: optional_text(entry, &["sets"], &field("sets"), violation),
        reps: optional_text(entry, &["reps", "repetitions"], &field("reps"), violation),
        image_url: optional_text(entry, &["imageUrl", "imageRef", "image_url", "image"], &field("imageUrl"), violation),
        instructions,
    }
}

/// Generated days past `limit` are never shown to the caller, so they are not checked.
fn plan_days<'a>(object: &'a JsonObject, limit: usize, violation: &mut SchemaViolation) -> &'a [Value] {
    match lookup(object, &["plan", "days"]) {
        Some(Value::Array(days)) => &days[..days.len().min(limit)],
        Some(_) => {
            violation.invalid("plan");
            &[]
        }
        None => {
            violation.missing("plan");
            &[]
        }
    }
}

fn label_of(day: &JsonObject) -> String {
    lookup(day, &["day", "label"]).and_then(coerce_text).unwrap_or_default()
}

/// First non-null value among `keys`.
fn lookup<'a>(object: &'a JsonObject, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn required_text(object: &JsonObject, keys: &[&str], field: &str, violation: &mut SchemaViolation) -> String {
    match lookup(object, keys) {
        Some(value) => match coerce_text(value).filter(|text| !text.is_empty()) {
            Some(text) => text,
            None => {
                violation.invalid(field);
                String::new()
            }
        },
        None => {
            violation.missing(field);
            String::new()
        }
    }
}

fn optional_text(object: &JsonObject, keys: &[&str], field: &str, violation: &mut SchemaViolation) -> String {
    match lookup(object, keys) {
        Some(value) => coerce_text(value).unwrap_or_else(|| {
            violation.invalid(field);
            String::new()
        }),
        None => String::new(),
    }
}

fn required_list(object: &JsonObject, keys: &[&str], field: &str, violation: &mut SchemaViolation) -> Vec<String> {
    match lookup(object, keys) {
        Some(value) => match coerce_list(value).filter(|items| !items.is_empty()) {
            Some(items) => items,
            None => {
                violation.invalid(field);
                Vec::new()
            }
        },
        None => {
            violation.missing(field);
            Vec::new()
        }
    }
}

/// Strings are trimmed, scalars stringified, string arrays joined with ", ".
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts = items.iter().map(coerce_text).collect::<Option<Vec<_>>>()?;
            Some(
                parts
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Arrays become trimmed, non-empty items; a lone string becomes a one-item list.
fn coerce_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let items = items.iter().map(coerce_text).collect::<Option<Vec<_>>>()?;
            Some(items.into_iter().filter(|item| !item.is_empty()).collect())
        }
        Value::String(_) | Value::Number(_) => coerce_text(value).map(|item| {
            if item.is_empty() {
                Vec::new()
            } else {
                vec![item]
            }
        }),
        _ => None,
    }
}

/// Finite, non-negative number from a JSON number or numeric-looking string.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric_text(s)?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

/// Accepts "150", "150 g", "12,5", "1,250 kcal", "0.5g". Anything with words before the
/// number, or more than one number, is rejected.
fn parse_numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let numeric_len = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(numeric_len);

    if number.is_empty() || !unit.chars().all(|c| c.is_alphabetic() || c.is_whitespace() || c == '%') {
        return None;
    }

    let normalized = match (number.matches(',').count(), number.contains('.')) {
        (0, _) => number.to_string(),
        (_, true) => number.replace(',', ""),
        (1, false) => {
            let (whole, fraction) = number.split_once(',')?;
            if fraction.len() == 3 && whole != "0" && whole != "-0" {
                format!("{}{}", whole, fraction)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        (_, false) => number.replace(',', ""),
    };

    normalized.parse::<f64>().ok()
}
