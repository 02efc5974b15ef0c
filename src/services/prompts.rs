use crate::models::{PlanHorizon, UserProfile};

/// Model-ready instruction payload. Pure data, built without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Role instruction sent as the system message.
    pub system: Option<String>,
    /// Task instruction sent as the user message.
    pub instruction: String,
    /// Image attached to the user message (data URI or URL).
    pub image: Option<String>,
}

const JSON_ONLY: &str =
    "Return ONLY a valid JSON object: no markdown, no code fences, no explanations before or after it.";

pub fn food_analysis(image: &str, language: &str) -> Prompt {
    let instruction = format!(
        "Analyze this photo of food and give a detailed nutrition estimate.\n\
         \n\
         {json_only}\n\
         Use exactly this structure:\n\
         {{\n  \
           \"food\": string, name of the main dish identified,\n  \
           \"quantityGrams\": number, estimated total weight in grams,\n  \
           \"proteinG\": number, grams of protein,\n  \
           \"fiberG\": number, grams of fiber,\n  \
           \"carbsG\": number, grams of carbohydrates,\n  \
           \"fatG\": number, grams of fat,\n  \
           \"calories\": number, total kilocalories,\n  \
           \"vitamins\": string, main vitamins present (e.g. A, C, D, E, K, B12),\n  \
           \"minerals\": string, main minerals (e.g. Calcium, Iron, Magnesium, Zinc),\n  \
           \"aminoAcids\": string, main amino acids (e.g. Leucine, Isoleucine, Valine, Lysine)\n\
         }}\n\
         Numbers must be plain JSON numbers without units.\n\
         Write the string values in {language}.\n\
         Base the estimates on the visual portion size.",
        json_only = JSON_ONLY,
        language = language,
    );

    Prompt {
        system: None,
        instruction,
        image: Some(image.to_string()),
    }
}

pub fn health_chat(question: &str) -> Prompt {
    let system = "You are a helpful health assistant for the NutriTracker app. \
        You can only answer questions related to health, nutrition, wellness, or the features of the NutriTracker app itself.\n\
        \n\
        If the user's question is about health, nutrition, wellness, or the app's features, give a helpful, accurate and professional answer.\n\
        \n\
        If the question is about anything else (politics, sports, entertainment, technology unrelated to health, etc.), \
        politely decline: say that you can only help with health, nutrition, wellness and app-related topics and that you have no \
        information outside that scope. Do not name, repeat, discuss or give any opinion about the out-of-scope topic.\n\
        \n\
        Keep answers concise but informative, friendly and professional. Answer in the language of the question.";

    Prompt {
        system: Some(system.to_string()),
        instruction: format!("User question: \"{}\"", question.trim().replace('"', "\\\"")),
        image: None,
    }
}

pub fn meal_plan(profile: &UserProfile, horizon: PlanHorizon, language: &str) -> Prompt {
    let days = horizon.day_count();
    let instruction = format!(
        "Create a personalized {period} meal plan for this profile:\n\
         \n\
         {profile}\
         Diet: {diet}\n\
         Meals per day: {meals}\n\
         Allergies: {allergies}\n\
         \n\
         Create a plan for {days} day(s) with breakfast, lunch, dinner and 2 healthy snacks per day.\n\
         Respect the dietary restrictions, allergies and goals of the user. Be specific about portions and foods.\n\
         Write every description in {language}.\n\
         \n\
         {json_only}\n\
         The \"plan\" array must contain exactly {days} element(s), in order:\n\
         {{\n  \
           \"plan\": [\n    \
             {{\n      \
               \"day\": string, day name,\n      \
               \"meals\": {{\n        \
                 \"breakfast\": string, detailed breakfast,\n        \
                 \"lunch\": string, detailed lunch,\n        \
                 \"dinner\": string, detailed dinner,\n        \
                 \"snacks\": array of strings, at least one snack\n      \
               }}\n    \
             }}\n  \
           ]\n\
         }}",
        period = horizon,
        profile = profile_summary(profile),
        diet = or_none(profile.diet_description()),
        meals = or_none(&profile.meals_per_day),
        allergies = or_none(&profile.allergies),
        days = days,
        language = language,
        json_only = JSON_ONLY,
    );

    Prompt {
        system: Some(
            "You are an expert nutritionist who creates personalized meal plans. Always answer with valid JSON."
                .to_string(),
        ),
        instruction,
        image: None,
    }
}

pub fn workout_plan(profile: &UserProfile, horizon: PlanHorizon, language: &str) -> Prompt {
    let days = horizon.day_count();
    let instruction = format!(
        "Create a personalized {period} bodyweight workout plan for this profile:\n\
         \n\
         {profile}\
         \n\
         Create a plan for {days} day(s) using ONLY bodyweight exercises (no equipment).\n\
         Every exercise needs a name, a short description, the number of sets, the number of repetitions, \
         an illustrative public image URL and 3 to 5 step-by-step instructions.\n\
         Take the health conditions and goals into account. Use simpler exercises for beginners and raise the \
         intensity for advanced users.\n\
         Write every description and instruction in {language}.\n\
         \n\
         {json_only}\n\
         The \"plan\" array must contain exactly {days} element(s), in order:\n\
         {{\n  \
           \"plan\": [\n    \
             {{\n      \
               \"day\": string, day name,\n      \
               \"exercises\": [\n        \
                 {{\n          \
                   \"name\": string,\n          \
                   \"description\": string,\n          \
                   \"sets\": string, e.g. \"3\",\n          \
                   \"reps\": string, e.g. \"10-12\",\n          \
                   \"imageUrl\": string, e.g. \"https://images.unsplash.com/photo-1571019614242-c5c5dee9f50b?w=400&h=300&fit=crop\",\n          \
                   \"instructions\": array of 3 to 5 strings\n        \
                 }}\n      \
               ]\n    \
             }}\n  \
           ]\n\
         }}",
        period = horizon,
        profile = profile_summary(profile),
        days = days,
        language = language,
        json_only = JSON_ONLY,
    );

    Prompt {
        system: Some(
            "You are a personal trainer specialized in bodyweight training. Always answer with valid JSON."
                .to_string(),
        ),
        instruction,
        image: None,
    }
}

fn profile_summary(profile: &UserProfile) -> String {
    let conditions = profile.conditions();
    format!(
        "Age: {} years\n\
         Gender: {}\n\
         Height: {} cm\n\
         Weight: {} kg\n\
         Health conditions: {}\n\
         Goal: {}\n\
         Exercise frequency: {}\n",
        profile.age,
        or_none(&profile.gender),
        profile.height_cm,
        profile.weight_kg,
        if conditions.is_empty() { "None".to_string() } else { conditions.join(", ") },
        or_none(&profile.main_goal),
        or_none(&profile.exercise_frequency),
    )
}

fn or_none(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "None"
    } else {
        trimmed
    }
}
