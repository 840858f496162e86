//! Nutrition domain — dietary profile to a 7-day meal plan, plus the per-meal
//! recipe detail generated on demand from inside a plan.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{Choice, FieldSpec};
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{or_placeholder, render, JSON_FORMAT_INSTRUCTION, NONE_PROVIDED};
use crate::llm_client::schema::Schema;
use crate::llm_client::GenerationRequest;

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NutritionGoal {
    #[default]
    LoseFat,
    MaintainWeight,
    GainMuscle,
    ImprovePerformance,
}

impl Choice for NutritionGoal {
    const ALL: &'static [Self] = &[
        NutritionGoal::LoseFat,
        NutritionGoal::MaintainWeight,
        NutritionGoal::GainMuscle,
        NutritionGoal::ImprovePerformance,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            NutritionGoal::LoseFat => "lose-fat",
            NutritionGoal::MaintainWeight => "maintain-weight",
            NutritionGoal::GainMuscle => "gain-muscle",
            NutritionGoal::ImprovePerformance => "improve-performance",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietPreference {
    #[default]
    Omnivore,
    Vegetarian,
    Vegan,
    Pescatarian,
}

impl Choice for DietPreference {
    const ALL: &'static [Self] = &[
        DietPreference::Omnivore,
        DietPreference::Vegetarian,
        DietPreference::Vegan,
        DietPreference::Pescatarian,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            DietPreference::Omnivore => "omnivore",
            DietPreference::Vegetarian => "vegetarian",
            DietPreference::Vegan => "vegan",
            DietPreference::Pescatarian => "pescatarian",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealsPerDay {
    #[serde(rename = "3")]
    Three,
    #[default]
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
}

impl Choice for MealsPerDay {
    const ALL: &'static [Self] = &[MealsPerDay::Three, MealsPerDay::Four, MealsPerDay::Five];

    fn as_str(&self) -> &'static str {
        match self {
            MealsPerDay::Three => "3",
            MealsPerDay::Four => "4",
            MealsPerDay::Five => "5",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub goal: NutritionGoal,
    pub diet: DietPreference,
    /// Comma-separated, passed through as-is.
    pub allergies: String,
    /// Comma-separated, passed through as-is.
    pub disliked_foods: String,
    pub meals_per_day: MealsPerDay,
}

// ────────────────────────────────────────────────────────────────────────────
// Plan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
    pub plan_name: String,
    pub daily_calories: u32,
    pub macronutrients: Macronutrients,
    pub days: Vec<NutritionDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macronutrients {
    pub protein_grams: u32,
    pub carbs_grams: u32,
    pub fat_grams: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionDay {
    /// Day of the week, e.g. "Monday".
    pub day: String,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub items: Vec<String>,
}

impl NutritionPlan {
    /// Looks up one meal by day and meal index.
    pub fn meal(&self, day: usize, meal: usize) -> Option<&Meal> {
        self.days.get(day)?.meals.get(meal)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptor
// ────────────────────────────────────────────────────────────────────────────

/// Replace: {json_format}, {goal}, {diet}, {allergies}, {disliked_foods}, {meals_per_day}
const NUTRITION_PROMPT_TEMPLATE: &str = r#"Create a personalized 7-day nutrition plan based on the user's profile. {json_format}
- Primary Goal: {goal}
- Dietary Preference: {diet}
- Allergies or Restrictions: {allergies}
- Disliked Foods: {disliked_foods}
- Meals per day: {meals_per_day}

The plan should include a catchy name, estimated daily calories, and macronutrient targets (protein, carbs, fat).
For each of the 7 days (Monday to Sunday), provide a list of meals ({meals_per_day} meals per day).
For each meal, list 1-3 food items with estimated quantities (e.g., "Grilled Chicken Breast (150g)").
Ensure the plan is varied, balanced, and aligned with the user's goal and preferences. Avoid all disliked foods and allergens."#;

pub struct Nutrition;

impl DomainSpec for Nutrition {
    const DOMAIN: Domain = Domain::Nutrition;

    type Profile = NutritionProfile;
    type Plan = NutritionPlan;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::choice::<NutritionGoal>("goal", "What is your primary nutrition goal?"),
            FieldSpec::choice::<DietPreference>("diet", "What are your dietary preferences?"),
            FieldSpec::choice::<MealsPerDay>("mealsPerDay", "How many meals do you prefer per day?"),
            FieldSpec::optional_text("allergies", "Allergies or restrictions (comma-separated)"),
            FieldSpec::optional_text("dislikedFoods", "Foods to avoid (comma-separated)"),
        ]
    }

    fn render_prompt(profile: &NutritionProfile) -> String {
        render(
            NUTRITION_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                ("goal", profile.goal.as_str()),
                ("diet", profile.diet.as_str()),
                ("allergies", or_placeholder(&profile.allergies, NONE_PROVIDED)),
                (
                    "disliked_foods",
                    or_placeholder(&profile.disliked_foods, NONE_PROVIDED),
                ),
                ("meals_per_day", profile.meals_per_day.as_str()),
            ],
        )
    }

    fn output_schema() -> Schema {
        let meal = Schema::object()
            .property(
                "name",
                Schema::string().describe("Name of the meal (e.g., 'Breakfast', 'Lunch')."),
            )
            .property("items", Schema::array(Schema::string()))
            .require_all();

        let day = Schema::object()
            .property(
                "day",
                Schema::string().describe("Day of the week (e.g., 'Monday')."),
            )
            .property(
                "meals",
                Schema::array(meal).describe("List of meals for the day."),
            )
            .require_all();

        Schema::object()
            .property(
                "planName",
                Schema::string().describe("A catchy name for the nutrition plan."),
            )
            .property(
                "dailyCalories",
                Schema::integer().describe("Estimated daily calorie target."),
            )
            .property(
                "macronutrients",
                Schema::object()
                    .property("proteinGrams", Schema::integer())
                    .property("carbsGrams", Schema::integer())
                    .property("fatGrams", Schema::integer())
                    .require_all(),
            )
            .property("days", Schema::array(day).describe("A 7-day meal plan."))
            .require_all()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe (nested detail for one meal)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    /// The only optional field in any generated shape.
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
}

/// Replace: {meal_name}, {meal_items}, {plan_name}, {calories}, {protein}, {carbs}, {fat}
const RECIPE_PROMPT_TEMPLATE: &str = r#"Create a simple recipe for a meal called "{meal_name}" that includes the following items: {meal_items}.
This recipe is part of a larger nutrition plan with the goal of "{plan_name}" and daily targets of approximately {calories} calories, {protein}g protein, {carbs}g carbs, and {fat}g fat.

Please provide the following in a JSON response:
1. A creative name for the recipe.
2. A list of ingredients with specific quantities.
3. Step-by-step cooking instructions.
4. A few sensible ingredient substitution options (e.g., "Chicken breast" can be substituted with "Turkey breast or firm tofu")."#;

pub fn recipe_schema() -> Schema {
    Schema::object()
        .property("recipeName", Schema::string())
        .property(
            "ingredients",
            Schema::array(
                Schema::object()
                    .property("name", Schema::string())
                    .property("quantity", Schema::string())
                    .require_all(),
            ),
        )
        .property("instructions", Schema::array(Schema::string()))
        .property(
            "substitutions",
            Schema::array(
                Schema::object()
                    .property("original", Schema::string())
                    .property("substitute", Schema::string())
                    .require_all(),
            ),
        )
        .required(&["recipeName", "ingredients", "instructions"])
}

/// Builds the recipe request for one meal, in the context of its plan's targets.
pub fn recipe_request(meal: &Meal, plan: &NutritionPlan) -> GenerationRequest {
    let calories = plan.daily_calories.to_string();
    let protein = plan.macronutrients.protein_grams.to_string();
    let carbs = plan.macronutrients.carbs_grams.to_string();
    let fat = plan.macronutrients.fat_grams.to_string();
    let items = meal.items.join(", ");

    GenerationRequest {
        instruction: render(
            RECIPE_PROMPT_TEMPLATE,
            &[
                ("meal_name", &meal.name),
                ("meal_items", &items),
                ("plan_name", &plan.plan_name),
                ("calories", &calories),
                ("protein", &protein),
                ("carbs", &carbs),
                ("fat", &fat),
            ],
        ),
        schema: recipe_schema(),
    }
}
