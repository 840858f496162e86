//! Workout domain — training profile to a 4-week training plan.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{Choice, FieldSpec};
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{render, JSON_FORMAT_INSTRUCTION};
use crate::llm_client::schema::Schema;

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingGoal {
    #[default]
    BuildMuscle,
    LoseFat,
    IncreaseStrength,
    ImproveEndurance,
}

impl Choice for TrainingGoal {
    const ALL: &'static [Self] = &[
        TrainingGoal::BuildMuscle,
        TrainingGoal::LoseFat,
        TrainingGoal::IncreaseStrength,
        TrainingGoal::ImproveEndurance,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TrainingGoal::BuildMuscle => "build-muscle",
            TrainingGoal::LoseFat => "lose-fat",
            TrainingGoal::IncreaseStrength => "increase-strength",
            TrainingGoal::ImproveEndurance => "improve-endurance",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Choice for ExperienceLevel {
    const ALL: &'static [Self] = &[
        ExperienceLevel::Beginner,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingDays {
    #[serde(rename = "2")]
    Two,
    #[default]
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
}

impl Choice for TrainingDays {
    const ALL: &'static [Self] = &[
        TrainingDays::Two,
        TrainingDays::Three,
        TrainingDays::Four,
        TrainingDays::Five,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TrainingDays::Two => "2",
            TrainingDays::Three => "3",
            TrainingDays::Four => "4",
            TrainingDays::Five => "5",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equipment {
    Bodyweight,
    Dumbbells,
    #[default]
    BasicGym,
    FullGym,
}

impl Choice for Equipment {
    const ALL: &'static [Self] = &[
        Equipment::Bodyweight,
        Equipment::Dumbbells,
        Equipment::BasicGym,
        Equipment::FullGym,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Equipment::Bodyweight => "bodyweight",
            Equipment::Dumbbells => "dumbbells",
            Equipment::BasicGym => "basic-gym",
            Equipment::FullGym => "full-gym",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutProfile {
    pub goal: TrainingGoal,
    pub level: ExperienceLevel,
    pub days_per_week: TrainingDays,
    pub equipment: Equipment,
}

// ────────────────────────────────────────────────────────────────────────────
// Plan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub plan_name: String,
    pub duration_weeks: u32,
    pub days: Vec<WorkoutDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: u32,
    /// Focus of the day, e.g. "Upper Body Strength" or "Rest".
    pub name: String,
    /// Empty on rest days.
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: String,
    pub reps: String,
    pub rest: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptor
// ────────────────────────────────────────────────────────────────────────────

/// Replace: {json_format}, {goal}, {level}, {days_per_week}, {equipment}
const WORKOUT_PROMPT_TEMPLATE: &str = r#"Create a personalized workout plan based on the following user profile. {json_format}
- Fitness Goal: {goal}
- Experience Level: {level}
- Days per week: {days_per_week}
- Available Equipment: {equipment}

The plan should be for 4 weeks. Structure the response according to the provided JSON schema. Provide a catchy name for the plan.
For sets, reps, and rest, provide concrete numbers or ranges (e.g., "3-4", "8-12", "60-90 seconds")."#;

pub struct Workout;

impl DomainSpec for Workout {
    const DOMAIN: Domain = Domain::Workout;

    type Profile = WorkoutProfile;
    type Plan = WorkoutPlan;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::choice::<TrainingGoal>("goal", "What is your primary fitness goal?"),
            FieldSpec::choice::<ExperienceLevel>("level", "What is your experience level?"),
            FieldSpec::choice::<TrainingDays>(
                "daysPerWeek",
                "How many days per week can you train?",
            ),
            FieldSpec::choice::<Equipment>("equipment", "What equipment do you have access to?"),
        ]
    }

    fn render_prompt(profile: &WorkoutProfile) -> String {
        render(
            WORKOUT_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                ("goal", profile.goal.as_str()),
                ("level", profile.level.as_str()),
                ("days_per_week", profile.days_per_week.as_str()),
                ("equipment", profile.equipment.as_str()),
            ],
        )
    }

    fn output_schema() -> Schema {
        let exercise = Schema::object()
            .property("name", Schema::string())
            .property("sets", Schema::string())
            .property("reps", Schema::string())
            .property(
                "rest",
                Schema::string().describe("Rest time between sets."),
            )
            .require_all();

        let day = Schema::object()
            .property(
                "day",
                Schema::integer().describe("The day number of the week (e.g., 1)."),
            )
            .property(
                "name",
                Schema::string()
                    .describe("The focus of the day (e.g., 'Upper Body Strength', 'Rest')."),
            )
            .property(
                "exercises",
                Schema::array(exercise).describe(
                    "List of exercises for the day. Should be empty if it's a rest day.",
                ),
            )
            .require_all();

        Schema::object()
            .property(
                "planName",
                Schema::string().describe("A catchy name for the workout plan."),
            )
            .property(
                "durationWeeks",
                Schema::integer().describe("The duration of the plan in weeks."),
            )
            .property(
                "days",
                Schema::array(day).describe("An array of workout days for one week."),
            )
            .require_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_schema_covers, WORKOUT_PLAN_JSON};

    #[test]
    fn test_default_profile_matches_form_defaults() {
        let value = serde_json::to_value(WorkoutProfile::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "goal": "build-muscle",
                "level": "beginner",
                "daysPerWeek": "3",
                "equipment": "basic-gym"
            })
        );
    }

    #[test]
    fn test_prompt_embeds_every_field_verbatim() {
        let prompt = Workout::render_prompt(&WorkoutProfile::default());
        assert!(prompt.contains("- Fitness Goal: build-muscle"));
        assert!(prompt.contains("- Experience Level: beginner"));
        assert!(prompt.contains("- Days per week: 3"));
        assert!(prompt.contains("- Available Equipment: basic-gym"));
        assert!(prompt.contains("4 weeks"));
        assert!(prompt.contains("MUST be in JSON format"));
        assert!(!prompt.contains('{'), "no unfilled slots: {prompt}");
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let profile = WorkoutProfile {
            goal: TrainingGoal::ImproveEndurance,
            level: ExperienceLevel::Advanced,
            days_per_week: TrainingDays::Five,
            equipment: Equipment::Bodyweight,
        };
        assert_eq!(Workout::render_prompt(&profile), Workout::render_prompt(&profile));
        assert!(Workout::render_prompt(&profile).contains("improve-endurance"));
    }

    #[test]
    fn test_schema_requires_plan_and_day_fields() {
        let schema = Workout::output_schema();
        assert_eq!(schema.required, vec!["planName", "durationWeeks", "days"]);

        let day = schema.properties["days"].items.as_deref().unwrap();
        assert_eq!(day.required, vec!["day", "name", "exercises"]);

        let exercise = day.properties["exercises"].items.as_deref().unwrap();
        assert_eq!(exercise.required, vec!["name", "sets", "reps", "rest"]);
    }

    #[test]
    fn test_schema_in_lockstep_with_plan() {
        let plan: WorkoutPlan = serde_json::from_str(WORKOUT_PLAN_JSON).unwrap();
        assert_schema_covers(&Workout::output_schema(), &plan);
    }

    #[test]
    fn test_rest_day_with_no_exercises_deserializes() {
        let plan: WorkoutPlan = serde_json::from_str(WORKOUT_PLAN_JSON).unwrap();
        assert!(plan.days.iter().any(|d| d.exercises.is_empty()));
    }

    #[test]
    fn test_days_per_week_accepts_only_listed_values() {
        let bad = serde_json::json!({
            "goal": "build-muscle",
            "level": "beginner",
            "daysPerWeek": "7",
            "equipment": "basic-gym"
        });
        assert!(serde_json::from_value::<WorkoutProfile>(bad).is_err());
    }
}
