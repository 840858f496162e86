//! Circadian domain — daily rhythm profile to a synchronized sleep and meal timeline.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{Choice, FieldSpec};
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{or_placeholder, render, JSON_FORMAT_INSTRUCTION, NONE_PROVIDED};
use crate::llm_client::schema::Schema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityWindow {
    Morning,
    MidDay,
    #[default]
    Afternoon,
    Evening,
}

impl Choice for ActivityWindow {
    const ALL: &'static [Self] = &[
        ActivityWindow::Morning,
        ActivityWindow::MidDay,
        ActivityWindow::Afternoon,
        ActivityWindow::Evening,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ActivityWindow::Morning => "morning",
            ActivityWindow::MidDay => "mid-day",
            ActivityWindow::Afternoon => "afternoon",
            ActivityWindow::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircadianProfile {
    /// `HH:MM`
    pub wake_time: String,
    /// `HH:MM`
    pub sleep_time: String,
    pub activity_window: ActivityWindow,
    pub sleep_issues: String,
}

impl Default for CircadianProfile {
    fn default() -> Self {
        Self {
            wake_time: "07:00".to_string(),
            sleep_time: "23:00".to_string(),
            activity_window: ActivityWindow::default(),
            sleep_issues: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircadianPlan {
    pub plan_name: String,
    pub ideal_sleep_schedule: SleepSchedule,
    pub daily_timing: Vec<TimeBlock>,
    pub sleep_hygiene_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSchedule {
    pub bedtime: String,
    pub wakeup_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub time: String,
    pub name: String,
    pub description: String,
}

/// Replace: {json_format}, {wake_time}, {sleep_time}, {activity_window}, {sleep_issues}
const CIRCADIAN_PROMPT_TEMPLATE: &str = r#"Create a synchronized diet and sleep plan based on the user's circadian rhythm to optimize recovery and performance. {json_format}
User Profile:
- Typical Wake-up Time: {wake_time}
- Typical Bedtime: {sleep_time}
- Primary Activity/Workout Window: {activity_window}
- Sleep Challenges: {sleep_issues}

The plan should include:
1. A catchy name for the plan.
2. An ideal, recommended sleep schedule (bedtime and wake-up time).
3. A detailed daily timeline of events from waking up to sleeping. This should include specific times for:
   - Hydration and morning sunlight exposure.
   - Meal times (e.g., Breakfast, Lunch, Dinner) that align with a healthy eating window.
   - The optimal workout time based on their activity window.
   - A "wind-down" period before bed.
   - Other relevant activities like a coffee cut-off time.
4. A list of actionable sleep hygiene tips, especially addressing the user's sleep challenges."#;

pub struct Circadian;

impl DomainSpec for Circadian {
    const DOMAIN: Domain = Domain::Circadian;

    type Profile = CircadianProfile;
    type Plan = CircadianPlan;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::time("wakeTime", "What time do you usually wake up?"),
            FieldSpec::time("sleepTime", "What time do you usually go to bed?"),
            FieldSpec::choice::<ActivityWindow>(
                "activityWindow",
                "When is your primary activity or workout window?",
            ),
            FieldSpec::optional_text("sleepIssues", "Any sleep challenges?"),
        ]
    }

    fn render_prompt(profile: &CircadianProfile) -> String {
        render(
            CIRCADIAN_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                ("wake_time", profile.wake_time.trim()),
                ("sleep_time", profile.sleep_time.trim()),
                ("activity_window", profile.activity_window.as_str()),
                (
                    "sleep_issues",
                    or_placeholder(&profile.sleep_issues, NONE_PROVIDED),
                ),
            ],
        )
    }

    fn output_schema() -> Schema {
        Schema::object()
            .property("planName", Schema::string())
            .property(
                "idealSleepSchedule",
                Schema::object()
                    .property("bedtime", Schema::string())
                    .property("wakeupTime", Schema::string())
                    .require_all(),
            )
            .property(
                "dailyTiming",
                Schema::array(
                    Schema::object()
                        .property("time", Schema::string().describe("e.g., 7:00 AM"))
                        .property("name", Schema::string().describe("e.g., Wake-up & Hydrate"))
                        .property(
                            "description",
                            Schema::string()
                                .describe("A brief recommendation for this time block."),
                        )
                        .require_all(),
                ),
            )
            .property("sleepHygieneTips", Schema::array(Schema::string()))
            .require_all()
    }
}
