//! Wearable domain — one day of device biometrics to recovery-aware insights.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{Choice, FieldSpec};
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{render, JSON_FORMAT_INSTRUCTION};
use crate::llm_client::schema::Schema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Device {
    #[default]
    Garmin,
    AppleWatch,
    Fitbit,
    Oura,
    Whoop,
    Other,
}

impl Choice for Device {
    const ALL: &'static [Self] = &[
        Device::Garmin,
        Device::AppleWatch,
        Device::Fitbit,
        Device::Oura,
        Device::Whoop,
        Device::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Device::Garmin => "garmin",
            Device::AppleWatch => "apple-watch",
            Device::Fitbit => "fitbit",
            Device::Oura => "oura",
            Device::Whoop => "whoop",
            Device::Other => "other",
        }
    }
}

/// Four-step subjective/device rating. Shared with the longevity sleep-quality field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

impl Choice for Rating {
    const ALL: &'static [Self] = &[Rating::Excellent, Rating::Good, Rating::Fair, Rating::Poor];

    fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WearableData {
    pub device: Device,
    /// Free-form, e.g. "7h 45m".
    pub sleep_duration: String,
    pub resting_hr: String,
    pub hrv: String,
    pub steps: String,
    pub calories: String,
    pub recovery_status: Rating,
}

impl Default for WearableData {
    fn default() -> Self {
        Self {
            device: Device::default(),
            sleep_duration: "7h 45m".to_string(),
            resting_hr: "55".to_string(),
            hrv: "68".to_string(),
            steps: "10200".to_string(),
            calories: "2500".to_string(),
            recovery_status: Rating::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WearableInsights {
    pub plan_name: String,
    pub overall_status: String,
    pub sleep_recommendation: String,
    pub activity_recommendation: String,
    pub recovery_recommendation: String,
}

/// Replace: {json_format}, {device}, {sleep_duration}, {resting_hr}, {hrv}, {steps}, {calories}, {recovery_status}
const WEARABLE_PROMPT_TEMPLATE: &str = r#"Act as an elite performance and recovery coach. Analyze the following daily biometric data from a user's wearable device ({device}) and provide holistic, actionable insights. {json_format}

User's Data for Today:
- Sleep Duration: {sleep_duration}
- Resting Heart Rate: {resting_hr} bpm
- Heart Rate Variability (HRV): {hrv} ms
- Steps: {steps}
- Calories Burned: {calories} kcal
- Device-Reported Recovery Status: {recovery_status}

Based on this data, provide the following:
1. 'planName': A title for today's insight, like "Today's Biometric Analysis".
2. 'overallStatus': A brief, one-sentence summary of the user's readiness for the day (e.g., "Primed for a high-intensity day," or "Focus on active recovery today.").
3. 'sleepRecommendation': Analyze the sleep duration. Provide a specific recommendation. If sleep is good, commend it. If it's low, suggest a tangible action for tonight.
4. 'activityRecommendation': Analyze steps and calories in the context of recovery. If recovery is good, suggest a challenging workout. If recovery is poor, suggest lighter activity.
5. 'recoveryRecommendation': Analyze Resting HR and HRV. Explain what they indicate in simple terms and provide a recovery-focused tip."#;

pub struct Wearable;

impl DomainSpec for Wearable {
    const DOMAIN: Domain = Domain::Wearable;

    type Profile = WearableData;
    type Plan = WearableInsights;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::choice::<Device>("device", "Wearable device"),
            FieldSpec::text("sleepDuration", "Sleep duration"),
            FieldSpec::choice::<Rating>("recoveryStatus", "Device-reported recovery status"),
            FieldSpec::number("restingHr", "Resting heart rate (bpm)", 20.0, Some(250.0)),
            FieldSpec::number("hrv", "Heart rate variability (ms)", 0.0, None),
            FieldSpec::integer("steps", "Steps", 0.0, None),
            FieldSpec::number("calories", "Calories burned (kcal)", 0.0, None),
        ]
    }

    fn render_prompt(data: &WearableData) -> String {
        render(
            WEARABLE_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                ("device", data.device.as_str()),
                ("sleep_duration", data.sleep_duration.trim()),
                ("resting_hr", data.resting_hr.trim()),
                ("hrv", data.hrv.trim()),
                ("steps", data.steps.trim()),
                ("calories", data.calories.trim()),
                ("recovery_status", data.recovery_status.as_str()),
            ],
        )
    }

    fn output_schema() -> Schema {
        Schema::object()
            .property("planName", Schema::string())
            .property("overallStatus", Schema::string())
            .property("sleepRecommendation", Schema::string())
            .property("activityRecommendation", Schema::string())
            .property("recoveryRecommendation", Schema::string())
            .require_all()
    }
}
