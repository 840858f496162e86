//! Longevity domain — weekly health metrics to a scored longevity report.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{Choice, FieldSpec};
use crate::domains::wearable::Rating;
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{render, JSON_FORMAT_INSTRUCTION, NOT_PROVIDED};
use crate::llm_client::schema::Schema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongevityProfile {
    /// kg
    pub bodyweight: String,
    /// Optional.
    pub body_fat_percentage: String,
    /// 1RM, kg
    pub squat_max: String,
    /// 1RM, kg
    pub bench_max: String,
    /// 1RM, kg
    pub deadlift_max: String,
    /// Free-form, e.g. "7h 30m".
    pub avg_sleep_duration: String,
    pub sleep_quality: Rating,
    /// mL/kg/min
    pub vo2_max: String,
}

impl Default for LongevityProfile {
    fn default() -> Self {
        Self {
            bodyweight: "80".to_string(),
            body_fat_percentage: "15".to_string(),
            squat_max: "120".to_string(),
            bench_max: "90".to_string(),
            deadlift_max: "150".to_string(),
            avg_sleep_duration: "7h 30m".to_string(),
            sleep_quality: Rating::Good,
            vo2_max: "45".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongevityReport {
    pub report_title: String,
    /// 0–100, higher is better.
    pub longevity_score: u32,
    pub weekly_summary: String,
    pub relative_strength: Analysis,
    pub body_composition: Analysis,
    pub sleep_quality: Analysis,
    pub cardiovascular_fitness: Analysis,
    pub actionable_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis: String,
}

/// Replace: {json_format}, {bodyweight}, {body_fat}, {squat}, {bench}, {deadlift},
///          {sleep_duration}, {sleep_quality}, {vo2_max}
const LONGEVITY_PROMPT_TEMPLATE: &str = r#"Act as a preventative medicine physician and longevity expert. Analyze the user's weekly health metrics to generate a comprehensive "Longevity Report". {json_format}

User's Weekly Metrics:
- Bodyweight: {bodyweight} kg
- Body Fat Percentage: {body_fat}
- 1-Rep Max (Strength): Squat {squat} kg, Bench Press {bench} kg, Deadlift {deadlift} kg
- Average Sleep Duration: {sleep_duration} per night
- Subjective Sleep Quality: {sleep_quality}
- Estimated VO2 Max: {vo2_max} mL/kg/min

Based on these metrics, provide the following:
1. 'reportTitle': "Weekly Longevity Report".
2. 'longevityScore': An overall score out of 100, holistically assessing all provided metrics as they relate to long-term health. A higher score reflects better alignment with longevity principles.
3. 'weeklySummary': A 2-3 sentence summary of the user's week, highlighting strengths and key areas for improvement.
4. 'relativeStrength': An 'analysis' of their strength relative to bodyweight. Comment on its importance for maintaining muscle mass and metabolic health with age.
5. 'bodyComposition': An 'analysis' of their bodyweight and body fat percentage. Explain the relevance of maintaining a healthy body composition for reducing chronic disease risk.
6. 'sleepQuality': An 'analysis' of their sleep duration and quality, linking it to cellular repair, cognitive function, and hormonal balance.
7. 'cardiovascularFitness': An 'analysis' of their VO2 Max as a key predictor of all-cause mortality. Provide context for their number (e.g., "excellent for your age," "room for improvement").
8. 'actionableRecommendations': A list of 3-4 specific, actionable recommendations for the upcoming week to improve their next longevity score."#;

pub struct Longevity;

impl DomainSpec for Longevity {
    const DOMAIN: Domain = Domain::Longevity;

    type Profile = LongevityProfile;
    type Plan = LongevityReport;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("bodyweight", "Bodyweight (kg)", 1.0, None),
            FieldSpec::optional_number("bodyFatPercentage", "Body fat (%)", 0.0, Some(100.0)),
            FieldSpec::number("squatMax", "Squat 1RM (kg)", 0.0, None),
            FieldSpec::number("benchMax", "Bench press 1RM (kg)", 0.0, None),
            FieldSpec::number("deadliftMax", "Deadlift 1RM (kg)", 0.0, None),
            FieldSpec::text("avgSleepDuration", "Average sleep duration"),
            FieldSpec::choice::<Rating>("sleepQuality", "Subjective sleep quality"),
            FieldSpec::number("vo2Max", "Estimated VO2 max (mL/kg/min)", 0.0, None),
        ]
    }

    fn render_prompt(profile: &LongevityProfile) -> String {
        let body_fat = match profile.body_fat_percentage.trim() {
            "" => NOT_PROVIDED.to_string(),
            value => format!("{value}%"),
        };

        render(
            LONGEVITY_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                ("bodyweight", profile.bodyweight.trim()),
                ("body_fat", &body_fat),
                ("squat", profile.squat_max.trim()),
                ("bench", profile.bench_max.trim()),
                ("deadlift", profile.deadlift_max.trim()),
                ("sleep_duration", profile.avg_sleep_duration.trim()),
                ("sleep_quality", profile.sleep_quality.as_str()),
                ("vo2_max", profile.vo2_max.trim()),
            ],
        )
    }

    fn output_schema() -> Schema {
        let analysis = || {
            Schema::object()
                .property("analysis", Schema::string())
                .require_all()
        };

        Schema::object()
            .property("reportTitle", Schema::string())
            .property("longevityScore", Schema::integer())
            .property("weeklySummary", Schema::string())
            .property("relativeStrength", analysis())
            .property("bodyComposition", analysis())
            .property("sleepQuality", analysis())
            .property("cardiovascularFitness", analysis())
            .property("actionableRecommendations", Schema::array(Schema::string()))
            .require_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_schema_covers, LONGEVITY_REPORT_JSON};

    #[test]
    fn test_prompt_embeds_metrics() {
        let prompt = Longevity::render_prompt(&LongevityProfile::default());
        assert!(prompt.contains("- Bodyweight: 80 kg"));
        assert!(prompt.contains("- Body Fat Percentage: 15%"));
        assert!(prompt.contains("Squat 120 kg, Bench Press 90 kg, Deadlift 150 kg"));
        assert!(prompt.contains("- Average Sleep Duration: 7h 30m per night"));
        assert!(prompt.contains("- Subjective Sleep Quality: Good"));
        assert!(prompt.contains("- Estimated VO2 Max: 45 mL/kg/min"));
    }

    #[test]
    fn test_missing_body_fat_degrades_to_placeholder_without_unit() {
        let profile = LongevityProfile {
            body_fat_percentage: String::new(),
            ..LongevityProfile::default()
        };
        let prompt = Longevity::render_prompt(&profile);
        assert!(prompt.contains("- Body Fat Percentage: Not provided\n"));
        assert!(!prompt.contains("Not provided%"));
        assert!(Longevity::validate(&profile).is_ok());
    }

    #[test]
    fn test_required_metric_missing_fails_validation() {
        let profile = LongevityProfile {
            vo2_max: String::new(),
            ..LongevityProfile::default()
        };
        assert!(Longevity::validate(&profile).is_err());
    }

    #[test]
    fn test_schema_in_lockstep_with_report() {
        let report: LongevityReport = serde_json::from_str(LONGEVITY_REPORT_JSON).unwrap();
        assert_schema_covers(&Longevity::output_schema(), &report);
        assert_eq!(
            Longevity::output_schema().required.len(),
            8,
            "every report field is required"
        );
    }
}
