//! Overload domain — self-reported soreness to a risk assessment with corrective actions.
//!
//! Reports of sharp pain or soreness at 8 or above add an explicit escalation clause
//! to the prompt, on top of the standing safety instruction.

use serde::{Deserialize, Serialize};

use crate::domains::fields::{parse_number, Choice, FieldSpec};
use crate::domains::{Domain, DomainSpec};
use crate::llm_client::prompts::{or_placeholder, render, JSON_FORMAT_INSTRUCTION, NONE_REPORTED};
use crate::llm_client::schema::Schema;

/// Soreness at or above this level triggers the escalation clause.
pub const ESCALATION_SORENESS: u8 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscomfortType {
    #[default]
    DullAche,
    Stiffness,
    Tightness,
    SharpPain,
}

impl Choice for DiscomfortType {
    const ALL: &'static [Self] = &[
        DiscomfortType::DullAche,
        DiscomfortType::Stiffness,
        DiscomfortType::Tightness,
        DiscomfortType::SharpPain,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            DiscomfortType::DullAche => "dull-ache",
            DiscomfortType::Stiffness => "stiffness",
            DiscomfortType::Tightness => "tightness",
            DiscomfortType::SharpPain => "sharp-pain",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingIntensity {
    Low,
    #[default]
    Moderate,
    High,
    VeryHigh,
}

impl Choice for TrainingIntensity {
    const ALL: &'static [Self] = &[
        TrainingIntensity::Low,
        TrainingIntensity::Moderate,
        TrainingIntensity::High,
        TrainingIntensity::VeryHigh,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TrainingIntensity::Low => "low",
            TrainingIntensity::Moderate => "moderate",
            TrainingIntensity::High => "high",
            TrainingIntensity::VeryHigh => "very-high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverloadProfile {
    /// Comma-separated, passed through as-is.
    pub sore_muscles: String,
    /// Comma-separated, passed through as-is.
    pub achy_joints: String,
    /// 1–10, numeric-as-text.
    pub soreness_level: String,
    pub discomfort_type: DiscomfortType,
    pub recent_intensity: TrainingIntensity,
}

impl Default for OverloadProfile {
    fn default() -> Self {
        Self {
            sore_muscles: String::new(),
            achy_joints: String::new(),
            soreness_level: "3".to_string(),
            discomfort_type: DiscomfortType::default(),
            recent_intensity: TrainingIntensity::default(),
        }
    }
}

impl OverloadProfile {
    /// True for sharp pain or soreness at the escalation threshold.
    pub fn needs_escalation(&self) -> bool {
        let soreness_high = parse_number(&self.soreness_level)
            .is_some_and(|level| level >= f64::from(ESCALATION_SORENESS));
        soreness_high || self.discomfort_type == DiscomfortType::SharpPain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Mobility,
    #[serde(rename = "Corrective Exercise")]
    CorrectiveExercise,
    #[serde(rename = "Recovery Protocol")]
    RecoveryProtocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverloadAnalysis {
    pub analysis_title: String,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub identified_areas: Vec<IdentifiedArea>,
    pub corrective_actions: Vec<CorrectiveAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedArea {
    pub area: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    pub name: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
}

/// Replace: {json_format}, {sore_muscles}, {achy_joints}, {soreness_level},
///          {discomfort_type}, {recent_intensity}, {escalation}
const OVERLOAD_PROMPT_TEMPLATE: &str = r#"Act as an expert physical therapist and sports scientist. Analyze the user's self-reported data to detect potential accumulated overload in joints and muscles. Provide a risk assessment and suggest actionable corrective exercises, mobility work, or active deloading. {json_format}

User's Self-Report:
- Sore Muscle Groups: {sore_muscles}
- Achy Joints: {achy_joints}
- Soreness/Discomfort Level (1-10): {soreness_level}
- Type of Discomfort: {discomfort_type}
- Recent Training Intensity: {recent_intensity}

Based on this data, provide the following:
1. 'analysisTitle': "Overload & Recovery Analysis".
2. 'riskLevel': Categorize the risk of overtraining/injury as 'Low', 'Moderate', or 'High'.
3. 'summary': A brief, one or two-sentence summary explaining the risk level based on the user's input.
4. 'identifiedAreas': An array of objects detailing the problem areas. For each area (e.g., "Lower Back", "Knees"), provide brief 'notes' on why it might be an issue.
5. 'correctiveActions': An array of 2-4 actionable recommendations. For each action, specify its 'name', 'type' ('Mobility', 'Corrective Exercise', or 'Recovery Protocol'), and a clear 'description' of how to perform it or what it entails.

IMPORTANT: If the user reports sharp pain or a high soreness level (8+), prioritize safety in the summary and suggest consulting a healthcare professional. Focus recommendations on gentle mobility and recovery, not strenuous exercises.{escalation}"#;

const ESCALATION_CLAUSE: &str = "\n\nSAFETY ESCALATION: This user has reported sharp pain or a soreness level of 8 or higher. \
Set 'riskLevel' to 'High'. The summary MUST advise consulting a healthcare professional before further training. \
Only recommend gentle mobility work and recovery protocols; do not prescribe loaded or strenuous exercises.";

pub struct Overload;

impl DomainSpec for Overload {
    const DOMAIN: Domain = Domain::Overload;

    type Profile = OverloadProfile;
    type Plan = OverloadAnalysis;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::optional_text("soreMuscles", "Sore muscle groups (comma-separated)"),
            FieldSpec::optional_text("achyJoints", "Achy joints (comma-separated)"),
            FieldSpec::integer(
                "sorenessLevel",
                "Overall soreness/discomfort level (1-10)",
                1.0,
                Some(10.0),
            ),
            FieldSpec::choice::<DiscomfortType>("discomfortType", "Type of discomfort"),
            FieldSpec::choice::<TrainingIntensity>("recentIntensity", "Recent training intensity"),
        ]
    }

    fn render_prompt(profile: &OverloadProfile) -> String {
        let escalation = if profile.needs_escalation() {
            ESCALATION_CLAUSE
        } else {
            ""
        };

        render(
            OVERLOAD_PROMPT_TEMPLATE,
            &[
                ("json_format", JSON_FORMAT_INSTRUCTION),
                (
                    "sore_muscles",
                    or_placeholder(&profile.sore_muscles, NONE_REPORTED),
                ),
                (
                    "achy_joints",
                    or_placeholder(&profile.achy_joints, NONE_REPORTED),
                ),
                ("soreness_level", profile.soreness_level.trim()),
                ("discomfort_type", profile.discomfort_type.as_str()),
                ("recent_intensity", profile.recent_intensity.as_str()),
                ("escalation", escalation),
            ],
        )
    }

    fn output_schema() -> Schema {
        Schema::object()
            .property("analysisTitle", Schema::string())
            .property(
                "riskLevel",
                Schema::string_enum(&["Low", "Moderate", "High"]),
            )
            .property("summary", Schema::string())
            .property(
                "identifiedAreas",
                Schema::array(
                    Schema::object()
                        .property("area", Schema::string())
                        .property("notes", Schema::string())
                        .require_all(),
                ),
            )
            .property(
                "correctiveActions",
                Schema::array(
                    Schema::object()
                        .property("name", Schema::string())
                        .property(
                            "type",
                            Schema::string_enum(&[
                                "Mobility",
                                "Corrective Exercise",
                                "Recovery Protocol",
                            ]),
                        )
                        .property("description", Schema::string())
                        .require_all(),
                ),
            )
            .require_all()
    }
}
