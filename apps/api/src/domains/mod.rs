// Advice domains. Each module pairs a Profile (input) with a Plan (output),
// a prompt template and the output schema that defines a valid Plan.
// All generation goes through `flow::OnboardingFlow`, never directly from here.

pub mod circadian;
pub mod fields;
pub mod longevity;
pub mod nutrition;
pub mod overload;
pub mod wearable;
pub mod workout;

use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::domains::fields::{apply_field, validate_profile, FieldSpec};
use crate::errors::AppError;
use crate::llm_client::schema::Schema;
use crate::llm_client::GenerationRequest;

use circadian::{Circadian, CircadianPlan, CircadianProfile};
use longevity::{Longevity, LongevityProfile, LongevityReport};
use nutrition::{Nutrition, NutritionPlan, NutritionProfile};
use overload::{Overload, OverloadAnalysis, OverloadProfile};
use wearable::{Wearable, WearableData, WearableInsights};
use workout::{Workout, WorkoutPlan, WorkoutProfile};

/// One of the six independent advice categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Workout,
    Nutrition,
    Circadian,
    Wearable,
    Overload,
    Longevity,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Workout,
        Domain::Nutrition,
        Domain::Circadian,
        Domain::Wearable,
        Domain::Overload,
        Domain::Longevity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Workout => "workout",
            Domain::Nutrition => "nutrition",
            Domain::Circadian => "circadian",
            Domain::Wearable => "wearable",
            Domain::Overload => "overload",
            Domain::Longevity => "longevity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Domain::Workout => "Workout Plan",
            Domain::Nutrition => "Nutrition Plan",
            Domain::Circadian => "Circadian Sync",
            Domain::Wearable => "Biometric Insights",
            Domain::Overload => "Overload Prevention",
            Domain::Longevity => "Longevity Report",
        }
    }

    /// Command keywords, matched case-insensitively as substrings.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Domain::Workout => &["entrenamiento", "workout", "training"],
            Domain::Nutrition => &["nutrición", "nutricion", "nutrition", "diet"],
            Domain::Circadian => &["circadiano", "circadian", "sleep schedule"],
            Domain::Wearable => &["biométricos", "biometricos", "biometric", "wearable"],
            Domain::Overload => &["sobrecarga", "overload"],
            Domain::Longevity => &["longevidad", "longevity"],
        }
    }

    /// Routes a free-text command to the first domain whose keyword it mentions.
    pub fn from_command(command: &str) -> Option<Domain> {
        let lowered = command.to_lowercase();
        Domain::ALL
            .into_iter()
            .find(|domain| domain.keywords().iter().any(|k| lowered.contains(k)))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::NotFound(format!("Unknown domain '{s}'")))
    }
}

/// Per-domain descriptor: form fields, prompt template and output schema.
/// `OnboardingFlow<D>` is the one pipeline instantiated for all six.
pub trait DomainSpec: Send + Sync + 'static {
    const DOMAIN: Domain;

    type Profile: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;
    type Plan: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    fn fields() -> Vec<FieldSpec>;

    /// Deterministic, no I/O. Embeds every profile field verbatim.
    fn render_prompt(profile: &Self::Profile) -> String;

    /// Must stay in lockstep with `Self::Plan`.
    fn output_schema() -> Schema;

    fn validate(profile: &Self::Profile) -> Result<(), AppError> {
        validate_profile(&Self::fields(), profile)
    }

    fn build_request(profile: &Self::Profile) -> GenerationRequest {
        GenerationRequest {
            instruction: Self::render_prompt(profile),
            schema: Self::output_schema(),
        }
    }
}

/// A profile draft for any domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Workout(WorkoutProfile),
    Nutrition(NutritionProfile),
    Circadian(CircadianProfile),
    Wearable(WearableData),
    Overload(OverloadProfile),
    Longevity(LongevityProfile),
}

impl Profile {
    /// The form's initial values.
    pub fn default_for(domain: Domain) -> Self {
        match domain {
            Domain::Workout => Profile::Workout(WorkoutProfile::default()),
            Domain::Nutrition => Profile::Nutrition(NutritionProfile::default()),
            Domain::Circadian => Profile::Circadian(CircadianProfile::default()),
            Domain::Wearable => Profile::Wearable(WearableData::default()),
            Domain::Overload => Profile::Overload(OverloadProfile::default()),
            Domain::Longevity => Profile::Longevity(LongevityProfile::default()),
        }
    }

    /// Parses a full profile submitted as JSON for `domain`.
    pub fn from_value(domain: Domain, value: Value) -> Result<Self, AppError> {
        fn parse<T: DeserializeOwned>(domain: Domain, value: Value) -> Result<T, AppError> {
            serde_json::from_value(value)
                .map_err(|e| AppError::Validation(format!("Invalid {domain} profile: {e}")))
        }

        Ok(match domain {
            Domain::Workout => Profile::Workout(parse(domain, value)?),
            Domain::Nutrition => Profile::Nutrition(parse(domain, value)?),
            Domain::Circadian => Profile::Circadian(parse(domain, value)?),
            Domain::Wearable => Profile::Wearable(parse(domain, value)?),
            Domain::Overload => Profile::Overload(parse(domain, value)?),
            Domain::Longevity => Profile::Longevity(parse(domain, value)?),
        })
    }

    pub fn domain(&self) -> Domain {
        match self {
            Profile::Workout(_) => Domain::Workout,
            Profile::Nutrition(_) => Domain::Nutrition,
            Profile::Circadian(_) => Domain::Circadian,
            Profile::Wearable(_) => Domain::Wearable,
            Profile::Overload(_) => Domain::Overload,
            Profile::Longevity(_) => Domain::Longevity,
        }
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        match self {
            Profile::Workout(_) => Workout::fields(),
            Profile::Nutrition(_) => Nutrition::fields(),
            Profile::Circadian(_) => Circadian::fields(),
            Profile::Wearable(_) => Wearable::fields(),
            Profile::Overload(_) => Overload::fields(),
            Profile::Longevity(_) => Longevity::fields(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            Profile::Workout(p) => Workout::validate(p),
            Profile::Nutrition(p) => Nutrition::validate(p),
            Profile::Circadian(p) => Circadian::validate(p),
            Profile::Wearable(p) => Wearable::validate(p),
            Profile::Overload(p) => Overload::validate(p),
            Profile::Longevity(p) => Longevity::validate(p),
        }
    }

    /// Replaces one field. The draft is left untouched on error.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        let fields = self.fields();
        *self = match &*self {
            Profile::Workout(p) => Profile::Workout(apply_field(&fields, p, name, value)?),
            Profile::Nutrition(p) => Profile::Nutrition(apply_field(&fields, p, name, value)?),
            Profile::Circadian(p) => Profile::Circadian(apply_field(&fields, p, name, value)?),
            Profile::Wearable(p) => Profile::Wearable(apply_field(&fields, p, name, value)?),
            Profile::Overload(p) => Profile::Overload(apply_field(&fields, p, name, value)?),
            Profile::Longevity(p) => Profile::Longevity(apply_field(&fields, p, name, value)?),
        };
        Ok(())
    }
}

/// A generated, schema-conformant result for any domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Plan {
    Workout(WorkoutPlan),
    Nutrition(NutritionPlan),
    Circadian(CircadianPlan),
    Wearable(WearableInsights),
    Overload(OverloadAnalysis),
    Longevity(LongevityReport),
}

impl Plan {
    pub fn domain(&self) -> Domain {
        match self {
            Plan::Workout(_) => Domain::Workout,
            Plan::Nutrition(_) => Domain::Nutrition,
            Plan::Circadian(_) => Domain::Circadian,
            Plan::Wearable(_) => Domain::Wearable,
            Plan::Overload(_) => Domain::Overload,
            Plan::Longevity(_) => Domain::Longevity,
        }
    }

    /// Title shown above the result view.
    pub fn headline(&self) -> &str {
        match self {
            Plan::Workout(p) => &p.plan_name,
            Plan::Nutrition(p) => &p.plan_name,
            Plan::Circadian(p) => &p.plan_name,
            Plan::Wearable(p) => &p.plan_name,
            Plan::Overload(p) => &p.analysis_title,
            Plan::Longevity(p) => &p.report_title,
        }
    }
}
