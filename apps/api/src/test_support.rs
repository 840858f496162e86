//! Test doubles and canned model output shared by the unit and router tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

use crate::domains::Domain;
use crate::llm_client::schema::{Schema, SchemaType};
use crate::llm_client::{GenerationClient, GenerationRequest, LlmError};
use crate::session::{IdentityError, IdentityProvider, SessionUser};

// ────────────────────────────────────────────────────────────────────────────
// Generation stub
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Simulated provider/transport failure.
    Fail,
}

/// Scripted `GenerationClient`. Replies are consumed in order; the last one repeats.
pub struct StubGenerationClient {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
    gate: Option<Arc<Notify>>,
}

impl StubGenerationClient {
    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::scripted(vec![Reply::Text(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::scripted(vec![Reply::Fail])
    }

    /// Every call waits for one `notify_one()` on `gate` before replying.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or(Reply::Fail)
        }
    }
}

#[async_trait]
impl GenerationClient for StubGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.next_reply() {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(LlmError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity stub
// ────────────────────────────────────────────────────────────────────────────

pub const TEST_EMAIL: &str = "leonidas@sparta.test";
pub const TEST_PASSWORD: &str = "this-is-sparta";

/// Accepts exactly one email/password pair.
pub struct StaticIdentity;

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, IdentityError> {
        if email == TEST_EMAIL && password == TEST_PASSWORD {
            Ok(SessionUser {
                uid: "uid-300".to_string(),
                email: Some(email.to_string()),
                display_name: Some("Leonidas".to_string()),
            })
        } else {
            Err(IdentityError::Rejected("INVALID_LOGIN_CREDENTIALS".to_string()))
        }
    }

    async fn sign_out(&self, _user: &SessionUser) -> Result<(), IdentityError> {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Schema coverage
// ────────────────────────────────────────────────────────────────────────────

/// Panics unless `sample` satisfies `schema` and every key it serializes is declared.
pub fn assert_schema_covers<T: Serialize>(schema: &Schema, sample: &T) {
    let value = serde_json::to_value(sample).expect("sample serializes");
    if let Err(violation) = schema.validate(&value) {
        panic!("sample violates schema: {violation}");
    }
    assert_declared(schema, &value, "$");
}

fn assert_declared(schema: &Schema, value: &Value, path: &str) {
    match (schema.kind, value) {
        (SchemaType::Object, Value::Object(map)) => {
            for name in &schema.required {
                assert!(
                    schema.properties.contains_key(name),
                    "{path}: required '{name}' has no property"
                );
            }
            for (key, child) in map {
                let property = schema
                    .properties
                    .get(key)
                    .unwrap_or_else(|| panic!("{path}.{key} is not declared in the schema"));
                assert_declared(property, child, &format!("{path}.{key}"));
            }
        }
        (SchemaType::Array, Value::Array(items)) => {
            if let Some(item_schema) = &schema.items {
                for (index, item) in items.iter().enumerate() {
                    assert_declared(item_schema, item, &format!("{path}[{index}]"));
                }
            }
        }
        _ => {}
    }
}

pub fn plan_fixture(domain: Domain) -> &'static str {
    match domain {
        Domain::Workout => WORKOUT_PLAN_JSON,
        Domain::Nutrition => NUTRITION_PLAN_JSON,
        Domain::Circadian => CIRCADIAN_PLAN_JSON,
        Domain::Wearable => WEARABLE_INSIGHTS_JSON,
        Domain::Overload => OVERLOAD_ANALYSIS_JSON,
        Domain::Longevity => LONGEVITY_REPORT_JSON,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub const WORKOUT_PLAN_JSON: &str = r#"{
  "planName": "Hoplite Foundations",
  "durationWeeks": 4,
  "days": [
    {
      "day": 1,
      "name": "Full Body A",
      "exercises": [
        {"name": "Goblet Squat", "sets": "3", "reps": "8-12", "rest": "90 seconds"},
        {"name": "Dumbbell Bench Press", "sets": "3", "reps": "8-12", "rest": "90 seconds"},
        {"name": "Seated Cable Row", "sets": "3", "reps": "10-12", "rest": "60 seconds"}
      ]
    },
    {
      "day": 2,
      "name": "Rest",
      "exercises": []
    },
    {
      "day": 3,
      "name": "Full Body B",
      "exercises": [
        {"name": "Romanian Deadlift", "sets": "3", "reps": "8-10", "rest": "90 seconds"},
        {"name": "Overhead Press", "sets": "3", "reps": "8-12", "rest": "90 seconds"}
      ]
    }
  ]
}"#;

pub const NUTRITION_PLAN_JSON: &str = r#"{
  "planName": "Lean Phalanx",
  "dailyCalories": 2100,
  "macronutrients": {"proteinGrams": 170, "carbsGrams": 190, "fatGrams": 70},
  "days": [
    {
      "day": "Monday",
      "meals": [
        {"name": "Breakfast", "items": ["Greek Yogurt (200g)", "Blueberries (80g)", "Oats (40g)"]},
        {"name": "Lunch", "items": ["Grilled Chicken Breast (150g)", "Brown Rice (120g)"]},
        {"name": "Snack", "items": ["Apple (1 medium)"]},
        {"name": "Dinner", "items": ["Baked Salmon (150g)", "Steamed Broccoli (150g)"]}
      ]
    },
    {
      "day": "Tuesday",
      "meals": [
        {"name": "Breakfast", "items": ["Scrambled Eggs (3)", "Whole-grain Toast (1 slice)"]},
        {"name": "Lunch", "items": ["Turkey Wrap (1)", "Mixed Salad (100g)"]},
        {"name": "Snack", "items": ["Cottage Cheese (150g)"]},
        {"name": "Dinner", "items": ["Lean Beef Stir-fry (150g)", "Jasmine Rice (120g)"]}
      ]
    }
  ]
}"#;

pub const RECIPE_JSON: &str = r#"{
  "recipeName": "Spartan Berry Parfait",
  "ingredients": [
    {"name": "Greek yogurt", "quantity": "200g"},
    {"name": "Blueberries", "quantity": "80g"},
    {"name": "Rolled oats", "quantity": "40g"}
  ],
  "instructions": [
    "Toast the oats in a dry pan for two minutes.",
    "Layer yogurt, blueberries and oats in a glass.",
    "Serve immediately."
  ],
  "substitutions": [
    {"original": "Greek yogurt", "substitute": "Skyr or soy yogurt"}
  ]
}"#;

pub const CIRCADIAN_PLAN_JSON: &str = r#"{
  "planName": "Dawn Patrol Rhythm",
  "idealSleepSchedule": {"bedtime": "10:45 PM", "wakeupTime": "6:45 AM"},
  "dailyTiming": [
    {"time": "6:45 AM", "name": "Wake-up & Hydrate", "description": "Drink 500ml of water and get ten minutes of sunlight."},
    {"time": "8:00 AM", "name": "Breakfast", "description": "Protein-forward first meal."},
    {"time": "2:00 PM", "name": "Coffee Cut-off", "description": "No caffeine after this point."},
    {"time": "5:00 PM", "name": "Workout", "description": "Peak body temperature window for training."},
    {"time": "9:45 PM", "name": "Wind-down", "description": "Dim lights and put screens away."}
  ],
  "sleepHygieneTips": [
    "Keep the bedroom at 18-19°C.",
    "Anchor your wake-up time, even on weekends."
  ]
}"#;

pub const WEARABLE_INSIGHTS_JSON: &str = r#"{
  "planName": "Today's Biometric Analysis",
  "overallStatus": "Primed for a high-intensity day.",
  "sleepRecommendation": "Solid sleep duration. Keep the same bedtime tonight.",
  "activityRecommendation": "Recovery is good: schedule your hardest session today.",
  "recoveryRecommendation": "A resting HR of 55 with HRV of 68 ms indicates a well-recovered nervous system."
}"#;

pub const OVERLOAD_ANALYSIS_JSON: &str = r#"{
  "analysisTitle": "Overload & Recovery Analysis",
  "riskLevel": "High",
  "summary": "Sharp pain at a high soreness level warrants caution. Please consult a healthcare professional before training again.",
  "identifiedAreas": [
    {"area": "Lower Back", "notes": "Sharp pain after heavy deadlifts may indicate strain."},
    {"area": "Knees", "notes": "Aching joints suggest accumulated load."}
  ],
  "correctiveActions": [
    {"name": "Cat-Cow Flow", "type": "Mobility", "description": "Slow spinal flexion and extension, 2 sets of 10."},
    {"name": "Active Deload Week", "type": "Recovery Protocol", "description": "Reduce training volume by half for seven days."}
  ]
}"#;

pub const LONGEVITY_REPORT_JSON: &str = r#"{
  "reportTitle": "Weekly Longevity Report",
  "longevityScore": 78,
  "weeklySummary": "Strong week for strength and cardiovascular health. Sleep is the main lever for next week.",
  "relativeStrength": {"analysis": "A 1.5x bodyweight squat is well above average and protects muscle mass with age."},
  "bodyComposition": {"analysis": "15% body fat sits in a healthy range for reducing chronic disease risk."},
  "sleepQuality": {"analysis": "7h 30m of good sleep supports repair; aim for consistency."},
  "cardiovascularFitness": {"analysis": "A VO2 max of 45 is good for your age, with room for improvement."},
  "actionableRecommendations": [
    "Add one zone 2 session of 45 minutes.",
    "Keep a fixed wake-up time all week.",
    "Hold protein at 1.6 g/kg bodyweight."
  ]
}"#;
