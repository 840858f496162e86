//! View/State layer for one signed-in client.
//!
//! Six independent domain slots, each `Idle -> Pending -> Ready | Failed`, plus the
//! orthogonal domain selection, the command transcript and the nested recipe overlay.
//! Everything here is synchronous: a submission is split into `begin_submit` (freeze the
//! profile, hand out a ticket) and `complete` (apply the result if the ticket still
//! matches), so the generation call itself runs without holding the workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domains::fields::FieldSpec;
use crate::domains::nutrition::{Meal, NutritionPlan, Recipe};
use crate::domains::{Domain, Plan, Profile};
use crate::errors::AppError;
use crate::flow::FlowFailure;

/// Oldest messages are dropped past this many.
pub const TRANSCRIPT_LIMIT: usize = 200;

pub const WELCOME_MESSAGE: &str =
    "Bienvenido a Spartan, Comandante. Estoy listo para recibir tus órdenes.";

fn unrecognised_command_reply(command: &str) -> String {
    format!(
        "Comando \"{command}\" no reconocido. Intenta con \"entrenamiento\", \"nutrición\", \
         \"circadiano\", \"biométricos\", \"sobrecarga\" o \"longevidad\"."
    )
}

/// Identifies one in-flight generation. A result is applied only if its ticket
/// is still the one the slot (or overlay) is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    Pending { ticket: Ticket },
    Ready(Plan),
    Failed(FlowFailure),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Pending { .. } => "pending",
            FlowState::Ready(_) => "ready",
            FlowState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    draft: Profile,
    state: FlowState,
}

/// A frozen profile handed to the pipeline.
#[derive(Debug, Clone)]
pub struct Submission {
    pub domain: Domain,
    pub ticket: Ticket,
    pub profile: Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MealRef {
    pub day: usize,
    pub meal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecipeState {
    Pending,
    Ready(Recipe),
    Failed(FlowFailure),
}

#[derive(Debug, Clone)]
struct RecipeOverlay {
    key: MealRef,
    meal_name: String,
    ticket: Ticket,
    state: RecipeState,
}

#[derive(Debug, Clone)]
pub struct RecipeSubmission {
    pub ticket: Ticket,
    pub meal: Meal,
    pub plan: NutritionPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Views
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainView {
    pub domain: Domain,
    pub title: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub fields: Vec<FieldSpec>,
    pub values: Profile,
    /// Inputs and submit are disabled while a call is in flight.
    pub busy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    pub domain: Domain,
    pub title: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub active: Option<Domain>,
    pub domains: Vec<DomainSummary>,
    pub transcript: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub selected: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<DomainView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub day: usize,
    pub meal: usize,
    pub meal_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

// ────────────────────────────────────────────────────────────────────────────
// Workspace
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Workspace {
    slots: BTreeMap<Domain, Slot>,
    active: Option<Domain>,
    transcript: Vec<ChatMessage>,
    recipe: Option<RecipeOverlay>,
    next_ticket: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        let slots = Domain::ALL
            .into_iter()
            .map(|domain| {
                (
                    domain,
                    Slot {
                        draft: Profile::default_for(domain),
                        state: FlowState::Idle,
                    },
                )
            })
            .collect();

        Self {
            slots,
            active: None,
            transcript: vec![ChatMessage::new(Role::Assistant, WELCOME_MESSAGE)],
            recipe: None,
            next_ticket: 1,
        }
    }

    fn slot(&self, domain: Domain) -> &Slot {
        // Every domain is inserted in `new` and never removed.
        &self.slots[&domain]
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut Slot {
        self.slots
            .entry(domain)
            .or_insert_with(|| Slot {
                draft: Profile::default_for(domain),
                state: FlowState::Idle,
            })
    }

    fn issue_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    pub fn state(&self, domain: Domain) -> &FlowState {
        &self.slot(domain).state
    }

    pub fn overview(&self) -> Overview {
        Overview {
            active: self.active,
            domains: Domain::ALL
                .into_iter()
                .map(|domain| DomainSummary {
                    domain,
                    title: domain.title(),
                    status: self.state(domain).name(),
                })
                .collect(),
            transcript: self.transcript.clone(),
        }
    }

    /// Form while `Idle`/`Pending`/`Failed`, the plan while `Ready`.
    pub fn view(&self, domain: Domain) -> DomainView {
        let slot = self.slot(domain);
        let form = || FormView {
            fields: slot.draft.fields(),
            values: slot.draft.clone(),
            busy: matches!(slot.state, FlowState::Pending { .. }),
        };

        let (form, plan, error) = match &slot.state {
            FlowState::Idle | FlowState::Pending { .. } => (Some(form()), None, None),
            FlowState::Ready(plan) => (None, Some(plan.clone()), None),
            FlowState::Failed(failure) => (Some(form()), None, Some(failure.user_message())),
        };

        DomainView {
            domain,
            title: domain.title(),
            status: slot.state.name(),
            form,
            plan,
            error,
        }
    }

    /// Changes only which domain is visible. Other slots are untouched.
    pub fn select(&mut self, domain: Domain) -> DomainView {
        self.active = Some(domain);
        self.view(domain)
    }

    fn record(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        if self.transcript.len() > TRANSCRIPT_LIMIT {
            let excess = self.transcript.len() - TRANSCRIPT_LIMIT;
            self.transcript.drain(..excess);
        }
    }

    pub fn command(&mut self, command: &str) -> CommandOutcome {
        self.record(ChatMessage::new(Role::User, command));

        match Domain::from_command(command) {
            Some(domain) => CommandOutcome {
                selected: Some(domain),
                reply: None,
                view: Some(self.select(domain)),
            },
            None => {
                let reply = unrecognised_command_reply(command);
                self.record(ChatMessage::new(Role::Assistant, reply.clone()));
                CommandOutcome {
                    selected: self.active,
                    reply: Some(reply),
                    view: None,
                }
            }
        }
    }

    /// Edits one draft field. A successful edit clears a previous failure.
    pub fn set_field(
        &mut self,
        domain: Domain,
        name: &str,
        value: &str,
    ) -> Result<DomainView, AppError> {
        let slot = self.slot_mut(domain);
        match slot.state {
            FlowState::Pending { .. } => {
                return Err(AppError::Conflict(format!(
                    "The {domain} form is locked while a plan is being generated"
                )))
            }
            FlowState::Ready(_) => {
                return Err(AppError::Conflict(format!(
                    "Reset the {domain} plan before editing its profile"
                )))
            }
            FlowState::Idle | FlowState::Failed(_) => {}
        }

        slot.draft.set_field(name, value)?;
        if matches!(slot.state, FlowState::Failed(_)) {
            slot.state = FlowState::Idle;
        }
        Ok(self.view(domain))
    }

    /// Freezes the draft (optionally replaced wholesale first) and moves to `Pending`.
    /// Rejected submissions leave the slot exactly as it was.
    pub fn begin_submit(
        &mut self,
        domain: Domain,
        replacement: Option<Profile>,
    ) -> Result<Submission, AppError> {
        match self.slot(domain).state {
            FlowState::Pending { .. } => {
                return Err(AppError::Conflict(format!(
                    "A {domain} plan is already being generated"
                )))
            }
            FlowState::Ready(_) => {
                return Err(AppError::Conflict(format!(
                    "A {domain} plan already exists; reset it to generate a new one"
                )))
            }
            FlowState::Idle | FlowState::Failed(_) => {}
        }

        let profile = match replacement {
            Some(profile) if profile.domain() != domain => {
                return Err(AppError::Validation(format!(
                    "Profile for {} submitted to {domain}",
                    profile.domain()
                )))
            }
            Some(profile) => profile,
            None => self.slot(domain).draft.clone(),
        };
        profile.validate()?;

        let ticket = self.issue_ticket();
        let slot = self.slot_mut(domain);
        slot.draft = profile.clone();
        slot.state = FlowState::Pending { ticket };

        Ok(Submission {
            domain,
            ticket,
            profile,
        })
    }

    /// Applies a finished generation. Returns false when the slot is no longer
    /// waiting on `ticket`, in which case nothing changes.
    pub fn complete(
        &mut self,
        domain: Domain,
        ticket: Ticket,
        result: Result<Plan, FlowFailure>,
    ) -> bool {
        let slot = self.slot_mut(domain);
        match slot.state {
            FlowState::Pending { ticket: waiting } if waiting == ticket => {}
            _ => {
                debug!(%domain, "Stale generation result ignored");
                return false;
            }
        }

        match result {
            Ok(plan) if plan.domain() != domain => {
                slot.state = FlowState::Failed(FlowFailure::malformed(format!(
                    "{} plan delivered to {domain}",
                    plan.domain()
                )));
            }
            Ok(plan) => {
                debug!(%domain, headline = plan.headline(), "Plan ready");
                slot.state = FlowState::Ready(plan);
                slot.draft = Profile::default_for(domain);
            }
            Err(failure) => slot.state = FlowState::Failed(failure),
        }
        true
    }

    /// `Ready`/`Failed` back to `Idle`, discarding the plan.
    pub fn reset(&mut self, domain: Domain) -> Result<DomainView, AppError> {
        let slot = self.slot_mut(domain);
        if let FlowState::Pending { .. } = slot.state {
            return Err(AppError::Conflict(format!(
                "The {domain} plan is still being generated"
            )));
        }
        slot.state = FlowState::Idle;

        if domain == Domain::Nutrition {
            self.recipe = None;
        }
        Ok(self.view(domain))
    }

    // ── Recipe overlay ─────────────────────────────────────────────────────

    /// Opens (or replaces) the overlay for one meal of the current nutrition plan.
    pub fn open_recipe(&mut self, key: MealRef) -> Result<RecipeSubmission, AppError> {
        let FlowState::Ready(Plan::Nutrition(plan)) = self.state(Domain::Nutrition) else {
            return Err(AppError::Conflict(
                "Generate a nutrition plan before opening a recipe".to_string(),
            ));
        };
        let plan = plan.clone();
        let meal = plan.meal(key.day, key.meal).cloned().ok_or_else(|| {
            AppError::NotFound(format!("No meal {} on day {}", key.meal, key.day))
        })?;

        let ticket = self.issue_ticket();
        self.recipe = Some(RecipeOverlay {
            key,
            meal_name: meal.name.clone(),
            ticket,
            state: RecipeState::Pending,
        });

        Ok(RecipeSubmission { ticket, meal, plan })
    }

    pub fn complete_recipe(&mut self, ticket: Ticket, result: Result<Recipe, FlowFailure>) -> bool {
        match &mut self.recipe {
            Some(overlay)
                if overlay.ticket == ticket && overlay.state == RecipeState::Pending =>
            {
                overlay.state = match result {
                    Ok(recipe) => RecipeState::Ready(recipe),
                    Err(failure) => RecipeState::Failed(failure),
                };
                true
            }
            _ => {
                debug!("Stale recipe result ignored");
                false
            }
        }
    }

    /// Discards the overlay whatever its state. Returns whether one was open.
    pub fn close_recipe(&mut self) -> bool {
        self.recipe.take().is_some()
    }

    pub fn recipe_view(&self) -> Option<RecipeView> {
        let overlay = self.recipe.as_ref()?;
        let (status, recipe, error) = match &overlay.state {
            RecipeState::Pending => ("pending", None, None),
            RecipeState::Ready(recipe) => ("ready", Some(recipe.clone()), None),
            RecipeState::Failed(failure) => ("failed", None, Some(failure.user_message())),
        };
        Some(RecipeView {
            day: overlay.key.day,
            meal: overlay.key.meal,
            meal_name: overlay.meal_name.clone(),
            status,
            recipe,
            error,
        })
    }
}
