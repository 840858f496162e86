// Onboarding pipeline: Profile -> GenerationRequest -> raw text -> typed Plan.
// One generic flow, instantiated per domain through `DomainSpec`.
// Validation happens before a submission gets here; this module only generates and maps.

pub mod mapper;

use std::marker::PhantomData;

use tracing::{info, warn};

use crate::domains::circadian::Circadian;
use crate::domains::longevity::Longevity;
use crate::domains::nutrition::{self, Meal, Nutrition, NutritionPlan, Recipe};
use crate::domains::overload::Overload;
use crate::domains::wearable::Wearable;
use crate::domains::workout::Workout;
use crate::domains::{DomainSpec, Plan, Profile};
use crate::llm_client::{GenerationClient, GenerationRequest};

pub use mapper::{map_result, FlowFailure};

pub struct OnboardingFlow<D: DomainSpec>(PhantomData<D>);

impl<D: DomainSpec> OnboardingFlow<D> {
    /// Exactly one generation call. No retries, no caching.
    pub async fn run(
        client: &dyn GenerationClient,
        profile: &D::Profile,
    ) -> Result<D::Plan, FlowFailure> {
        let request = D::build_request(profile);
        generate_and_map(client, &request, D::DOMAIN.as_str()).await
    }
}

/// Dispatches a type-erased profile to its domain's flow.
pub async fn run_profile(
    client: &dyn GenerationClient,
    profile: &Profile,
) -> Result<Plan, FlowFailure> {
    match profile {
        Profile::Workout(p) => OnboardingFlow::<Workout>::run(client, p)
            .await
            .map(Plan::Workout),
        Profile::Nutrition(p) => OnboardingFlow::<Nutrition>::run(client, p)
            .await
            .map(Plan::Nutrition),
        Profile::Circadian(p) => OnboardingFlow::<Circadian>::run(client, p)
            .await
            .map(Plan::Circadian),
        Profile::Wearable(p) => OnboardingFlow::<Wearable>::run(client, p)
            .await
            .map(Plan::Wearable),
        Profile::Overload(p) => OnboardingFlow::<Overload>::run(client, p)
            .await
            .map(Plan::Overload),
        Profile::Longevity(p) => OnboardingFlow::<Longevity>::run(client, p)
            .await
            .map(Plan::Longevity),
    }
}

/// Recipe detail for one meal of a nutrition plan.
pub async fn run_recipe(
    client: &dyn GenerationClient,
    meal: &Meal,
    plan: &NutritionPlan,
) -> Result<Recipe, FlowFailure> {
    let request = nutrition::recipe_request(meal, plan);
    generate_and_map(client, &request, "recipe").await
}

async fn generate_and_map<T: serde::de::DeserializeOwned>(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    label: &str,
) -> Result<T, FlowFailure> {
    info!(flow = label, "Generation started");

    let raw = client.generate(request).await.map_err(|e| {
        warn!(flow = label, kind = "generation", "Generation call failed: {e}");
        FlowFailure::generation(e.to_string())
    })?;

    let result = map_result(&raw, &request.schema).map_err(|failure| {
        warn!(
            flow = label,
            kind = "malformed_result",
            "Model output rejected: {}",
            failure.detail
        );
        failure
    })?;

    info!(flow = label, "Generation finished");
    Ok(result)
}
