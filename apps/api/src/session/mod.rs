// Session Gate. Wraps the identity provider and owns one ClientSession per signed-in
// browser, keyed by an opaque bearer token. Handlers receive the session explicitly
// through the `CurrentSession` extractor; nothing reads a global "current user".

pub mod identity;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::domains::{Domain, Profile};
use crate::errors::AppError;
use crate::flow;
use crate::llm_client::GenerationClient;
use crate::state::AppState;
use crate::workspace::{
    DomainView, MealRef, RecipeSubmission, RecipeView, Submission, Workspace,
};

pub use identity::{FirebaseIdentity, IdentityError, IdentityProvider, SessionUser};

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 12 * 60 * 60;

/// One signed-in client: its workspace and its presence channel.
pub struct ClientSession {
    user: SessionUser,
    signed_in_at: DateTime<Utc>,
    /// Unix milliseconds of the last authenticated request.
    last_active: AtomicI64,
    workspace: Mutex<Workspace>,
    presence: watch::Sender<Option<SessionUser>>,
}

impl ClientSession {
    fn new(user: SessionUser) -> Self {
        let (presence, _) = watch::channel(Some(user.clone()));
        let now = Utc::now();
        Self {
            user,
            signed_in_at: now,
            last_active: AtomicI64::new(now.timestamp_millis()),
            workspace: Mutex::new(Workspace::new()),
            presence,
        }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_active.load(Ordering::Relaxed))
            .single()
            .unwrap_or(self.signed_in_at)
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_active
            .fetch_max(now.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn is_present(&self) -> bool {
        self.presence.borrow().is_some()
    }

    pub fn observe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.presence.subscribe()
    }

    pub async fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().await
    }

    /// Runs one submission end to end. The generation call and the write-back run
    /// on their own task, so a request dropped mid-call still settles the slot once
    /// the model answers. The workspace lock is not held during the call.
    pub async fn generate(
        self: &Arc<Self>,
        client: Arc<dyn GenerationClient>,
        domain: Domain,
        replacement: Option<Profile>,
    ) -> Result<DomainView, AppError> {
        let submission = self.workspace().await.begin_submit(domain, replacement)?;

        let session = Arc::clone(self);
        tokio::spawn(async move { session.settle(client.as_ref(), submission).await })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("generation task failed: {e}")))?
    }

    async fn settle(
        &self,
        client: &dyn GenerationClient,
        submission: Submission,
    ) -> Result<DomainView, AppError> {
        let domain = submission.domain;
        let result = flow::run_profile(client, &submission.profile).await;

        if !self.is_present() {
            warn!(%domain, uid = %self.user.uid, "Session ended during generation; result dropped");
            return Err(AppError::Unauthorized);
        }

        let failure = result.as_ref().err().cloned();
        let mut workspace = self.workspace().await;
        if !workspace.complete(domain, submission.ticket, result) {
            return Err(AppError::Conflict(format!(
                "The {domain} submission was superseded"
            )));
        }

        match failure {
            Some(failure) => Err(failure.into()),
            None => Ok(workspace.view(domain)),
        }
    }

    /// Opens the recipe overlay for one meal and fills it on a detached task.
    pub async fn open_recipe(
        self: &Arc<Self>,
        client: Arc<dyn GenerationClient>,
        key: MealRef,
    ) -> Result<RecipeView, AppError> {
        let submission = self.workspace().await.open_recipe(key)?;

        let session = Arc::clone(self);
        tokio::spawn(async move { session.settle_recipe(client.as_ref(), submission).await })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("recipe task failed: {e}")))?
    }

    async fn settle_recipe(
        &self,
        client: &dyn GenerationClient,
        submission: RecipeSubmission,
    ) -> Result<RecipeView, AppError> {
        let result = flow::run_recipe(client, &submission.meal, &submission.plan).await;

        if !self.is_present() {
            warn!(uid = %self.user.uid, "Session ended during recipe generation; result dropped");
            return Err(AppError::Unauthorized);
        }

        let failure = result.as_ref().err().cloned();
        let mut workspace = self.workspace().await;
        if !workspace.complete_recipe(submission.ticket, result) {
            return Err(AppError::Conflict(
                "The recipe overlay was closed or replaced".to_string(),
            ));
        }

        match (failure, workspace.recipe_view()) {
            (Some(failure), _) => Err(failure.into()),
            (None, Some(view)) => Ok(view),
            (None, None) => Err(AppError::NotFound("No recipe is open".to_string())),
        }
    }

    fn end(&self) {
        self.presence.send_replace(None);
    }
}

pub struct SessionGate {
    provider: Option<Arc<dyn IdentityProvider>>,
    missing: Vec<&'static str>,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<ClientSession>>>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider: Some(provider),
            missing: Vec::new(),
            idle_timeout: idle_timeout(DEFAULT_IDLE_TIMEOUT_SECS),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// A gate with no provider: every gated operation reports a configuration error.
    pub fn unconfigured(missing: Vec<&'static str>) -> Self {
        Self {
            provider: None,
            missing,
            idle_timeout: idle_timeout(DEFAULT_IDLE_TIMEOUT_SECS),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        match &config.api_key {
            Some(api_key) if config.is_configured() => Ok(Self::new(Arc::new(
                FirebaseIdentity::new(api_key.clone(), config.api_base.clone())?,
            ))),
            _ => Ok(Self::unconfigured(config.missing_variables())),
        }
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout = idle_timeout(secs);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn IdentityProvider>, AppError> {
        self.provider.as_ref().ok_or_else(|| {
            AppError::Configuration(format!(
                "Identity provider is not configured. Set {} and restart the service.",
                if self.missing.is_empty() {
                    "the identity variables".to_string()
                } else {
                    self.missing.join(", ")
                }
            ))
        })
    }

    pub fn ensure_configured(&self) -> Result<(), AppError> {
        self.provider().map(|_| ())
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Uuid, SessionUser), AppError> {
        let provider = self.provider()?;
        let user = provider.sign_in_with_password(email, password).await?;

        self.cleanup_idle_sessions().await;

        let token = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(token, Arc::new(ClientSession::new(user.clone())));

        info!(uid = %user.uid, "User signed in");
        Ok((token, user))
    }

    /// Publishes absence and drops the session. Unknown tokens are a no-op.
    pub async fn sign_out(&self, token: Uuid) -> Result<(), AppError> {
        let provider = self.provider()?;
        let Some(session) = self.sessions.write().await.remove(&token) else {
            return Ok(());
        };

        session.end();
        if let Err(e) = provider.sign_out(session.user()).await {
            warn!(uid = %session.user().uid, "Identity sign-out failed: {e}");
        }
        info!(uid = %session.user().uid, "User signed out");
        Ok(())
    }

    /// Looks up a live session and marks it active. An idle-expired session is
    /// ended on the spot and reported as signed out.
    pub async fn resolve(&self, token: Uuid) -> Result<Arc<ClientSession>, AppError> {
        self.resolve_at(token, Utc::now()).await
    }

    async fn resolve_at(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Arc<ClientSession>, AppError> {
        self.provider()?;
        let session = self
            .sessions
            .read()
            .await
            .get(&token)
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        if session.last_active() < now - self.idle_timeout {
            self.sessions.write().await.remove(&token);
            session.end();
            info!(uid = %session.user().uid, "Idle session expired");
            return Err(AppError::Unauthorized);
        }

        session.touch(now);
        Ok(session)
    }

    /// Ends every session idle past the timeout. Returns how many were dropped.
    pub async fn cleanup_idle_sessions(&self) -> usize {
        self.cleanup_idle_before(Utc::now() - self.idle_timeout).await
    }

    async fn cleanup_idle_before(&self, cutoff: DateTime<Utc>) -> usize {
        let expired: Vec<Arc<ClientSession>> = {
            let mut sessions = self.sessions.write().await;
            let tokens: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, session)| session.last_active() < cutoff)
                .map(|(token, _)| *token)
                .collect();
            tokens
                .iter()
                .filter_map(|token| sessions.remove(token))
                .collect()
        };

        for session in &expired {
            session.end();
            info!(uid = %session.user().uid, "Cleaned up idle session");
        }
        expired.len()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Timeouts are capped at a year.
fn idle_timeout(secs: u64) -> Duration {
    const MAX_SECS: i64 = 365 * 24 * 60 * 60;
    Duration::seconds(i64::try_from(secs).unwrap_or(MAX_SECS).min(MAX_SECS))
}

// ────────────────────────────────────────────────────────────────────────────
// Extractors
// ────────────────────────────────────────────────────────────────────────────

/// Reads `Authorization: Bearer <token>` as a session token.
pub fn bearer_token(parts: &Parts) -> Result<Option<Uuid>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AppError::Unauthorized)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;
    Uuid::parse_str(token)
        .map(Some)
        .map_err(|_| AppError::Unauthorized)
}

/// The caller's session. Rejects with a configuration error before anything else
/// when no identity provider is set up.
pub struct CurrentSession {
    pub token: Uuid,
    pub session: Arc<ClientSession>,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        state.sessions.ensure_configured()?;
        let token = bearer_token(parts)?.ok_or(AppError::Unauthorized)?;
        let session = state.sessions.resolve(token).await?;
        Ok(Self { token, session })
    }
}

/// Like `CurrentSession`, but a missing token is not an error.
pub struct MaybeToken(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, AppError> {
        bearer_token(parts).map(MaybeToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        StaticIdentity, StubGenerationClient, NUTRITION_PLAN_JSON, RECIPE_JSON, TEST_EMAIL,
        TEST_PASSWORD, WORKOUT_PLAN_JSON,
    };
    use tokio::sync::Notify;

    fn gate() -> SessionGate {
        SessionGate::new(Arc::new(StaticIdentity))
    }

    #[tokio::test]
    async fn test_unconfigured_gate_reports_configuration_error() {
        let gate = SessionGate::unconfigured(vec!["IDENTITY_API_KEY"]);
        let err = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap_err();
        match err {
            AppError::Configuration(msg) => assert!(msg.contains("IDENTITY_API_KEY")),
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert!(matches!(
            gate.resolve(Uuid::new_v4()).await,
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_without_identity_is_unconfigured() {
        let gate = SessionGate::from_config(&IdentityConfig::default()).unwrap();
        assert!(!gate.is_configured());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let err = gate().sign_in(TEST_EMAIL, "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_sign_in_then_resolve() {
        let gate = gate();
        let (token, user) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();
        assert_eq!(session.user(), &user);
        assert!(session.is_present());
    }

    #[tokio::test]
    async fn test_sign_out_publishes_absence() {
        let gate = gate();
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let mut presence = gate.resolve(token).await.unwrap().observe();
        assert!(presence.borrow().is_some());

        gate.sign_out(token).await.unwrap();

        presence.changed().await.unwrap();
        assert!(presence.borrow().is_none());
        assert!(matches!(
            gate.resolve(token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let gate = gate();
        let (first, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let (second, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        let client = Arc::new(StubGenerationClient::replying(WORKOUT_PLAN_JSON));
        gate.resolve(first)
            .await
            .unwrap()
            .generate(client, Domain::Workout, None)
            .await
            .unwrap();

        let other = gate.resolve(second).await.unwrap();
        assert_eq!(other.workspace().await.state(Domain::Workout).name(), "idle");
    }

    #[tokio::test]
    async fn test_result_after_sign_out_is_ignored() {
        let gate = gate();
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();

        let release = Arc::new(Notify::new());
        let client = Arc::new(StubGenerationClient::replying(WORKOUT_PLAN_JSON).gated(release.clone()));

        let in_flight = {
            let session = session.clone();
            let client = client.clone();
            tokio::spawn(async move {
                session.generate(client, Domain::Workout, None).await
            })
        };

        while client.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.workspace().await.state(Domain::Workout).name(), "pending");

        gate.sign_out(token).await.unwrap();
        release.notify_one();

        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, Err(AppError::Unauthorized)));
        assert_eq!(session.workspace().await.state(Domain::Workout).name(), "pending");
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_and_is_recorded() {
        let gate = gate();
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();

        let client = Arc::new(StubGenerationClient::failing());
        let err = session
            .generate(client, Domain::Longevity, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
        assert_eq!(
            session.workspace().await.state(Domain::Longevity).name(),
            "failed"
        );
    }

    #[tokio::test]
    async fn test_dropped_request_still_settles_the_slot() {
        let gate = gate();
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();

        let release = Arc::new(Notify::new());
        let client = Arc::new(StubGenerationClient::replying(WORKOUT_PLAN_JSON).gated(release.clone()));

        let request = {
            let session = session.clone();
            let client = client.clone();
            tokio::spawn(async move { session.generate(client, Domain::Workout, None).await })
        };
        while client.calls() == 0 {
            tokio::task::yield_now().await;
        }

        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        release.notify_one();
        while session.workspace().await.state(Domain::Workout).name() == "pending" {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.workspace().await.state(Domain::Workout).name(), "ready");

        let view = session.workspace().await.reset(Domain::Workout).unwrap();
        assert_eq!(view.status, "idle");
        session
            .workspace()
            .await
            .set_field(Domain::Workout, "goal", "lose-fat")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_recipe_request_still_settles_the_overlay() {
        let gate = gate();
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();
        session
            .generate(
                Arc::new(StubGenerationClient::replying(NUTRITION_PLAN_JSON)),
                Domain::Nutrition,
                None,
            )
            .await
            .unwrap();

        let release = Arc::new(Notify::new());
        let client = Arc::new(StubGenerationClient::replying(RECIPE_JSON).gated(release.clone()));
        let request = {
            let session = session.clone();
            let client = client.clone();
            tokio::spawn(async move {
                session
                    .open_recipe(client, MealRef { day: 0, meal: 0 })
                    .await
            })
        };
        while client.calls() == 0 {
            tokio::task::yield_now().await;
        }

        request.abort();
        let _ = request.await;

        release.notify_one();
        loop {
            let status = session.workspace().await.recipe_view().map(|v| v.status);
            if status != Some("pending") {
                assert_eq!(status, Some("ready"));
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_idle_session_expires_on_resolve() {
        let gate = gate().with_idle_timeout(60);
        let (token, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let session = gate.resolve(token).await.unwrap();
        let mut presence = session.observe();

        let later = Utc::now() + Duration::seconds(30);
        assert!(gate.resolve_at(token, later).await.is_ok());

        let much_later = later + Duration::seconds(61);
        assert!(matches!(
            gate.resolve_at(token, much_later).await,
            Err(AppError::Unauthorized)
        ));
        presence.changed().await.unwrap();
        assert!(presence.borrow().is_none());
        assert_eq!(gate.len().await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_drops_only_idle_sessions() {
        let gate = gate();
        let (stale, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        let (fresh, _) = gate.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        let cutoff = Utc::now() + Duration::minutes(5);
        gate.resolve(fresh)
            .await
            .unwrap()
            .touch(cutoff + Duration::minutes(1));

        assert_eq!(gate.cleanup_idle_before(cutoff).await, 1);
        assert_eq!(gate.len().await, 1);
        assert!(gate.resolve(fresh).await.is_ok());
        assert!(matches!(
            gate.resolve(stale).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let (parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), Some(token));

        let (parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_err());

        let (parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), None);
    }
}
