//! Typed backend endpoints.
//!
//! Each method picks the endpoint key, cache policy and retry policy for one
//! backend route, then unwraps the backend's response envelope.

use std::time::Duration;

use futures_util::future::join3;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::RetryConfig;
use crate::error::{ApiError, ApiResult, TransportErrorCode};
use crate::service::options::RequestOptions;
use crate::service::types::{
    AuthPayload, BlockPositions, Enrichment, News, OptionsData, PaymentLink, Performance, Plan,
    PositionBlocks, Question, QuestionRequest, RankingEntry, SignupRequest, SimulationResult, User,
};
use crate::service::ApiService;

const OPTIONS_TTL: Duration = Duration::from_secs(10 * 60);
const PLANS_TTL: Duration = Duration::from_secs(10 * 60);
const RANKING_TTL: Duration = Duration::from_secs(60);
const PERFORMANCE_TTL: Duration = Duration::from_secs(60);
const PROFILE_TTL: Duration = Duration::from_secs(2 * 60);

const PROFILE_PATH: &str = "/api/user/profile";
const PERFORMANCE_PATH: &str = "/api/performance";
const RANKING_PATH: &str = "/api/ranking";
const OPTIONS_PATH: &str = "/api/opcoes/cargos-blocos";
const BLOCK_OPTIONS_PATH: &str = "/api/opcoes/blocos-cargos";

/// Unwrap `{success, data}` and `{sucesso, dados, erro}` envelopes.
///
/// A failure envelope becomes [`ApiError::Rejected`]; anything else passes through.
pub fn unwrap_envelope(value: Value) -> ApiResult<Value> {
    let Value::Object(mut body) = value else {
        return Ok(value);
    };

    if let Some(ok) = body.get("sucesso").and_then(Value::as_bool) {
        if ok {
            return Ok(body.remove("dados").unwrap_or(Value::Null));
        }
        return Err(ApiError::Rejected(rejection_message(&body, &["erro", "message"])));
    }

    match body.get("success").and_then(Value::as_bool) {
        Some(false) => Err(ApiError::Rejected(rejection_message(&body, &["error", "message"]))),
        Some(true) if body.contains_key("data") => Ok(body.remove("data").unwrap_or(Value::Null)),
        _ => Ok(Value::Object(body)),
    }
}

/// Whether `value` is an envelope reporting failure.
pub fn is_failure_envelope(value: &Value) -> bool {
    ["sucesso", "success"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_bool))
        == Some(false)
}

fn rejection_message(body: &serde_json::Map<String, Value>, fields: &[&str]) -> String {
    fields
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .unwrap_or("request rejected by backend")
        .to_string()
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    let data = unwrap_envelope(value)?;
    serde_json::from_value(data).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn to_body<T: Serialize>(payload: &T) -> ApiResult<Value> {
    serde_json::to_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
}

impl ApiService {
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        decode(self.request_value(method, path, options).await?)
    }

    /// Retry policy for question generation, which fails in more ways upstream.
    pub fn question_generation_retry(&self) -> RetryConfig {
        let mut retry = self.config().retries.clone();
        retry.max_retries = retry.max_retries.max(3);
        retry.retryable.error_codes.push(TransportErrorCode::Other);
        retry.retryable.statuses.extend([520, 522, 524]);
        retry
            .retryable
            .message_keywords
            .extend(["socket hang up".to_string(), "econnrefused".to_string()]);
        retry
    }

    pub async fn health_check(&self) -> ApiResult<Value> {
        self.request_value(
            Method::GET,
            "/health",
            RequestOptions::new().retry(RetryConfig::no_retry()),
        )
        .await
    }

    /// Authenticate and store the session token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthPayload> {
        let options = RequestOptions::new()
            .body(json!({ "email": email, "password": password }))
            .no_dedupe();
        let auth: AuthPayload = self.call(Method::POST, "/api/auth/login", options).await?;
        self.start_session(&auth);
        Ok(auth)
    }

    /// Create an account and store the session token.
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthPayload> {
        let options = RequestOptions::new().body(to_body(request)?).no_dedupe();
        let auth: AuthPayload = self.call(Method::POST, "/api/auth/signup", options).await?;
        self.start_session(&auth);
        Ok(auth)
    }

    fn start_session(&self, auth: &AuthPayload) {
        self.session().set_token(auth.token.clone());
        self.clear_cache(Some(PROFILE_PATH));
        tracing::info!(user = %auth.user.id, "Session started");
    }

    /// Forget the token and every cached per-user response.
    pub fn logout(&self) {
        self.session().clear();
        for path in [PROFILE_PATH, PERFORMANCE_PATH] {
            self.clear_cache(Some(path));
        }
        tracing::info!("Session ended");
    }

    pub async fn get_profile(&self) -> ApiResult<User> {
        let options = RequestOptions::new().cache_ttl(PROFILE_TTL);
        self.call(Method::GET, PROFILE_PATH, options).await
    }

    pub async fn update_profile(&self, user: &User) -> ApiResult<User> {
        let options = RequestOptions::new().body(to_body(user)?);
        let updated = self.call(Method::PUT, PROFILE_PATH, options).await?;
        self.clear_cache(Some(PROFILE_PATH));
        Ok(updated)
    }

    pub async fn generate_questions(&self, request: &QuestionRequest) -> ApiResult<Vec<Question>> {
        let options = RequestOptions::new()
            .body(to_body(request)?)
            .retry(self.question_generation_retry());
        self.call(Method::POST, "/api/questoes/gerar", options).await
    }

    pub async fn submit_simulation(
        &self,
        answers: &[u32],
        question_ids: &[String],
    ) -> ApiResult<SimulationResult> {
        let options = RequestOptions::new()
            .body(json!({ "answers": answers, "questionIds": question_ids }))
            .no_dedupe();
        let result = self.call(Method::POST, "/api/simulados/submit", options).await?;
        self.clear_cache(Some(PERFORMANCE_PATH));
        self.clear_cache(Some(RANKING_PATH));
        Ok(result)
    }

    /// Memorization tips for a question.
    pub async fn get_study_tips(&self, question_id: &str) -> ApiResult<Enrichment> {
        self.enrichment("macetes", question_id).await
    }

    pub async fn get_key_points(&self, question_id: &str) -> ApiResult<Enrichment> {
        self.enrichment("pontos-centrais", question_id).await
    }

    pub async fn get_further_topics(&self, question_id: &str) -> ApiResult<Enrichment> {
        self.enrichment("outras-exploracoes", question_id).await
    }

    async fn enrichment(&self, kind: &str, question_id: &str) -> ApiResult<Enrichment> {
        let path = format!("/api/questoes/{}/{}", kind, encode_segment(question_id));
        let options = RequestOptions::new()
            .cached()
            .endpoint(format!("GET /api/questoes/{}/:id", kind));
        self.call(Method::GET, &path, options).await
    }

    /// Ask the tutor chat about a question.
    pub async fn ask_question_chat(
        &self,
        question_id: &str,
        user_id: &str,
        message: &str,
    ) -> ApiResult<Enrichment> {
        let options = RequestOptions::new()
            .body(json!({
                "questao_id": question_id,
                "usuario_id": user_id,
                "mensagem": message,
            }))
            .no_dedupe();
        self.call(Method::POST, "/api/questoes/chat-duvidas", options).await
    }

    pub async fn get_performance(&self) -> ApiResult<Performance> {
        let options = RequestOptions::new().cache_ttl(PERFORMANCE_TTL);
        self.call(Method::GET, PERFORMANCE_PATH, options).await
    }

    pub async fn get_plans(&self) -> ApiResult<Vec<Plan>> {
        let options = RequestOptions::new().cache_ttl(PLANS_TTL);
        self.call(Method::GET, "/api/plans", options).await
    }

    pub async fn get_ranking(&self) -> ApiResult<Vec<RankingEntry>> {
        let options = RequestOptions::new().cache_ttl(RANKING_TTL);
        self.call(Method::GET, RANKING_PATH, options).await
    }

    pub async fn get_news(&self) -> ApiResult<Vec<News>> {
        let options = RequestOptions::new().cached();
        self.call(Method::GET, "/api/news", options).await
    }

    /// Start checkout for a plan.
    pub async fn create_payment(&self, plan_id: &str) -> ApiResult<PaymentLink> {
        let options = RequestOptions::new()
            .body(json!({ "plano": plan_id }))
            .no_dedupe();
        self.call(Method::POST, "/api/pagamentos/criar", options).await
    }

    /// Every position and study block, plus which blocks each position covers.
    pub async fn get_options_data(&self) -> ApiResult<OptionsData> {
        let options = RequestOptions::new().cache_ttl(OPTIONS_TTL);
        self.call(Method::GET, OPTIONS_PATH, options).await
    }

    pub async fn get_blocks_for_position(&self, position: &str) -> ApiResult<PositionBlocks> {
        let path = format!("/api/opcoes/blocos/{}", encode_segment(position));
        let options = RequestOptions::new()
            .cache_ttl(OPTIONS_TTL)
            .endpoint("GET /api/opcoes/blocos/:cargo");
        self.call(Method::GET, &path, options).await
    }

    /// Options data indexed the other way: the positions each block serves.
    pub async fn get_block_options(&self) -> ApiResult<OptionsData> {
        let options = RequestOptions::new().cache_ttl(OPTIONS_TTL);
        self.call(Method::GET, BLOCK_OPTIONS_PATH, options).await
    }

    pub async fn get_positions_for_block(&self, block: &str) -> ApiResult<BlockPositions> {
        let path = format!("/api/opcoes/cargos/{}", encode_segment(block));
        let options = RequestOptions::new()
            .cache_ttl(OPTIONS_TTL)
            .endpoint("GET /api/opcoes/cargos/:bloco");
        self.call(Method::GET, &path, options).await
    }

    /// Warm the cache with options, plans and news.
    ///
    /// Failures are logged and skipped. Returns how many loads succeeded.
    pub async fn preload_critical_data(&self) -> usize {
        let (options, plans, news) =
            join3(self.get_options_data(), self.get_plans(), self.get_news()).await;

        let outcomes = [
            ("options", options.err()),
            ("plans", plans.err()),
            ("news", news.err()),
        ];
        let mut loaded = 0;
        for (name, error) in outcomes {
            match error {
                None => loaded += 1,
                Some(e) => tracing::warn!(data = name, error = %e, "Preload failed"),
            }
        }
        tracing::info!(loaded, total = 3, "Critical data preloaded");
        loaded
    }
}

/// Percent-encode a single path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
