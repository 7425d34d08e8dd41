//! API Handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use prereq_core::{sort_for_display, RulePatch, RuleScope};
use prereq_engine::{ComplianceEvaluator, EngineError, RuleMutationService, RuleResolver};
use serde::{Deserialize, Serialize};

use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

// ============ Response Types ============

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
        })
    }
}

/// Engine error rendered as `{"success": false, "error": {"kind", "message"}}`
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::DuplicateRule { .. } => StatusCode::CONFLICT,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============ Request Types ============

/// `?client=` selects a client's rules; absent, empty or `none` means global only
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub client: Option<String>,
    /// Evaluation date, defaults to the server's local date
    pub today: Option<NaiveDate>,
}

impl ScopeQuery {
    fn client_id(&self) -> Option<&str> {
        self.client
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("none"))
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
pub struct PersonQuery {
    pub person: String,
    pub client: Option<String>,
    pub today: Option<NaiveDate>,
}

impl PersonQuery {
    fn scope(&self) -> ScopeQuery {
        ScopeQuery {
            client: self.client.clone(),
            today: self.today,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    pub document_type: String,
    #[serde(default)]
    pub validity_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedRule {
    pub id: String,
}

fn actor(state: &AppState, headers: &HeaderMap) -> String {
    headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(state.default_actor.as_str())
        .to_string()
}

fn person_id(raw: &str) -> ApiResult<String> {
    prereq_core::Rut::parse(raw)
        .map(|rut| rut.to_string())
        .map_err(|e| ApiError(e.into()))
}

// ============ Handlers ============

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Effective rules for a client, in display order
pub async fn effective_rules(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ScopeQuery>,
) -> ApiResult<impl IntoResponse> {
    let mut rules = RuleResolver::new(&state.engine)
        .resolve_effective_rules(query.client_id())
        .await?;
    sort_for_display(&mut rules);
    Ok(ApiResponse::success(rules))
}

/// Compliance of one person
pub async fn compliance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PersonQuery>,
) -> ApiResult<impl IntoResponse> {
    let person_id = person_id(&query.person)?;
    let scope = query.scope();
    let result = ComplianceEvaluator::new(&state.engine)
        .evaluate(&person_id, scope.client_id(), scope.today())
        .await?;
    Ok(ApiResponse::success(result))
}

/// Partially compliant persons of a client
pub async fn partial_compliance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ScopeQuery>,
) -> ApiResult<impl IntoResponse> {
    let client_id = query
        .client_id()
        .ok_or_else(|| EngineError::InvalidInput("client is required".to_string()))?;
    let entries = ComplianceEvaluator::new(&state.engine)
        .partial_compliance(client_id, query.today())
        .await?;
    Ok(ApiResponse::success(entries))
}

/// One person's documents with their state
pub async fn documents(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PersonQuery>,
) -> ApiResult<impl IntoResponse> {
    let person_id = person_id(&query.person)?;
    let scope = query.scope();
    let rows = ComplianceEvaluator::new(&state.engine)
        .document_report(&person_id, scope.client_id(), scope.today())
        .await?;
    Ok(ApiResponse::success(rows))
}

/// Create a rule
pub async fn create_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateRuleRequest>,
) -> ApiResult<impl IntoResponse> {
    let scope = RuleScope::from_client(payload.client_id.as_deref());
    let id = RuleMutationService::new(&state.engine)
        .as_actor(&actor(&state, &headers))
        .create(scope, &payload.document_type, payload.validity_days)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(CreatedRule { id })))
}

/// Rename a rule or change its validity window
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(patch): ApiJson<RulePatch>,
) -> ApiResult<impl IntoResponse> {
    let rule = RuleMutationService::new(&state.engine)
        .as_actor(&actor(&state, &headers))
        .update(&id, &patch)
        .await?;
    Ok(ApiResponse::success(rule))
}

/// Delete a rule from the scope named by `?client=`
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ScopeQuery>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    RuleMutationService::new(&state.engine)
        .as_actor(&actor(&state, &headers))
        .delete(&id, &RuleScope::from_client(query.client_id()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
