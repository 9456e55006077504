//! Query, routing and tool registration endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiState;
use crate::context::ConversationContext;
use crate::gateway::{GatewayResponse, ToolInfo};
use crate::router::RoutingDecision;

/// Build gateway router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/route", post(route))
        .route("/register_tool", post(register_tool))
        .route("/tools", get(tools))
        .with_state(state)
}

/// Query request
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub query: String,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

/// Process a text query
///
/// Failed queries still answer 200 with `success: false`.
async fn process(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<GatewayResponse>, GatewayError> {
    if request.query.trim().is_empty() {
        return Err(GatewayError::BadRequest("empty query"));
    }

    let response = state
        .gateway
        .process_query(&request.query, request.context)
        .await;

    Ok(Json(response))
}

/// Routing request
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub query: String,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

/// Classify a query without running it
async fn route(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RouteRequest>,
) -> Json<RoutingDecision> {
    Json(state.gateway.route(&request.query, request.context.as_ref()))
}

/// Tool registration request
#[derive(Debug, Deserialize)]
pub struct RegisterToolRequest {
    pub name: String,
    #[serde(default)]
    pub schema: Value,
}

/// Tool registration response
#[derive(Debug, Serialize)]
pub struct RegisterToolResponse {
    pub success: bool,
    pub tool: String,
}

/// Register a tool schema
async fn register_tool(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RegisterToolRequest>,
) -> Result<Json<RegisterToolResponse>, GatewayError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(GatewayError::BadRequest("empty tool name"));
    }

    state.gateway.register_tool(name, request.schema);
    tracing::info!(tool = %name, "tool registered over HTTP");

    Ok(Json(RegisterToolResponse {
        success: true,
        tool: name.to_string(),
    }))
}

/// Tool listing response
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

/// List registered tools
async fn tools(State(state): State<Arc<ApiState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.gateway.list_tools(),
    })
}

/// Gateway API errors
#[derive(Debug)]
pub enum GatewayError {
    BadRequest(&'static str),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
