use axum::{Json, extract::State};
use finquest_api::CapabilitiesResponse;

use crate::Advisor;

/// GET /api/capabilities: runtime feature availability.
pub async fn capabilities(State(advisor): State<Advisor>) -> Json<CapabilitiesResponse> {
    let provider = advisor.provider();
    Json(CapabilitiesResponse {
        advisor_enabled: provider.is_some(),
        llm_provider: provider.map(|p| p.as_str().to_string()),
    })
}
