use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::features::prompts::handlers::{self, PromptState};
use crate::features::prompts::services::{CustomizationService, ResolverService};

/// Create routes for resolved prompts and owner customizations
pub fn routes(
    resolver: Arc<ResolverService>,
    customizations: Arc<CustomizationService>,
) -> Router {
    let state = PromptState {
        resolver,
        customizations,
    };

    Router::new()
        .route("/api/prompts", get(handlers::list_prompts))
        .route("/api/prompts/{prompt_id}", get(handlers::get_prompt))
        .route(
            "/api/prompts/{prompt_id}/customization",
            put(handlers::submit_customization)
                .delete(handlers::delete_customization),
        )
        .with_state(state)
}
