use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers};
use crate::features::prompts::services::EditOutcome;
use crate::shared::constants::OWNER_ID_HEADER;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Prompts
        prompts_handlers::prompt_handler::list_prompts,
        prompts_handlers::prompt_handler::get_prompt,
        prompts_handlers::prompt_handler::submit_customization,
        prompts_handlers::prompt_handler::delete_customization,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Prompts
            EditOutcome,
            prompts_dtos::ResolvedPromptDto,
            prompts_dtos::SubmitCustomizationDto,
            prompts_dtos::CustomizationResponseDto,
            prompts_dtos::EditResultDto,
            ApiResponse<Vec<prompts_dtos::ResolvedPromptDto>>,
            ApiResponse<prompts_dtos::ResolvedPromptDto>,
            ApiResponse<prompts_dtos::EditResultDto>,
            ApiResponse<prompts_dtos::CustomizationResponseDto>,
        )
    ),
    tags(
        (name = "prompts", description = "Prompt catalog resolved per owner, with instruction overrides"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Prompt Studio API",
        version = "0.1.0",
        description = "Prompt catalog and per-owner instruction overrides",
    )
)]
pub struct ApiDoc;

/// Documents the gateway-provided owner header as an API key scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "owner_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(OWNER_ID_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
