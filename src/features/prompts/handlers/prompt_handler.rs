use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, Owner};
use crate::features::prompts::dtos::{
    CustomizationResponseDto, EditResultDto, ResolvedPromptDto, SubmitCustomizationDto,
};
use crate::features::prompts::services::{CustomizationService, ResolverService};
use crate::shared::types::{ApiResponse, Meta};

/// Services shared by the prompt routes
#[derive(Clone)]
pub struct PromptState {
    pub resolver: Arc<ResolverService>,
    pub customizations: Arc<CustomizationService>,
}

/// List every prompt as the calling owner sees it
#[utoipa::path(
    get,
    path = "/api/prompts",
    responses(
        (status = 200, description = "Resolved prompts in catalog order", body = ApiResponse<Vec<ResolvedPromptDto>>),
        (status = 401, description = "Missing owner identity"),
        (status = 503, description = "Prompt storage unavailable")
    ),
    tag = "prompts",
    security(
        ("owner_id" = [])
    )
)]
pub async fn list_prompts(
    owner: Owner,
    State(state): State<PromptState>,
) -> Result<Json<ApiResponse<Vec<ResolvedPromptDto>>>> {
    let prompts: Vec<ResolvedPromptDto> = state
        .resolver
        .resolve(owner.as_str())
        .await?
        .into_iter()
        .map(ResolvedPromptDto::from)
        .collect();
    let total = prompts.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(prompts),
        None,
        Some(Meta { total }),
    )))
}

/// Get one prompt as the calling owner sees it
#[utoipa::path(
    get,
    path = "/api/prompts/{prompt_id}",
    params(
        ("prompt_id" = String, Path, description = "Base prompt ID")
    ),
    responses(
        (status = 200, description = "Resolved prompt", body = ApiResponse<ResolvedPromptDto>),
        (status = 404, description = "Prompt not found"),
        (status = 503, description = "Prompt storage unavailable")
    ),
    tag = "prompts",
    security(
        ("owner_id" = [])
    )
)]
pub async fn get_prompt(
    owner: Owner,
    State(state): State<PromptState>,
    Path(prompt_id): Path<String>,
) -> Result<Json<ApiResponse<ResolvedPromptDto>>> {
    let prompt = state.resolver.resolve_one(&prompt_id, owner.as_str()).await?;
    Ok(Json(ApiResponse::success(Some(prompt.into()), None, None)))
}

/// Set, replace or clear the calling owner's instruction for a prompt.
///
/// Blank content clears the customization; clearing one that does not exist
/// still succeeds with outcome `deleted`.
#[utoipa::path(
    put,
    path = "/api/prompts/{prompt_id}/customization",
    params(
        ("prompt_id" = String, Path, description = "Base prompt ID")
    ),
    request_body = SubmitCustomizationDto,
    responses(
        (status = 200, description = "Edit applied (created, updated or deleted)", body = ApiResponse<EditResultDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found"),
        (status = 503, description = "Prompt storage unavailable")
    ),
    tag = "prompts",
    security(
        ("owner_id" = [])
    )
)]
pub async fn submit_customization(
    owner: Owner,
    State(state): State<PromptState>,
    Path(prompt_id): Path<String>,
    AppJson(dto): AppJson<SubmitCustomizationDto>,
) -> Result<Json<ApiResponse<EditResultDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = state
        .customizations
        .submit_edit(&prompt_id, owner.as_str(), &dto.content)
        .await?;
    let message = format!("Customization {}", result.outcome.as_str());

    Ok(Json(ApiResponse::success(
        Some(result.into()),
        Some(message),
        None,
    )))
}

/// Delete the calling owner's instruction for a prompt
#[utoipa::path(
    delete,
    path = "/api/prompts/{prompt_id}/customization",
    params(
        ("prompt_id" = String, Path, description = "Base prompt ID")
    ),
    responses(
        (status = 200, description = "Customization deleted", body = ApiResponse<CustomizationResponseDto>),
        (status = 404, description = "No customization to delete"),
        (status = 503, description = "Prompt storage unavailable")
    ),
    tag = "prompts",
    security(
        ("owner_id" = [])
    )
)]
pub async fn delete_customization(
    owner: Owner,
    State(state): State<PromptState>,
    Path(prompt_id): Path<String>,
) -> Result<Json<ApiResponse<CustomizationResponseDto>>> {
    let removed = state
        .customizations
        .delete_customization(&prompt_id, owner.as_str())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(removed.into()),
        Some("Customization deleted".to_string()),
        None,
    )))
}
