//! Prompt catalog with per-owner instruction overrides.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/prompts` | List prompts resolved for the owner |
//! | GET | `/api/prompts/{prompt_id}` | Get one resolved prompt |
//! | PUT | `/api/prompts/{prompt_id}/customization` | Create, update or clear the owner's instruction |
//! | DELETE | `/api/prompts/{prompt_id}/customization` | Delete the owner's instruction |
//!
//! The owner is taken from the `X-Owner-Id` header set by the gateway.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{
    CustomizationService, PgCustomizationStore, PgPromptCatalog, ResolverService,
};
