pub mod catalog;
pub mod customization_service;
pub mod customization_store;
pub mod resolver_service;

pub use catalog::{PgPromptCatalog, PromptCatalog};
pub use customization_service::{CustomizationService, EditOutcome, EditResult};
pub use customization_store::{CustomizationStore, PgCustomizationStore};
pub use resolver_service::ResolverService;
