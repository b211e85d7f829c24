pub mod base_prompt;
pub mod customization;
pub mod resolved_prompt;

pub use base_prompt::BasePrompt;
pub use customization::{normalize_content, Customization, CustomizationKey};
pub use resolved_prompt::ResolvedPrompt;
