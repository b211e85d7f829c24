/// Header carrying the owner identity forwarded by the upstream gateway
pub const OWNER_ID_HEADER: &str = "x-owner-id";

/// Longest accepted owner identifier
pub const MAX_OWNER_ID_LENGTH: usize = 128;

/// Longest accepted customization text, in characters
pub const MAX_CUSTOMIZATION_LENGTH: u64 = 10_000;
