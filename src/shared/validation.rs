use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating owner identifiers forwarded by the gateway
    /// 1-128 characters of letters, digits and `_ . : @ | -`
    /// - Valid: "u1", "acct_42", "auth0|5f7c", "user@example.com"
    /// - Invalid: "", "has space", "tab\there", anything longer than 128 characters
    pub static ref OWNER_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.:@|\-]{1,128}$").unwrap();
}
