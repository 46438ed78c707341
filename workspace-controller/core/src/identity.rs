use thiserror::Error;

/// Namespaces are DNS-1123 labels.
pub const NAME_MAX_LEN: usize = 63;

const VALID_NAME_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789-";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InvalidName {
    #[error("workspace name must not be empty")]
    Empty,

    #[error("workspace name must be at most {} characters", NAME_MAX_LEN)]
    TooLong,

    /// Only lowercase letters, digits and dashes are allowed.
    #[error("workspace name may only contain lowercase letters, numbers, and dashes")]
    BadChar,

    #[error("workspace name must start and end with a letter or number")]
    BadEdge,
}

/// `<workspace>-quota`
pub fn quota_name(workspace: &str) -> String {
    format!("{}-quota", workspace)
}

/// Validates that a workspace name can name a namespace.
///
/// Every managed resource is derived from this name, so it is checked before
/// anything is projected.
pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }
    if name.len() > NAME_MAX_LEN {
        return Err(InvalidName::TooLong);
    }
    if name.chars().any(|c| !VALID_NAME_CHARS.contains(c)) {
        return Err(InvalidName::BadChar);
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(InvalidName::BadEdge);
    }
    Ok(())
}
