/// The all-zero token the router hands out when no session exists.
pub const INVALID_SID: &str = "0000000000000000";

/// Opaque session token issued by the router after a successful login.
///
/// Immutable once constructed. A session swaps the whole value on
/// login, invalidate, and logout rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The sentinel "no session" identity.
    pub fn invalid() -> Self {
        Self(INVALID_SID.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A token is valid unless it is empty, the zero sentinel, or any
    /// other string that parses as the unsigned integer zero.
    pub fn is_valid(&self) -> bool {
        if self.0.is_empty() || self.0 == INVALID_SID {
            return false;
        }
        !matches!(self.0.parse::<u64>(), Ok(0))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::invalid()
    }
}
