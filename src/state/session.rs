/// Caller context passed explicitly into every room operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque token identifying the caller inside a room.
    pub identity: String,
}

impl Session {
    /// Context for the caller identified by `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// Caller identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}
