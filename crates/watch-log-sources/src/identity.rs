use std::fmt;
use watch_log_config::{is_valid_user_id, Config};

/// Environment variable overriding the configured user
pub const USER_ENV_VAR: &str = "REELOG_USER";

/// Identifier scoping which collection snapshot is subscribed to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for ids that are not safe to use as a store key
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        is_valid_user_id(&id).then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the current user; authentication itself happens elsewhere
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity taken from `REELOG_USER` or the `[user]` config section
#[derive(Debug, Clone)]
pub struct ConfiguredIdentity {
    user: Option<UserId>,
}

impl ConfiguredIdentity {
    pub fn from_config(config: &Config) -> Self {
        let from_env = std::env::var(USER_ENV_VAR).ok().and_then(UserId::new);
        let user = from_env.or_else(|| config.user_id().and_then(UserId::new));
        Self { user }
    }

    pub fn fixed(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for ConfiguredIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}
