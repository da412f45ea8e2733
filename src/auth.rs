/// Who is signed in. Supplies the default client for saves that name none.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Fixed identity, set once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticUser {
    user: Option<String>,
}

impl StaticUser {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticUser {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}
