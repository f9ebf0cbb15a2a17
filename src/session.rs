/// Who is using the client. Passed explicitly into the views that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user_id: Option<String>,
}

pub const ANONYMOUS_USER: &str = "anonymous";

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Id attached to submitted ratings
    pub fn rating_user_id(&self) -> String {
        self.user_id().unwrap_or(ANONYMOUS_USER).to_string()
    }
}
