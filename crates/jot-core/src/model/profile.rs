use serde::{Deserialize, Serialize};

/// Read-only public profile shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub handle: String,
    pub avatar_url: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl Profile {
    /// Display name, or the placeholder used when the user has not set one.
    #[must_use]
    pub fn display_name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or("No name")
    }

    /// Bio, or the placeholder used when the user has not set one.
    #[must_use]
    pub fn bio_or_default(&self) -> &str {
        self.bio.as_deref().unwrap_or("No bio")
    }
}

/// JSON body returned by `GET /users/{handle}`.
///
/// Field names are the wire contract. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub login: String,
    pub avatar_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl From<UserPayload> for Profile {
    fn from(payload: UserPayload) -> Self {
        Self {
            handle: payload.login,
            avatar_url: payload.avatar_url,
            display_name: payload.name,
            bio: payload.bio,
        }
    }
}

/// Tri-state profile value observed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum ProfileView {
    /// No data and no error yet. Re-entered at the start of every fetch.
    #[default]
    Loading,
    Loaded(Profile),
    /// Terminal for one attempt; carries a human-readable message.
    Failed(String),
}

impl ProfileView {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Loaded(profile) => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}
