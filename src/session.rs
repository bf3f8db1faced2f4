use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token for the catalog API. Lives only as long as the [`Session`]
/// that holds it and is never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for a blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// The signed-in user's session. Created at sign-in, torn down at sign-out,
/// and passed explicitly to whatever needs the token.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<Credential>,
    profile: UserProfile,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            profile: UserProfile::default(),
        }
    }

    /// The latest credential, or `None` if sign-in has not completed.
    pub fn current_token(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Replaces the credential. A refreshed token from the identity provider
    /// arrives here as a fresh sign-in.
    pub fn sign_in(&mut self, credential: Credential) {
        self.credential = Some(credential);
        self.profile = UserProfile::default();
    }

    pub fn sign_out(&mut self) {
        self.credential = None;
        self.profile = UserProfile::default();
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        if self.credential.is_some() {
            self.profile = profile;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_not_a_credential() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" abc ").unwrap().bearer(), "abc");
    }

    #[test]
    fn sign_out_discards_token_and_profile() {
        let mut session = Session::signed_in(Credential::new("tok").unwrap());
        session.set_profile(UserProfile {
            display_name: Some("dj".into()),
            avatar_url: None,
        });
        assert!(session.is_authenticated());

        session.sign_out();
        assert!(session.current_token().is_none());
        assert_eq!(session.profile(), &UserProfile::default());
    }

    #[test]
    fn profile_ignored_without_credential() {
        let mut session = Session::signed_out();
        session.set_profile(UserProfile {
            display_name: Some("ghost".into()),
            avatar_url: None,
        });
        assert!(session.profile().display_name.is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let cred = Credential::new("super-secret").unwrap();
        assert!(!format!("{:?}", cred).contains("super-secret"));
    }
}
