use chrono::{DateTime, Utc};

pub type UserId = i64;

/// Per-user preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSettings {
    /// Generate 50-symbol public ids instead of 5-symbol ones.
    pub long_ids: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A person talking to the bot. Created on first inbound event and patched
/// in place when Telegram-supplied profile fields change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_admin: bool,
    /// Acquisition tag captured from the first `/start ref_…` payload.
    pub ref_tag: Option<String>,
    pub settings: UserSettings,
    pub joined_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Applies profile fields from Telegram, stamping `updated_at` when
    /// something actually changed.
    pub fn patch_profile(
        &mut self,
        first_name: &str,
        last_name: Option<&str>,
        username: Option<&str>,
    ) -> bool {
        let changed = self.first_name != first_name
            || self.last_name.as_deref() != last_name
            || self.username.as_deref() != username;
        if !changed {
            return false;
        }
        self.first_name = first_name.to_owned();
        self.last_name = last_name.map(str::to_owned);
        self.username = username.map(str::to_owned);
        self.updated_at = Some(Utc::now());
        true
    }

    /// Flips the long-ids preference, stamping the settings timestamp.
    pub fn toggle_long_ids(&mut self) -> bool {
        self.settings.long_ids = !self.settings.long_ids;
        self.settings.updated_at = Some(Utc::now());
        self.settings.long_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user() -> User {
        User {
            id: 1,
            first_name: "Ann".into(),
            last_name: None,
            username: Some("ann".into()),
            language_code: None,
            is_admin: false,
            ref_tag: None,
            settings: UserSettings::default(),
            joined_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn patch_is_a_noop_for_identical_profile() {
        let mut u = user();
        assert!(!u.patch_profile("Ann", None, Some("ann")));
        assert_eq!(u.updated_at, None);
    }

    #[test]
    fn patch_stamps_updated_at_on_change() {
        let mut u = user();
        assert!(u.patch_profile("Ann", None, Some("annie")));
        assert_eq!(u.username.as_deref(), Some("annie"));
        assert!(u.updated_at.is_some());
    }

    #[test]
    fn toggling_long_ids_flips_and_stamps() {
        let mut u = user();
        assert!(u.toggle_long_ids());
        assert!(!u.toggle_long_ids());
        assert!(u.settings.updated_at.is_some());
    }
}
