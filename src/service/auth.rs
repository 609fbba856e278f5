//! User upsert: every inbound event passes through here before anything
//! else runs, so handlers always work with a stored `User`.

use std::sync::Arc;

use chrono::Utc;

use crate::core::errors::AppError;
use crate::domain::{User, UserSettings};
use crate::storage::UserStore;

/// Profile fields as Telegram reports them with one inbound event.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    /// Referral tag from a `/start ref_…` payload, if any. Only recorded
    /// on first contact.
    pub ref_tag: Option<String>,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Finds the user, creating them on first contact and patching stored
    /// profile fields when Telegram reports different ones.
    pub async fn authenticate(&self, info: &UserInfo) -> Result<User, AppError> {
        match self.users.find(info.id).await? {
            None => self.create(info).await,
            Some(mut user) => {
                let changed = user.patch_profile(
                    &info.first_name,
                    info.last_name.as_deref(),
                    info.username.as_deref(),
                );
                if changed {
                    self.users.update(&user).await?;
                }
                Ok(user)
            }
        }
    }

    /// Flips the long-ids preference and persists it.
    pub async fn toggle_long_ids(&self, user: &mut User) -> Result<bool, AppError> {
        let enabled = user.toggle_long_ids();
        self.users.update(user).await?;
        Ok(enabled)
    }

    async fn create(&self, info: &UserInfo) -> Result<User, AppError> {
        let user = User {
            id: info.id,
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            username: info.username.clone(),
            language_code: info.language_code.clone(),
            is_admin: false,
            ref_tag: info.ref_tag.clone(),
            settings: UserSettings::default(),
            joined_at: Utc::now(),
            updated_at: None,
        };
        self.users.add(&user).await?;
        log::info!("new user: id={} ref={:?}", user.id, user.ref_tag);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::MemUserStore;
    use pretty_assertions::assert_eq;

    fn info(id: i64) -> UserInfo {
        UserInfo {
            id,
            first_name: "Ann".into(),
            last_name: None,
            username: Some("ann".into()),
            language_code: Some("ru".into()),
            ref_tag: Some("teleblog".into()),
        }
    }

    #[tokio::test]
    async fn first_contact_creates_the_user() {
        let users = Arc::new(MemUserStore::default());
        let auth = AuthService::new(users.clone());

        let user = auth.authenticate(&info(7)).await.map_err(|e| e.to_string());
        let user = user.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(user.id, 7);
        assert_eq!(user.ref_tag.as_deref(), Some("teleblog"));
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn repeat_contact_does_not_duplicate_or_retag() {
        let users = Arc::new(MemUserStore::default());
        let auth = AuthService::new(users.clone());

        let first = auth.authenticate(&info(7)).await;
        assert!(first.is_ok());

        let mut second_info = info(7);
        second_info.ref_tag = Some("other".into());
        let second = auth.authenticate(&second_info).await;
        let user = match second {
            Ok(user) => user,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(users.len(), 1);
        assert_eq!(user.ref_tag.as_deref(), Some("teleblog"));
    }

    #[tokio::test]
    async fn profile_change_is_patched_in_place() {
        let users = Arc::new(MemUserStore::default());
        let auth = AuthService::new(users.clone());

        assert!(auth.authenticate(&info(7)).await.is_ok());

        let mut renamed = info(7);
        renamed.username = Some("annie".into());
        let user = match auth.authenticate(&renamed).await {
            Ok(user) => user,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(user.username.as_deref(), Some("annie"));
        assert!(user.updated_at.is_some());

        let stored = users.get(7);
        assert_eq!(stored.map(|u| u.username), Some(Some("annie".into())));
    }

    #[tokio::test]
    async fn toggle_long_ids_persists() {
        let users = Arc::new(MemUserStore::default());
        let auth = AuthService::new(users.clone());

        let mut user = match auth.authenticate(&info(7)).await {
            Ok(user) => user,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(auth.toggle_long_ids(&mut user).await.ok(), Some(true));
        assert_eq!(users.get(7).map(|u| u.settings.long_ids), Some(true));
    }
}
