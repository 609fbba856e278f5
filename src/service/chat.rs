//! Connecting channels/groups as restriction targets, and attribution of
//! channel posts that advertise shared files.

use std::sync::Arc;

use chrono::Utc;

use crate::core::errors::AppError;
use crate::domain::{Chat, ChatDownloadStats, ChatId, ChatType, User};
use crate::links::{bot_to_mtproto_id, extract_deep_link_public_ids};
use crate::storage::{ChatQuery, ChatStore, DownloadStore, FileQuery, FileStore};
use crate::telegram::client::{ChatInfoKind, ChatRef, MembershipClient};

/// One chat with its usage counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDetails {
    pub chat: Chat,
    pub files_count: i64,
    pub stats: ChatDownloadStats,
}

/// A channel post that may advertise shared files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPostInfo {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub message_id: i32,
}

impl ChannelPostInfo {
    /// Deep link to the post itself, in the `tg://` scheme.
    pub fn link(&self) -> String {
        match &self.chat_username {
            Some(username) => format!("tg://resolve?domain={}&post={}", username, self.message_id),
            None => format!(
                "tg://privatepost?channel={}&post={}",
                bot_to_mtproto_id(self.chat_id),
                self.message_id
            ),
        }
    }
}

pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    files: Arc<dyn FileStore>,
    downloads: Arc<dyn DownloadStore>,
    telegram: Arc<dyn MembershipClient>,
    bot_id: i64,
    bot_username: String,
}

impl ChatService {
    pub fn new(
        chats: Arc<dyn ChatStore>,
        files: Arc<dyn FileStore>,
        downloads: Arc<dyn DownloadStore>,
        telegram: Arc<dyn MembershipClient>,
        bot_id: i64,
        bot_username: String,
    ) -> Self {
        Self { chats, files, downloads, telegram, bot_id, bot_username }
    }

    /// Connects a chat after the full verification chain: the chat exists
    /// and is not a private dialog, the bot administers it with invite
    /// rights, and the requesting user administers it too.
    pub async fn connect(&self, user: &User, chat: ChatRef) -> Result<Chat, AppError> {
        let info = match self.telegram.get_chat(&chat).await {
            Ok(info) => info,
            Err(AppError::TgChatNotFound | AppError::TgBotIsNotMember) => {
                return Err(AppError::ChatNotFoundOrBotIsNotAdmin)
            }
            Err(err) => return Err(err),
        };

        let kind = match info.kind {
            ChatInfoKind::Private => return Err(AppError::ChatIsUser),
            ChatInfoKind::Group => ChatType::Group,
            ChatInfoKind::SuperGroup => ChatType::SuperGroup,
            ChatInfoKind::Channel => ChatType::Channel,
        };

        let admins = match self.telegram.get_chat_admins(info.id).await {
            Ok(admins) => admins,
            Err(AppError::TgMemberListInaccessible | AppError::TgBotIsNotMember) => {
                return Err(AppError::BotIsNotChatAdmin)
            }
            Err(err) => return Err(err),
        };

        let bot = admins.iter().find(|a| a.user_id == self.bot_id).ok_or(AppError::BotIsNotChatAdmin)?;
        if !bot.can_invite_users {
            return Err(AppError::BotNotEnoughRights);
        }
        if !admins.iter().any(|a| a.user_id == user.id) {
            return Err(AppError::UserIsNotChatAdmin);
        }

        // A private chat needs an exportable invite link for the
        // subscription gate to point anywhere.
        if info.username.is_none() && info.invite_link.is_none() {
            match self.telegram.export_invite_link(info.id).await {
                Ok(_) => {}
                Err(AppError::TgNoRightsForInviteLink) => return Err(AppError::BotNotEnoughRights),
                Err(err) => return Err(err),
            }
        }

        let mut connected = Chat {
            id: 0,
            telegram_id: info.id,
            title: info.title,
            kind,
            owner_id: user.id,
            linked_at: Utc::now(),
            updated_at: None,
        };
        self.chats.add(&mut connected).await?;
        log::info!("chat connected: owner={} chat={} title={:?}", user.id, connected.telegram_id, connected.title);
        Ok(connected)
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Chat>, AppError> {
        self.chats.all(ChatQuery::new().owner_id(user.id)).await
    }

    pub async fn details(&self, user: &User, chat_id: ChatId) -> Result<ChatDetails, AppError> {
        let chat = self.chats.one(ChatQuery::new().id(chat_id).owner_id(user.id)).await?;
        let (files_count, stats) = tokio::try_join!(
            self.files.count(FileQuery::new().restriction_chat_id(chat.id)),
            self.downloads.chat_stats(chat.id),
        )?;
        Ok(ChatDetails { chat, files_count, stats })
    }

    /// Disconnects the chat. Restrictions pointing at it are cleared by
    /// the schema (`on delete set null`).
    pub async fn disconnect(&self, user: &User, chat_id: ChatId) -> Result<(), AppError> {
        let deleted = self.chats.delete(ChatQuery::new().id(chat_id).owner_id(user.id)).await?;
        match deleted {
            0 => Err(AppError::ChatNotFound),
            1 => Ok(()),
            n => Err(AppError::TooManyRowsAffected(n)),
        }
    }

    /// Applies a renamed chat title to every connected copy of the chat.
    pub async fn update_title(&self, telegram_id: i64, title: &str) -> Result<(), AppError> {
        let chats = self.chats.all(ChatQuery::new().telegram_id(telegram_id)).await?;
        for mut chat in chats {
            if chat.patch_title(title) {
                self.chats.update(&chat).await?;
            }
        }
        Ok(())
    }

    /// Stamps files advertised by a channel post with a link back to the
    /// post. Only files restricted by that very channel are touched.
    /// Returns how many files were stamped.
    pub async fn attribute_channel_post(&self, post: &ChannelPostInfo, urls: &[String]) -> Result<usize, AppError> {
        let chats = self.chats.all(ChatQuery::new().telegram_id(post.chat_id)).await?;
        if chats.is_empty() {
            return Ok(0);
        }

        let ids = extract_deep_link_public_ids(&self.bot_username, &unique_strings(urls))?;
        if ids.is_empty() {
            return Ok(0);
        }

        let uri = post.link();
        let mut stamped = 0;
        for chat in &chats {
            let files = self
                .files
                .all(FileQuery::new().public_ids(ids.clone()).restriction_chat_id(chat.id))
                .await?;
            for mut file in files {
                file.linked_post_uri = Some(uri.clone());
                self.files.update(&file).await?;
                stamped += 1;
            }
        }
        Ok(stamped)
    }
}

/// Deduplicates while preserving first-seen order.
fn unique_strings(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.iter().filter(|v| seen.insert(v.as_str())).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DownloadRestriction, File, Kind, Metadata, UserSettings};
    use crate::service::testing::{FakeMembership, MemChatStore, MemDownloadStore, MemFileStore};
    use crate::telegram::client::{ChatAdmin, ChatInfo};
    use pretty_assertions::assert_eq;

    const BOT_ID: i64 = 42;

    struct Fixture {
        chats: Arc<MemChatStore>,
        files: Arc<MemFileStore>,
        telegram: Arc<FakeMembership>,
        service: ChatService,
    }

    fn fixture(telegram: FakeMembership) -> Fixture {
        let chats = Arc::new(MemChatStore::default());
        let files = Arc::new(MemFileStore::default());
        let downloads = Arc::new(MemDownloadStore::default());
        let telegram = Arc::new(telegram);
        let service = ChatService::new(
            chats.clone(),
            files.clone(),
            downloads,
            telegram.clone(),
            BOT_ID,
            "cleepy_bot".to_owned(),
        );
        Fixture { chats, files, telegram, service }
    }

    fn user(id: i64) -> User {
        User {
            id,
            first_name: format!("user-{id}"),
            last_name: None,
            username: None,
            language_code: None,
            is_admin: false,
            ref_tag: None,
            settings: UserSettings::default(),
            joined_at: Utc::now(),
            updated_at: None,
        }
    }

    fn channel_info() -> ChatInfo {
        ChatInfo {
            id: -1_001_129_109_101,
            title: "channely".into(),
            username: Some("channely".into()),
            invite_link: None,
            kind: ChatInfoKind::Channel,
        }
    }

    fn both_admins(user_id: i64) -> Vec<ChatAdmin> {
        vec![
            ChatAdmin { user_id: BOT_ID, can_invite_users: true },
            ChatAdmin { user_id, can_invite_users: true },
        ]
    }

    #[tokio::test]
    async fn connect_succeeds_for_a_dual_admin() {
        let fx = fixture(FakeMembership::with_chat(channel_info()));
        *fx.telegram.admins.lock().unwrap() = both_admins(7);

        let connected = fx.service.connect(&user(7), ChatRef::username("channely")).await;
        match connected {
            Ok(chat) => {
                assert_eq!(chat.telegram_id, -1_001_129_109_101);
                assert_eq!(chat.kind, ChatType::Channel);
                assert!(chat.id > 0);
            }
            Err(e) => panic!("{e}"),
        }
    }

    #[tokio::test]
    async fn connect_rejects_unknown_chats() {
        let fx = fixture(FakeMembership::default());
        let result = fx.service.connect(&user(7), ChatRef::username("nosuch")).await;
        assert!(matches!(result, Err(AppError::ChatNotFoundOrBotIsNotAdmin)), "{result:?}");
    }

    #[tokio::test]
    async fn connect_rejects_private_dialogs() {
        let mut info = channel_info();
        info.kind = ChatInfoKind::Private;
        let fx = fixture(FakeMembership::with_chat(info));
        let result = fx.service.connect(&user(7), ChatRef::Id(7)).await;
        assert!(matches!(result, Err(AppError::ChatIsUser)), "{result:?}");
    }

    #[tokio::test]
    async fn connect_requires_the_bot_to_be_admin() {
        let fx = fixture(FakeMembership::with_chat(channel_info()));
        *fx.telegram.admins.lock().unwrap() =
            vec![ChatAdmin { user_id: 7, can_invite_users: true }];

        let result = fx.service.connect(&user(7), ChatRef::username("channely")).await;
        assert!(matches!(result, Err(AppError::BotIsNotChatAdmin)), "{result:?}");
    }

    #[tokio::test]
    async fn connect_requires_bot_invite_rights() {
        let fx = fixture(FakeMembership::with_chat(channel_info()));
        *fx.telegram.admins.lock().unwrap() = vec![
            ChatAdmin { user_id: BOT_ID, can_invite_users: false },
            ChatAdmin { user_id: 7, can_invite_users: true },
        ];

        let result = fx.service.connect(&user(7), ChatRef::username("channely")).await;
        assert!(matches!(result, Err(AppError::BotNotEnoughRights)), "{result:?}");
    }

    #[tokio::test]
    async fn connect_requires_the_user_to_be_admin() {
        let fx = fixture(FakeMembership::with_chat(channel_info()));
        *fx.telegram.admins.lock().unwrap() =
            vec![ChatAdmin { user_id: BOT_ID, can_invite_users: true }];

        let result = fx.service.connect(&user(7), ChatRef::username("channely")).await;
        assert!(matches!(result, Err(AppError::UserIsNotChatAdmin)), "{result:?}");
    }

    #[tokio::test]
    async fn reconnecting_the_same_chat_is_rejected() {
        let fx = fixture(FakeMembership::with_chat(channel_info()));
        *fx.telegram.admins.lock().unwrap() = both_admins(7);

        assert!(fx.service.connect(&user(7), ChatRef::username("channely")).await.is_ok());
        let second = fx.service.connect(&user(7), ChatRef::username("channely")).await;
        assert!(matches!(second, Err(AppError::ChatAlreadyConnected)), "{second:?}");
    }

    #[tokio::test]
    async fn post_attribution_stamps_restricted_files() {
        let fx = fixture(FakeMembership::default());
        let owner = user(7);

        let mut chat = Chat {
            id: 0,
            telegram_id: -1_001_129_109_101,
            title: "channely".into(),
            kind: ChatType::Channel,
            owner_id: owner.id,
            linked_at: Utc::now(),
            updated_at: None,
        };
        assert!(fx.chats.add(&mut chat).await.is_ok());

        let mut file = File {
            id: 0,
            telegram_id: "BQAC".into(),
            public_id: "dVQK8".into(),
            caption: None,
            kind: Kind::Document,
            mime_type: None,
            name: None,
            size: None,
            owner_id: owner.id,
            restriction: DownloadRestriction { chat_id: Some(chat.id) },
            linked_post_uri: None,
            metadata: Metadata::default(),
            created_at: Utc::now(),
        };
        assert!(fx.files.add(&mut file).await.is_ok());

        let post = ChannelPostInfo {
            chat_id: chat.telegram_id,
            chat_username: Some("channely".into()),
            message_id: 99,
        };
        let urls = vec![
            "https://t.me/cleepy_bot?start=dVQK8".to_owned(),
            "https://t.me/cleepy_bot?start=dVQK8".to_owned(),
        ];
        assert_eq!(fx.service.attribute_channel_post(&post, &urls).await.ok(), Some(1));

        let stamped = fx.files.get(file.id).and_then(|f| f.linked_post_uri);
        assert_eq!(stamped.as_deref(), Some("tg://resolve?domain=channely&post=99"));
    }

    #[tokio::test]
    async fn posts_from_unconnected_channels_are_ignored() {
        let fx = fixture(FakeMembership::default());
        let post = ChannelPostInfo { chat_id: -1, chat_username: None, message_id: 1 };
        let urls = vec!["https://t.me/cleepy_bot?start=dVQK8".to_owned()];
        assert_eq!(fx.service.attribute_channel_post(&post, &urls).await.ok(), Some(0));
    }

    #[test]
    fn private_post_link_uses_the_mtproto_id_space() {
        let post = ChannelPostInfo { chat_id: -(5000 + 1_000_000_000_000), chat_username: None, message_id: 3 };
        assert_eq!(post.link(), "tg://privatepost?channel=5000&post=3");
    }
}
