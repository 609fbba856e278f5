//! Thin boundary over the Bot API calls the services need. Platform error
//! payloads are classified here, once, into typed errors; everything above
//! this module only sees the `AppError` taxonomy.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberStatus, Recipient, UserId as TgUserId};
use teloxide::{ApiError, Bot, RequestError};

use crate::core::errors::AppError;

/// How a chat is addressed when asking the platform about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    Id(i64),
    Username(String),
}

impl ChatRef {
    /// Builds a username reference, prefixing `@` when missing.
    pub fn username(v: &str) -> Self {
        if v.starts_with('@') {
            ChatRef::Username(v.to_owned())
        } else {
            ChatRef::Username(format!("@{v}"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInfoKind {
    Private,
    Group,
    SuperGroup,
    Channel,
}

/// Identity of a chat as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
    pub invite_link: Option<String>,
    pub kind: ChatInfoKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAdmin {
    pub user_id: i64,
    pub can_invite_users: bool,
}

#[async_trait]
pub trait MembershipClient: Send + Sync {
    async fn get_chat(&self, chat: &ChatRef) -> Result<ChatInfo, AppError>;
    async fn get_chat_admins(&self, chat_id: i64) -> Result<Vec<ChatAdmin>, AppError>;
    /// Member, administrator or owner counts as membership.
    async fn is_chat_member(&self, chat_id: i64, user_id: i64) -> Result<bool, AppError>;
    async fn export_invite_link(&self, chat_id: i64) -> Result<String, AppError>;
}

pub struct BotMembershipClient {
    bot: Bot,
}

impl BotMembershipClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn recipient(chat: &ChatRef) -> Recipient {
        match chat {
            ChatRef::Id(id) => Recipient::Id(ChatId(*id)),
            ChatRef::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }
}

#[async_trait]
impl MembershipClient for BotMembershipClient {
    async fn get_chat(&self, chat: &ChatRef) -> Result<ChatInfo, AppError> {
        let info = self.bot.get_chat(Self::recipient(chat)).await.map_err(classify)?;
        let kind = if info.is_private() {
            ChatInfoKind::Private
        } else if info.is_channel() {
            ChatInfoKind::Channel
        } else if info.is_supergroup() {
            ChatInfoKind::SuperGroup
        } else {
            ChatInfoKind::Group
        };
        Ok(ChatInfo {
            id: info.id.0,
            title: info.title().unwrap_or_default().to_owned(),
            username: info.username().map(str::to_owned),
            invite_link: info.invite_link().map(str::to_owned),
            kind,
        })
    }

    async fn get_chat_admins(&self, chat_id: i64) -> Result<Vec<ChatAdmin>, AppError> {
        let members = self.bot.get_chat_administrators(ChatId(chat_id)).await.map_err(classify)?;
        Ok(members
            .into_iter()
            .map(|member| {
                let can_invite_users = match &member.kind {
                    ChatMemberKind::Owner(_) => true,
                    ChatMemberKind::Administrator(admin) => admin.can_invite_users,
                    _ => false,
                };
                ChatAdmin {
                    user_id: i64::try_from(member.user.id.0).unwrap_or_default(),
                    can_invite_users,
                }
            })
            .collect())
    }

    async fn is_chat_member(&self, chat_id: i64, user_id: i64) -> Result<bool, AppError> {
        let user_id = TgUserId(u64::try_from(user_id).unwrap_or_default());
        let member = self.bot.get_chat_member(ChatId(chat_id), user_id).await.map_err(classify)?;
        Ok(matches!(
            member.kind.status(),
            ChatMemberStatus::Owner | ChatMemberStatus::Administrator | ChatMemberStatus::Member
        ))
    }

    async fn export_invite_link(&self, chat_id: i64) -> Result<String, AppError> {
        self.bot.export_chat_invite_link(ChatId(chat_id)).await.map_err(classify)
    }
}

/// Maps platform error payloads to typed errors. Telegram reports several
/// conditions only through error strings, so unknown payloads are matched
/// by substring.
fn classify(err: RequestError) -> AppError {
    if let RequestError::Api(api) = &err {
        if matches!(api, ApiError::ChatNotFound) {
            return AppError::TgChatNotFound;
        }
        let text = api.to_string();
        if text.contains("member list is inaccessible") {
            return AppError::TgMemberListInaccessible;
        }
        if text.contains("bot is not a member of the channel chat")
            || text.contains("bot is not a member of the supergroup chat")
        {
            return AppError::TgBotIsNotMember;
        }
        if text.contains("not enough rights to export chat invite link") {
            return AppError::TgNoRightsForInviteLink;
        }
    }
    AppError::Telegram(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn api(err: ApiError) -> RequestError {
        RequestError::Api(err)
    }

    #[test]
    fn chat_not_found_is_typed() {
        assert!(matches!(classify(api(ApiError::ChatNotFound)), AppError::TgChatNotFound));
    }

    #[test]
    fn string_payloads_are_classified_by_substring() {
        let cases = [
            ("Bad Request: member list is inaccessible", true),
            ("Forbidden: bot is not a member of the channel chat", true),
            ("Forbidden: bot is not a member of the supergroup chat", true),
        ];
        for (text, expect_unverifiable) in cases {
            let err = classify(api(ApiError::Unknown(text.to_owned())));
            assert_eq!(err.is_cant_check_membership(), expect_unverifiable, "{text}");
        }
    }

    #[test]
    fn invite_link_rights_are_typed() {
        let err = classify(api(ApiError::Unknown(
            "Bad Request: not enough rights to export chat invite link".to_owned(),
        )));
        assert!(matches!(err, AppError::TgNoRightsForInviteLink));
    }

    #[test]
    fn unrelated_errors_pass_through() {
        let err = classify(api(ApiError::MessageNotModified));
        assert!(matches!(err, AppError::Telegram(_)));
    }

    #[test]
    fn username_ref_gets_an_at_prefix() {
        assert_eq!(ChatRef::username("channely"), ChatRef::Username("@channely".to_owned()));
        assert_eq!(ChatRef::username("@channely"), ChatRef::Username("@channely".to_owned()));
    }
}
