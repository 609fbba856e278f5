//! File intake and the download authorization flow.
//!
//! `resolve` decides what a requester gets: owners see their file with
//! statistics, unrestricted guests get the file with a recorded download,
//! and guests behind a chat restriction are gated until membership is
//! confirmed. The await marker set at gate time attributes the eventual
//! download as a fresh subscription, at most once.

use std::sync::Arc;

use chrono::Utc;

use crate::core::errors::AppError;
use crate::domain::{
    Chat, ChatId, Download, DownloadRestriction, DownloadStats, File, FileId, Kind, Metadata, User,
};
use crate::ids;
use crate::state::AwaitMarkerStore;
use crate::storage::{ChatQuery, ChatStore, DownloadStore, FileQuery, FileStore};
use crate::telegram::client::{ChatRef, MembershipClient};

/// How many public ids are tried before an insert gives up.
const MAX_PUBLIC_ID_ATTEMPTS: u32 = 8;

/// Media fields of an uploaded message.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub telegram_id: String,
    pub kind: Kind,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub name: Option<String>,
    pub size: Option<i64>,
    pub metadata: Metadata,
}

/// A file as its owner sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedFile {
    pub file: File,
    pub stats: DownloadStats,
}

/// Subscription gate shown to a non-member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSubRequest {
    pub file_id: FileId,
    pub title: String,
    pub username: Option<String>,
    pub invite_link: Option<String>,
}

impl ChatSubRequest {
    /// Join link to offer the user.
    pub fn link(&self) -> Option<String> {
        match &self.username {
            Some(username) => Some(format!("https://t.me/{username}")),
            None => self.invite_link.clone(),
        }
    }
}

/// Outcome of resolving a share link.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadResult {
    Owned(OwnedFile),
    Guest(File),
    SubscriptionRequired(ChatSubRequest),
}

/// Outcome of toggling a chat restriction on a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRestrictionUpdate {
    pub file: File,
    pub chat_title: String,
    /// True when the toggle removed the restriction.
    pub disabled: bool,
}

struct ChatLink {
    username: Option<String>,
    invite_link: Option<String>,
}

pub struct FileService {
    files: Arc<dyn FileStore>,
    chats: Arc<dyn ChatStore>,
    downloads: Arc<dyn DownloadStore>,
    telegram: Arc<dyn MembershipClient>,
    markers: Arc<dyn AwaitMarkerStore>,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileStore>,
        chats: Arc<dyn ChatStore>,
        downloads: Arc<dyn DownloadStore>,
        telegram: Arc<dyn MembershipClient>,
        markers: Arc<dyn AwaitMarkerStore>,
    ) -> Self {
        Self { files, chats, downloads, telegram, markers }
    }

    /// Stores an uploaded file under a fresh public id, retrying within
    /// the same length class on collision.
    pub async fn add_file(&self, user: &User, input: FileInput) -> Result<OwnedFile, AppError> {
        let mut file = File {
            id: 0,
            telegram_id: input.telegram_id,
            public_id: ids::generate(user.settings.long_ids),
            caption: input.caption,
            kind: input.kind,
            mime_type: input.mime_type,
            name: input.name,
            size: input.size,
            owner_id: user.id,
            restriction: DownloadRestriction::default(),
            linked_post_uri: None,
            metadata: input.metadata,
            created_at: Utc::now(),
        };

        let mut stored = false;
        for attempt in 1..=MAX_PUBLIC_ID_ATTEMPTS {
            match self.files.add(&mut file).await {
                Ok(()) => {
                    stored = true;
                    break;
                }
                Err(AppError::PublicIdCollision) => {
                    log::warn!("public id collision: owner={} attempt={}", user.id, attempt);
                    file.regen_public_id();
                }
                Err(err) => return Err(err),
            }
        }
        if !stored {
            return Err(AppError::PublicIdExhausted(MAX_PUBLIC_ID_ATTEMPTS));
        }

        Ok(OwnedFile { file, stats: DownloadStats::default() })
    }

    pub async fn resolve_by_public_id(&self, user: &User, public_id: &str) -> Result<DownloadResult, AppError> {
        let file = self.files.one(FileQuery::new().public_id(public_id)).await?;
        self.resolve(user, file).await
    }

    pub async fn resolve_by_id(&self, user: &User, id: FileId) -> Result<DownloadResult, AppError> {
        let file = self.files.one(FileQuery::new().id(id)).await?;
        self.resolve(user, file).await
    }

    async fn resolve(&self, user: &User, file: File) -> Result<DownloadResult, AppError> {
        if file.owner_id == user.id {
            let stats = self.downloads.file_stats(file.id).await?;
            return Ok(DownloadResult::Owned(OwnedFile { file, stats }));
        }

        if let Some(chat_id) = file.restriction.chat_id {
            if let Some(request) = self.subscription_request(user, &file, chat_id).await? {
                return Ok(DownloadResult::SubscriptionRequired(request));
            }
        }

        self.register_download(user, &file).await?;
        Ok(DownloadResult::Guest(file))
    }

    /// Checks the restriction chat, returning the gate to show when the
    /// user is not a member. Chat identity and membership are fetched
    /// concurrently; the first failure wins.
    async fn subscription_request(
        &self,
        user: &User,
        file: &File,
        chat_id: ChatId,
    ) -> Result<Option<ChatSubRequest>, AppError> {
        let chat = self.chats.one(ChatQuery::new().id(chat_id)).await?;
        let (link, is_member) = tokio::try_join!(self.chat_link(&chat), self.is_member(&chat, user))?;

        if is_member {
            return Ok(None);
        }

        self.markers.set(user.id, file.id).await?;
        Ok(Some(ChatSubRequest {
            file_id: file.id,
            title: chat.title,
            username: link.username,
            invite_link: link.invite_link,
        }))
    }

    async fn chat_link(&self, chat: &Chat) -> Result<ChatLink, AppError> {
        let info = self.telegram.get_chat(&ChatRef::Id(chat.telegram_id)).await.map_err(as_unverifiable)?;
        if info.username.is_some() || info.invite_link.is_some() {
            return Ok(ChatLink { username: info.username, invite_link: info.invite_link });
        }
        let link = self.telegram.export_invite_link(chat.telegram_id).await.map_err(as_unverifiable)?;
        Ok(ChatLink { username: None, invite_link: Some(link) })
    }

    async fn is_member(&self, chat: &Chat, user: &User) -> Result<bool, AppError> {
        self.telegram.is_chat_member(chat.telegram_id, user.id).await.map_err(as_unverifiable)
    }

    /// Records one access event. When the file is restricted, the consumed
    /// await marker decides the new-subscription attribution.
    pub async fn register_download(&self, user: &User, file: &File) -> Result<(), AppError> {
        let new_subscription = match file.restriction.chat_id {
            Some(_) => Some(self.markers.take(user.id, file.id).await?),
            None => None,
        };
        let mut download = Download {
            id: 0,
            file_id: Some(file.id),
            user_id: Some(user.id),
            new_subscription,
            at: Utc::now(),
        };
        self.downloads.add(&mut download).await
    }

    /// Membership probe for the "check subscription" button. No marker
    /// side effects; an unrestricted file always passes.
    pub async fn check_membership(&self, user: &User, file_id: FileId) -> Result<bool, AppError> {
        let file = self.files.one(FileQuery::new().id(file_id)).await?;
        let Some(chat_id) = file.restriction.chat_id else {
            return Ok(true);
        };
        let chat = self.chats.one(ChatQuery::new().id(chat_id)).await?;
        self.is_member(&chat, user).await
    }

    /// The owner's view of one of their files.
    pub async fn owned_file(&self, user: &User, file_id: FileId) -> Result<OwnedFile, AppError> {
        let file = self.files.one(FileQuery::new().id(file_id).owner_id(user.id)).await?;
        let stats = self.downloads.file_stats(file.id).await?;
        Ok(OwnedFile { file, stats })
    }

    pub async fn delete_file(&self, user: &User, file_id: FileId) -> Result<(), AppError> {
        let deleted = self.files.delete(FileQuery::new().id(file_id).owner_id(user.id)).await?;
        match deleted {
            0 => Err(AppError::FileNotFound),
            1 => Ok(()),
            n => Err(AppError::TooManyRowsAffected(n)),
        }
    }

    /// Data for the restrictions keyboard: the file plus the owner's
    /// connected chats.
    pub async fn file_restrictions(&self, user: &User, file_id: FileId) -> Result<(File, Vec<Chat>), AppError> {
        let (file, chats) = tokio::try_join!(
            self.files.one(FileQuery::new().id(file_id).owner_id(user.id)),
            self.chats.all(ChatQuery::new().owner_id(user.id)),
        )?;
        Ok((file, chats))
    }

    /// Toggles the chat restriction: selecting the current chat clears it,
    /// anything else replaces it. Both file and chat must belong to `user`.
    pub async fn set_chat_restriction(
        &self,
        user: &User,
        file_id: FileId,
        chat_id: ChatId,
    ) -> Result<ChatRestrictionUpdate, AppError> {
        let mut file = self.files.one(FileQuery::new().id(file_id).owner_id(user.id)).await?;
        let chat = self.chats.one(ChatQuery::new().id(chat_id).owner_id(user.id)).await?;

        let disabled = file.restriction.chat_id == Some(chat.id);
        file.restriction.chat_id = if disabled { None } else { Some(chat.id) };
        self.files.update(&file).await?;

        Ok(ChatRestrictionUpdate { file, chat_title: chat.title, disabled })
    }
}

fn as_unverifiable(err: AppError) -> AppError {
    if err.is_cant_check_membership() {
        AppError::MembershipUnverifiable
    } else {
        err
    }
}
