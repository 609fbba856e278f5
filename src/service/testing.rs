//! In-memory fakes used by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::AppError;
use crate::domain::{Chat, ChatDownloadStats, ChatId, Download, DownloadStats, File, FileId, User, UserId};
use crate::state::AwaitMarkerStore;
use crate::storage::{ChatQuery, ChatStore, DownloadStore, FileQuery, FileStore, UserStore};
use crate::telegram::client::{ChatAdmin, ChatInfo, ChatRef, MembershipClient};

#[derive(Default)]
pub struct MemUserStore {
    users: Mutex<HashMap<UserId, User>>,
}

impl MemUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn add(&self, user: &User) -> Result<(), AppError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(AppError::UserNotFound),
        }
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.users.lock().unwrap().len() as i64)
    }
}

#[derive(Default)]
pub struct MemFileStore {
    files: Mutex<Vec<File>>,
    next_id: AtomicI64,
    /// Fail this many inserts with a public-id collision first.
    pub fail_adds: AtomicU32,
    /// Public ids the store saw in `add`, collisions included.
    pub attempted_ids: Mutex<Vec<String>>,
}

impl MemFileStore {
    pub fn insert(&self, file: File) {
        self.files.lock().unwrap().push(file);
    }

    pub fn get(&self, id: FileId) -> Option<File> {
        self.files.lock().unwrap().iter().find(|f| f.id == id).cloned()
    }
}

#[async_trait]
impl FileStore for MemFileStore {
    async fn add(&self, file: &mut File) -> Result<(), AppError> {
        self.attempted_ids.lock().unwrap().push(file.public_id.clone());

        if self.fail_adds.load(Ordering::SeqCst) > 0 {
            self.fail_adds.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::PublicIdCollision);
        }
        let mut files = self.files.lock().unwrap();
        if files.iter().any(|f| f.public_id == file.public_id) {
            return Err(AppError::PublicIdCollision);
        }
        file.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        files.push(file.clone());
        Ok(())
    }

    async fn update(&self, file: &File) -> Result<(), AppError> {
        let mut files = self.files.lock().unwrap();
        match files.iter_mut().find(|f| f.id == file.id) {
            Some(slot) => {
                *slot = file.clone();
                Ok(())
            }
            None => Err(AppError::FileNotFound),
        }
    }

    async fn one(&self, query: FileQuery) -> Result<File, AppError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| query.matches(f))
            .cloned()
            .ok_or(AppError::FileNotFound)
    }

    async fn all(&self, query: FileQuery) -> Result<Vec<File>, AppError> {
        Ok(self.files.lock().unwrap().iter().filter(|f| query.matches(f)).cloned().collect())
    }

    async fn count(&self, query: FileQuery) -> Result<i64, AppError> {
        Ok(self.files.lock().unwrap().iter().filter(|f| query.matches(f)).count() as i64)
    }

    async fn delete(&self, query: FileQuery) -> Result<u64, AppError> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| !query.matches(f));
        Ok((before - files.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemChatStore {
    chats: Mutex<Vec<Chat>>,
    next_id: AtomicI64,
}

impl MemChatStore {
    pub fn insert(&self, chat: Chat) {
        self.chats.lock().unwrap().push(chat);
    }
}

#[async_trait]
impl ChatStore for MemChatStore {
    async fn add(&self, chat: &mut Chat) -> Result<(), AppError> {
        let mut chats = self.chats.lock().unwrap();
        if chats.iter().any(|c| c.owner_id == chat.owner_id && c.telegram_id == chat.telegram_id) {
            return Err(AppError::ChatAlreadyConnected);
        }
        chat.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        chats.push(chat.clone());
        Ok(())
    }

    async fn update(&self, chat: &Chat) -> Result<(), AppError> {
        let mut chats = self.chats.lock().unwrap();
        match chats.iter_mut().find(|c| c.id == chat.id) {
            Some(slot) => {
                *slot = chat.clone();
                Ok(())
            }
            None => Err(AppError::ChatNotFound),
        }
    }

    async fn one(&self, query: ChatQuery) -> Result<Chat, AppError> {
        self.chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| query.matches(c))
            .cloned()
            .ok_or(AppError::ChatNotFound)
    }

    async fn all(&self, query: ChatQuery) -> Result<Vec<Chat>, AppError> {
        Ok(self.chats.lock().unwrap().iter().filter(|c| query.matches(c)).cloned().collect())
    }

    async fn count(&self, query: ChatQuery) -> Result<i64, AppError> {
        Ok(self.chats.lock().unwrap().iter().filter(|c| query.matches(c)).count() as i64)
    }

    async fn delete(&self, query: ChatQuery) -> Result<u64, AppError> {
        let mut chats = self.chats.lock().unwrap();
        let before = chats.len();
        chats.retain(|c| !query.matches(c));
        Ok((before - chats.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemDownloadStore {
    downloads: Mutex<Vec<Download>>,
    next_id: AtomicI64,
    /// file id -> restriction chat id, for `chat_stats`.
    pub restrictions: Mutex<HashMap<FileId, ChatId>>,
}

impl MemDownloadStore {
    pub fn rows(&self) -> Vec<Download> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadStore for MemDownloadStore {
    async fn add(&self, download: &mut Download) -> Result<(), AppError> {
        download.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.downloads.lock().unwrap().push(download.clone());
        Ok(())
    }

    async fn file_stats(&self, file: FileId) -> Result<DownloadStats, AppError> {
        let downloads = self.downloads.lock().unwrap();
        let rows: Vec<&Download> = downloads.iter().filter(|d| d.file_id == Some(file)).collect();
        let unique: HashSet<Option<UserId>> = rows.iter().map(|d| d.user_id).collect();
        Ok(DownloadStats {
            total: rows.len() as i64,
            unique_users: unique.len() as i64,
            with_subscription: rows.iter().filter(|d| d.new_subscription.is_some()).count() as i64,
            new_subscription: rows.iter().filter(|d| d.new_subscription == Some(true)).count() as i64,
        })
    }

    async fn chat_stats(&self, chat: ChatId) -> Result<ChatDownloadStats, AppError> {
        let restrictions = self.restrictions.lock().unwrap();
        let downloads = self.downloads.lock().unwrap();
        let rows: Vec<&Download> = downloads
            .iter()
            .filter(|d| d.file_id.is_some_and(|f| restrictions.get(&f) == Some(&chat)))
            .collect();
        Ok(ChatDownloadStats {
            with_subscription: rows.iter().filter(|d| d.new_subscription.is_some()).count() as i64,
            new_subscription: rows.iter().filter(|d| d.new_subscription == Some(true)).count() as i64,
        })
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.downloads.lock().unwrap().len() as i64)
    }
}

pub struct MemMarkerStore {
    markers: Mutex<HashSet<(UserId, FileId)>>,
}

impl Default for MemMarkerStore {
    fn default() -> Self {
        Self { markers: Mutex::new(HashSet::new()) }
    }
}

impl MemMarkerStore {
    pub fn has(&self, user: UserId, file: FileId) -> bool {
        self.markers.lock().unwrap().contains(&(user, file))
    }
}

#[async_trait]
impl AwaitMarkerStore for MemMarkerStore {
    async fn set(&self, user: UserId, file: FileId) -> Result<(), AppError> {
        self.markers.lock().unwrap().insert((user, file));
        Ok(())
    }

    async fn take(&self, user: UserId, file: FileId) -> Result<bool, AppError> {
        Ok(self.markers.lock().unwrap().remove(&(user, file)))
    }
}

/// Scriptable platform client.
pub struct FakeMembership {
    /// `None` answers `get_chat` with a typed chat-not-found error.
    pub chat: Mutex<Option<ChatInfo>>,
    pub admins: Mutex<Vec<ChatAdmin>>,
    /// Answer for `is_chat_member`.
    pub member: AtomicBool,
    /// Force `is_chat_member` to fail with a typed platform error.
    pub membership_unavailable: AtomicBool,
    /// Force `get_chat_admins` to fail with "member list is inaccessible".
    pub admins_inaccessible: AtomicBool,
    /// `None` answers `export_invite_link` with a rights error.
    pub invite_link: Mutex<Option<String>>,
}

impl Default for FakeMembership {
    fn default() -> Self {
        Self {
            chat: Mutex::new(None),
            admins: Mutex::new(Vec::new()),
            member: AtomicBool::new(false),
            membership_unavailable: AtomicBool::new(false),
            admins_inaccessible: AtomicBool::new(false),
            invite_link: Mutex::new(Some("https://t.me/+invite".to_owned())),
        }
    }
}

impl FakeMembership {
    pub fn with_chat(info: ChatInfo) -> Self {
        let fake = Self::default();
        *fake.chat.lock().unwrap() = Some(info);
        fake
    }

    pub fn set_member(&self, member: bool) {
        self.member.store(member, Ordering::SeqCst);
    }
}

#[async_trait]
impl MembershipClient for FakeMembership {
    async fn get_chat(&self, _chat: &ChatRef) -> Result<ChatInfo, AppError> {
        self.chat.lock().unwrap().clone().ok_or(AppError::TgChatNotFound)
    }

    async fn get_chat_admins(&self, _chat_id: i64) -> Result<Vec<ChatAdmin>, AppError> {
        if self.admins_inaccessible.load(Ordering::SeqCst) {
            return Err(AppError::TgMemberListInaccessible);
        }
        Ok(self.admins.lock().unwrap().clone())
    }

    async fn is_chat_member(&self, _chat_id: i64, _user_id: i64) -> Result<bool, AppError> {
        if self.membership_unavailable.load(Ordering::SeqCst) {
            return Err(AppError::TgChatNotFound);
        }
        Ok(self.member.load(Ordering::SeqCst))
    }

    async fn export_invite_link(&self, _chat_id: i64) -> Result<String, AppError> {
        self.invite_link.lock().unwrap().clone().ok_or(AppError::TgNoRightsForInviteLink)
    }
}
