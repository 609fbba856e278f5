use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::AppError;
use crate::domain::chat::ChatId;
use crate::domain::user::UserId;
use crate::ids;

pub type FileId = i64;

/// Media kind of a shared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Document,
    Animation,
    Audio,
    Photo,
    Video,
    Voice,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Document => "document",
            Kind::Animation => "animation",
            Kind::Audio => "audio",
            Kind::Photo => "photo",
            Kind::Video => "video",
            Kind::Voice => "voice",
        }
    }

    pub fn parse(v: &str) -> Result<Self, AppError> {
        match v {
            "document" => Ok(Kind::Document),
            "animation" => Ok(Kind::Animation),
            "audio" => Ok(Kind::Audio),
            "photo" => Ok(Kind::Photo),
            "video" => Ok(Kind::Video),
            "voice" => Ok(Kind::Voice),
            other => Err(AppError::InvalidInput(format!("unknown file kind: {other}"))),
        }
    }
}

/// Kind-specific extras stored alongside the file as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
}

/// Access gate attached by the owner: a downloader must be a member of the
/// referenced chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadRestriction {
    pub chat_id: Option<ChatId>,
}

impl DownloadRestriction {
    pub fn has_chat(self) -> bool {
        self.chat_id.is_some()
    }
}

/// A shared object, addressable by its opaque public id.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: FileId,
    /// Platform-native object id, used to re-send the media.
    pub telegram_id: String,
    pub public_id: String,
    pub caption: Option<String>,
    pub kind: Kind,
    pub mime_type: Option<String>,
    pub name: Option<String>,
    pub size: Option<i64>,
    pub owner_id: UserId,
    pub restriction: DownloadRestriction,
    /// `tg://` link to the channel post that advertised this file.
    pub linked_post_uri: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl File {
    /// Picks a fresh public id within the same length class. Used after an
    /// insert collision.
    pub fn regen_public_id(&mut self) {
        self.public_id = ids::generate(ids::is_long(&self.public_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [Kind::Document, Kind::Animation, Kind::Audio, Kind::Photo, Kind::Video, Kind::Voice] {
            assert_eq!(Kind::parse(kind.as_str()).ok(), Some(kind));
        }
        assert!(Kind::parse("sticker").is_err());
    }

    #[test]
    fn regenerated_id_keeps_the_length_class() {
        let mut file = File {
            id: 1,
            telegram_id: "abc".into(),
            public_id: ids::generate(true),
            caption: None,
            kind: Kind::Document,
            mime_type: None,
            name: None,
            size: None,
            owner_id: 1,
            restriction: DownloadRestriction::default(),
            linked_post_uri: None,
            metadata: Metadata::default(),
            created_at: Utc::now(),
        };
        let before = file.public_id.clone();
        file.regen_public_id();
        assert_ne!(file.public_id, before);
        assert_eq!(file.public_id.len(), before.len());
    }

    #[test]
    fn empty_metadata_serializes_compactly() {
        let json = serde_json::to_string(&Metadata::default()).ok();
        assert_eq!(json.as_deref(), Some("{}"));
    }
}
