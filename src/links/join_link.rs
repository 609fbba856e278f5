//! Private invite-link payload decoding.
//!
//! A `t.me/joinchat/<token>` token is either 32 hex characters or unpadded
//! URL-safe base64. Both decode to 16 raw bytes: big-endian creator id
//! (i32), chat id (i32) and a random tail (i64).

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::core::errors::AppError;
use crate::links::mtproto_to_bot_id;

pub(crate) static JOIN_LINK_RE: Lazy<Regex> = lazy_regex!(r"/joinchat/([\da-zA-Z_-]+)$");
static HEX_TOKEN_RE: Lazy<Regex> = lazy_regex!(r"^[a-fA-F\d]{32}$");

/// Extracts the token from a `…/joinchat/<token>` link.
pub fn parse_join_link(v: &str) -> Option<&str> {
    JOIN_LINK_RE.captures(v).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinLinkPayload {
    pub creator_id: i32,
    pub chat_id: i32,
    pub random_id: i64,
}

impl JoinLinkPayload {
    pub fn decode(token: &str) -> Result<Self, AppError> {
        let raw = if HEX_TOKEN_RE.is_match(token) {
            hex::decode(token).map_err(|e| AppError::InvalidInput(format!("join link hex: {e}")))?
        } else {
            let mut padded = token.to_owned();
            while padded.len() % 4 != 0 {
                padded.push('=');
            }
            URL_SAFE
                .decode(padded)
                .map_err(|e| AppError::InvalidInput(format!("join link base64: {e}")))?
        };

        let bytes: [u8; 16] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AppError::InvalidInput(format!("join link payload is {} bytes, want 16", raw.len())))?;

        Ok(Self {
            creator_id: i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            chat_id: i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            random_id: i64::from_be_bytes([
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
            ]),
        })
    }

    /// Chat id in the Bot API id space.
    pub fn bot_chat_id(&self) -> i64 {
        mtproto_to_bot_id(self.chat_id)
    }
}
