//! Link grammars: invite-link payloads, bot deep links, chat input parsing
//! and the MTProto/Bot chat-id transforms.

pub mod chat_input;
pub mod deep_link;
pub mod join_link;

pub use chat_input::{parse_chat_input, ChatInput};
pub use deep_link::{extract_deep_link_public_ids, split_start_payload, REF_PREFIX};
pub use join_link::{parse_join_link, JoinLinkPayload};

/// Offset between the MTProto and Bot API chat id spaces.
const ID_OFFSET: i64 = 1_000_000_000_000;

/// Maps an MTProto-space channel id into the Bot API id space.
pub fn mtproto_to_bot_id(id: i32) -> i64 {
    -(i64::from(id) + ID_OFFSET)
}

/// Inverse of [`mtproto_to_bot_id`].
pub fn bot_to_mtproto_id(id: i64) -> i64 {
    -(id % -ID_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_channel_id_transform() {
        assert_eq!(mtproto_to_bot_id(5000), -(5000 + 1_000_000_000_000));
    }

    #[test]
    fn transforms_round_trip() {
        for id in [1, 5000, 1_129_109_101, i32::MAX] {
            assert_eq!(bot_to_mtproto_id(mtproto_to_bot_id(id)), i64::from(id));
        }
    }
}
