//! Classification of free-form chat references typed by the owner during
//! the connect flow: a private invite link or a public username.

use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::links::join_link::JOIN_LINK_RE;

static USERNAME_RE: Lazy<Regex> = lazy_regex!(r"(?:^|@|/)([a-zA-Z0-9_]{5,32})$");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Invite-link token from a `…/joinchat/…` link.
    JoinLink(String),
    /// Public handle with the `@` stripped.
    Username(String),
}

pub fn parse_chat_input(query: &str) -> Option<ChatInput> {
    if let Some(m) = JOIN_LINK_RE.captures(query).and_then(|c| c.get(1)) {
        return Some(ChatInput::JoinLink(m.as_str().to_owned()));
    }
    if let Some(m) = USERNAME_RE.captures(query).and_then(|c| c.get(1)) {
        return Some(ChatInput::Username(m.as_str().to_owned()));
    }
    None
}
