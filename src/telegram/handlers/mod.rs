//! The dispatcher handler tree. `schema` wires the branches; the
//! submodules hold one update flow each.

mod callbacks;
mod channel_post;
mod commands;
mod files;
mod messages;
mod schema;
mod settings;
mod types;

pub use callbacks::CallbackCommand;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
