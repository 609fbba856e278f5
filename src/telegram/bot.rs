//! Bot instance creation and the command set.

use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::{BotCommands, ParseError};

/// Keeps the raw `/start` payload in one piece. The default parser rejects
/// a bare `/start` followed by a deep-link payload.
fn raw_payload(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_owned(),))
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "начало работы", parse_with = raw_payload)]
    Start(String),
    #[command(description = "краткая справка")]
    Help,
    #[command(description = "настройки")]
    Settings,
    #[command(description = "сводная статистика (только для администратора)")]
    Admin,
    #[command(description = "версия бота")]
    Version,
}

/// Creates a Bot instance, honoring a custom Bot API server when
/// `BOT_API_URL` is set.
pub fn create_bot() -> anyhow::Result<Bot> {
    let bot = Bot::from_env();
    match std::env::var("BOT_API_URL") {
        Ok(api_url) => {
            log::info!("using custom Bot API URL: {}", api_url);
            let url = url::Url::parse(&api_url).map_err(|e| anyhow::anyhow!("invalid BOT_API_URL: {e}"))?;
            Ok(bot.set_api_url(url))
        }
        Err(_) => Ok(bot),
    }
}

/// Publishes the command list shown in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "начало работы"),
        BotCommand::new("help", "краткая справка"),
        BotCommand::new("settings", "настройки"),
        BotCommand::new("version", "версия бота"),
    ])
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn start_keeps_its_payload() {
        assert_eq!(
            Command::parse("/start dVQK8", "cleepy_bot").ok(),
            Some(Command::Start("dVQK8".to_owned()))
        );
        assert_eq!(
            Command::parse("/start ref_teleblog-dVQK8", "cleepy_bot").ok(),
            Some(Command::Start("ref_teleblog-dVQK8".to_owned()))
        );
    }

    #[test]
    fn bare_start_parses_to_an_empty_payload() {
        assert_eq!(Command::parse("/start", "cleepy_bot").ok(), Some(Command::Start(String::new())));
    }

    #[test]
    fn plain_commands_parse() {
        assert_eq!(Command::parse("/settings", "cleepy_bot").ok(), Some(Command::Settings));
        assert_eq!(Command::parse("/help@cleepy_bot", "cleepy_bot").ok(), Some(Command::Help));
    }
}
