//! User-facing texts. Everything the bot says lives here so handlers stay
//! free of string literals.

use crate::core::errors::AppError;
use crate::domain::Chat;
use crate::service::chat::ChatDetails;
use crate::service::{ChatSubRequest, OwnedFile, SummaryStats};

/// Telegram sends this text when the user taps the intro button under the
/// bot description.
pub const WHAT_CAN_THIS_BOT_DO: &str = "Что умеет этот бот?";

pub const HELP: &str = "Я помогаю делиться файлами в Telegram.\n\n\
    Пришли мне документ, фото, видео, аудио или голосовое сообщение, и я отвечу ссылкой. \
    Каждый, кто откроет её, получит файл от меня, даже когда тебя нет в сети.\n\n\
    В настройках можно подключить свой канал или группу: тогда перед выдачей файла \
    я попрошу получателя подписаться.";

pub const UNSUPPORTED_KIND: &str =
    "Я такое не умею. Пришли мне документ, фото, видео, аудио или голосовое сообщение.";

pub const FILE_NOT_FOUND: &str = "Файл не найден. Возможно, владелец удалил его.";

pub const MEMBERSHIP_UNVERIFIABLE: &str =
    "Не получилось проверить подписку. Попробуй ещё раз чуть позже.";

pub const NOT_SUBSCRIBED_YET: &str =
    "Подписка не найдена. Подпишись и нажми «Проверить подписку» ещё раз.";

pub const FILE_DELETED: &str = "Файл удалён. Ссылка больше не работает.";

pub const FILE_DELETE_CONFIRM: &str =
    "Точно удалить файл? Все разосланные ссылки перестанут работать.";

pub const SETTINGS: &str = "Настройки";

pub const SETTINGS_CHATS: &str = "Подключённые каналы и группы.\n\n\
    Подключённый чат можно назначить файлу: перед выдачей такого файла я попрошу \
    получателя подписаться.";

pub const SETTINGS_CHATS_EMPTY: &str = "Пока не подключено ни одного канала или группы.";

pub const CONNECT_PROMPT: &str = "Пришли мне @username канала или группы, ссылку на него \
    или перешли любой пост из него.\n\n\
    Я должен быть администратором с правом приглашать пользователей, и ты тоже должен \
    быть администратором.";

pub const CONNECT_BAD_INPUT: &str =
    "Не понимаю. Нужен @username, ссылка вида t.me/... или пересланный пост.";

pub const CHAT_DELETE_CONFIRM: &str =
    "Точно отключить чат? Файлы, привязанные к нему, станут доступны без подписки.";

pub const CHAT_DISCONNECTED: &str = "Чат отключён.";

pub const RESTRICTIONS_NO_CHATS: &str = "Сначала подключи канал или группу в настройках.";

pub const RESTRICTIONS_PROMPT: &str = "Выбери канал или группу. Файл будет выдаваться \
    только после подписки на выбранный чат. Повторное нажатие снимает ограничение.";

/// Share link of a file.
pub fn deep_link(bot_username: &str, public_id: &str) -> String {
    format!("https://t.me/{bot_username}?start={public_id}")
}

/// The owner's view of a file: share link plus download counters.
pub fn owned_file(bot_username: &str, owned: &OwnedFile) -> String {
    let mut text = String::new();
    if let Some(name) = &owned.file.name {
        text.push_str(&format!("Файл: {name}\n"));
    }
    text.push_str(&format!("Ссылка: {}\n\n", deep_link(bot_username, &owned.file.public_id)));
    text.push_str(&format!(
        "Скачиваний: {} (уникальных пользователей: {})\n",
        owned.stats.total, owned.stats.unique_users
    ));
    if owned.file.restriction.has_chat() {
        text.push_str(&format!(
            "По подписке: {} (новых подписок: {})\n",
            owned.stats.with_subscription, owned.stats.new_subscription
        ));
    }
    if let Some(uri) = &owned.file.linked_post_uri {
        text.push_str(&format!("\nПост с файлом: {uri}\n"));
    }
    text
}

pub fn subscription_gate(gate: &ChatSubRequest) -> String {
    format!(
        "Файл доступен подписчикам «{}».\n\nПодпишись и нажми «Проверить подписку».",
        gate.title
    )
}

pub fn settings(long_ids: bool) -> String {
    let mode = if long_ids { "длинные" } else { "короткие" };
    format!("Настройки\n\nСсылки на новые файлы: {mode}.")
}

pub fn chat_details(details: &ChatDetails) -> String {
    format!(
        "{}\n\nФайлов с подпиской на этот чат: {}\nСкачиваний по подписке: {} (новых подписок: {})",
        details.chat.title,
        details.files_count,
        details.stats.with_subscription,
        details.stats.new_subscription
    )
}

pub fn chat_connected(chat: &Chat) -> String {
    format!("Готово, «{}» подключён. Теперь его можно назначить любому файлу.", chat.title)
}

pub fn restriction_enabled(chat_title: &str) -> String {
    format!("Теперь файл выдаётся после подписки на «{chat_title}».")
}

pub fn restriction_disabled() -> String {
    "Файл снова доступен без подписки.".to_owned()
}

pub fn admin_summary(stats: &SummaryStats) -> String {
    format!(
        "Пользователей: {}\nФайлов: {}\nСкачиваний: {}\nПодключённых чатов: {}",
        stats.users, stats.files, stats.downloads, stats.chats
    )
}

pub fn version() -> String {
    format!("sharefile-bot v{}", env!("CARGO_PKG_VERSION"))
}

/// Text for chat-connect failures the user can act on. `None` means the
/// error is not theirs to fix.
pub fn connect_error(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::ChatNotFoundOrBotIsNotAdmin => {
            Some("Не вижу такой чат. Проверь адрес и сделай меня администратором.")
        }
        AppError::ChatIsUser => Some("Это личный аккаунт, подключить можно только канал или группу."),
        AppError::BotIsNotChatAdmin => Some("Сначала сделай меня администратором этого чата."),
        AppError::BotNotEnoughRights => {
            Some("Мне не хватает права приглашать пользователей в этом чате.")
        }
        AppError::UserIsNotChatAdmin => Some("Подключать чат может только его администратор."),
        AppError::ChatAlreadyConnected => Some("Этот чат уже подключён."),
        _ => None,
    }
}
