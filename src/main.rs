mod config;
mod quiz;

use std::{sync::Arc, time::Duration};

use config::Config;
use dotenv::dotenv;
use quiz::{
    bank::QuestionBank,
    controller::{Outgoing, QuizController, Reply},
    report,
    session::{InMemorySessionStore, SessionStore},
    MAX_ANSWER, MIN_ANSWER,
};
use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::{CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, User},
    utils::command::BotCommands,
    RequestError,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const ANSWER_PREFIX: &str = "answer_";
const REFLECTION_DATA: &str = "reflection";
const ANIMATION_STEPS: usize = 10;
const ANIMATION_STEP_DELAY: Duration = Duration::from_millis(300);

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
enum Command {
    #[command(description = "начать тест заново")]
    Start,
    #[command(description = "показать текущий вопрос или результат")]
    Next,
    #[command(description = "статистика использования (для администраторов)")]
    Admin,
    #[command(description = "показать этот список")]
    Help,
}

/// Inline button payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Answer(u8),
    Reflection,
}

impl Action {
    fn parse(data: &str) -> Option<Self> {
        if data == REFLECTION_DATA {
            return Some(Action::Reflection);
        }
        let value = data.strip_prefix(ANSWER_PREFIX)?.parse().ok()?;
        Some(Action::Answer(value))
    }
}

struct App {
    controller: QuizController,
    progress_animation: bool,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting stress strategy bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    // A broken questions file shouldn't take the bot down: users get a
    // "no questions available" reply until it is fixed.
    let bank = match QuestionBank::load(&config.questions_path) {
        Ok(bank) => Some(bank),
        Err(err) => {
            log::error!(
                "Failed to load questions from {}: {}",
                config.questions_path.display(),
                err
            );
            None
        }
    };

    let bot = Bot::new(config.token.clone());
    match bot.get_me().await {
        Ok(me) => log::info!("Authorized as @{}", me.username()),
        Err(err) => {
            log::error!("Failed to connect to Telegram: {}", err);
            std::process::exit(1);
        }
    }
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Failed to register bot commands: {}", err);
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let app = Arc::new(App {
        controller: QuizController::new(bank, sessions, config.admins.clone()),
        progress_animation: config.progress_animation,
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![app])
        .default_handler(|upd| async move {
            log::debug!("Unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

fn display_name(user: Option<&User>) -> String {
    user.map(|u| u.first_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(report::DEFAULT_USER_NAME)
        .to_string()
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, app: Arc<App>) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0;
    let user_name = display_name(Some(user));

    let reply = match cmd {
        Command::Start => {
            log::info!("Start command received from user {}", user_id);
            app.controller.begin(user_id, &user_name)
        }
        Command::Next => {
            log::info!("Next command received from user {}", user_id);
            app.controller.advance(user_id, &user_name)
        }
        Command::Admin => {
            log::info!("Admin command received from user {}", user_id);
            app.controller.request_admin_stats(user_id, &user_name)
        }
        Command::Help => Ok(vec![Outgoing::Text(Command::descriptions().to_string())]),
    };

    respond(&bot, &app, msg.chat.id, &user_name, reply).await
}

async fn handle_callback(bot: Bot, q: CallbackQuery, app: Arc<App>) -> HandlerResult {
    // Stops the loading spinner on the button; nothing to do if it fails.
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let user_id = q.from.id.0;
    let user_name = display_name(Some(&q.from));
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .unwrap_or(ChatId(user_id as i64));

    let data = q.data.as_deref().unwrap_or_default();
    log::info!("Button pressed by user {}: {}", user_id, data);

    let reply = match Action::parse(data) {
        Some(Action::Answer(value)) => app.controller.submit_answer(user_id, &user_name, value),
        Some(Action::Reflection) => app.controller.reflection(user_id),
        None => {
            log::warn!("Unknown callback data from user {}: {:?}", user_id, data);
            return Ok(());
        }
    };

    respond(&bot, &app, chat_id, &user_name, reply).await
}

/// Sends the controller's reply, or the text for its error. Delivery
/// failures are logged and the user is asked to retry later.
async fn respond(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_name: &str,
    reply: Reply,
) -> HandlerResult {
    let replies = match reply {
        Ok(replies) => replies,
        Err(err) => {
            log::info!("Request in chat {} rejected: {}", chat_id.0, err);
            vec![Outgoing::Text(report::error_message(&err, user_name))]
        }
    };

    if let Err(err) = send_replies(bot, app, chat_id, replies).await {
        log::error!("Failed to deliver reply to chat {}: {}", chat_id.0, err);
        let _ = bot.send_message(chat_id, report::RETRY_LATER).await;
    }
    Ok(())
}

async fn send_replies(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    replies: Vec<Outgoing>,
) -> Result<(), RequestError> {
    for reply in replies {
        match reply {
            Outgoing::Text(text) => {
                bot.send_message(chat_id, text).await?;
            }
            Outgoing::Question(text) => {
                bot.send_message(chat_id, text)
                    .reply_markup(answer_keyboard())
                    .await?;
            }
            Outgoing::Report(text) => {
                if app.progress_animation {
                    show_progress_animation(bot, chat_id).await;
                }
                bot.send_message(chat_id, text)
                    .reply_markup(reflection_keyboard())
                    .await?;
            }
        }
    }
    Ok(())
}

fn answer_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![(MIN_ANSWER..=MAX_ANSWER)
        .map(|value| {
            InlineKeyboardButton::callback(value.to_string(), format!("{}{}", ANSWER_PREFIX, value))
        })
        .collect::<Vec<_>>()])
}

fn reflection_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        report::REFLECTION_BUTTON,
        REFLECTION_DATA,
    )]])
}

/// Purely cosmetic: a message counting up to 100% before the report.
/// Any failure just ends the animation early.
async fn show_progress_animation(bot: &Bot, chat_id: ChatId) {
    let progress = match bot.send_message(chat_id, report::processing_message(0)).await {
        Ok(message) => message,
        Err(err) => {
            log::debug!("Skipping progress animation in chat {}: {}", chat_id.0, err);
            return;
        }
    };

    for step in 1..=ANIMATION_STEPS {
        tokio::time::sleep(ANIMATION_STEP_DELAY).await;
        let text = report::processing_message(step * 100 / ANIMATION_STEPS);
        if let Err(err) = bot.edit_message_text(chat_id, progress.id, text).await {
            log::debug!("Progress animation interrupted in chat {}: {}", chat_id.0, err);
            break;
        }
    }

    let _ = bot.delete_message(chat_id, progress.id).await;
}
