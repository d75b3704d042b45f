//! Telegram adapter
//!
//! Translates Telegram messages into [`InboundEvent`]s, runs them through the
//! [`PlateHandler`], and sends the rendered replies back.
//!
//! Conversations are keyed by chat and sender, so each member of a group
//! chat buffers photos separately. Teloxide's dispatcher processes updates of
//! one chat sequentially (its default distribution key is the chat id), which
//! keeps every sender's messages in order as the state machine requires.

use crate::handler::PlateHandler;
use crate::messages::{self, Reply};
use crate::session::ConversationState;
use plates_common::events::{ConversationId, InboundEvent, Outcome};
use std::sync::Arc;
use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    dptree,
    error_handlers::LoggingErrorHandler,
    net::Download,
    prelude::*,
    types::InputFile,
    utils::command::BotCommands,
};
use tracing::{debug, error, warn};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
type HandlerResult = Result<(), HandlerError>;

/// Bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "License plate bot commands:")]
pub enum Command {
    #[command(description = "show instructions")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "search by plate")]
    Search(String),
    #[command(description = "list all saved plates")]
    List,
    #[command(description = "database statistics")]
    Stats,
    #[command(rename = "check_db", description = "check the database connection")]
    CheckDb,
    #[command(description = "cancel the current operation")]
    Cancel,
}

/// Update routing: commands first, then photos, then plain text
pub fn schema() -> UpdateHandler<HandlerError> {
    let commands = dptree::entry()
        .filter_command::<Command>()
        .endpoint(on_command);

    let photos = dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(on_photo);

    let text = dptree::filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
        .endpoint(on_text);

    Update::filter_message()
        .branch(commands)
        .branch(photos)
        .branch(text)
}

/// Run the dispatcher until Ctrl+C
pub async fn run(bot: Bot, handler: Arc<PlateHandler>) {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![handler])
        .default_handler(|update| async move {
            debug!("Unhandled update: {:?}", update.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Publish the command list in the Telegram client menu
pub async fn register_commands(bot: &Bot) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }
}

/// Chat plus sender; chat alone when the message has no sender
fn conversation_of(msg: &Message) -> ConversationId {
    ConversationId::new(msg.chat.id.0, msg.from.as_ref().map(|user| user.id.0))
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    handler: Arc<PlateHandler>,
) -> HandlerResult {
    let conversation = conversation_of(&msg);
    debug!("Conversation {}: command {:?}", conversation, cmd);

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, messages::start_text()).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, messages::help_text()).await?;
        }
        Command::Search(query) if query.trim().is_empty() => {
            bot.send_message(msg.chat.id, messages::search_usage_text())
                .await?;
        }
        Command::Search(query) => {
            let outcome = handler
                .handle(InboundEvent::SearchRequested {
                    conversation,
                    query,
                })
                .await;
            send_outcome(&bot, &msg, outcome, false).await?;
        }
        Command::List => match handler.list_plates().await {
            Ok(plates) => {
                for chunk in messages::plate_list_messages(&plates) {
                    bot.send_message(msg.chat.id, chunk).await?;
                }
            }
            Err(e) => {
                error!("Listing plates failed: {}", e);
                bot.send_message(msg.chat.id, messages::LIST_FAILED).await?;
            }
        },
        Command::Stats => match handler.stats().await {
            Ok(stats) => {
                bot.send_message(msg.chat.id, messages::stats_text(&stats))
                    .await?;
            }
            Err(e) => {
                error!("Reading stats failed: {}", e);
                bot.send_message(msg.chat.id, messages::STATS_FAILED).await?;
            }
        },
        Command::CheckDb => {
            let text = match handler.diagnostics().await {
                Ok(diagnostics) => messages::diagnostics_text(&diagnostics),
                Err(e) => {
                    error!("Database check failed: {}", e);
                    messages::diagnostics_failed_text(&e)
                }
            };
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::Cancel => {
            let outcome = handler
                .handle(InboundEvent::CancelRequested { conversation })
                .await;
            send_outcome(&bot, &msg, outcome, false).await?;
        }
    }

    Ok(())
}

async fn on_photo(bot: Bot, msg: Message, handler: Arc<PlateHandler>) -> HandlerResult {
    let conversation = conversation_of(&msg);

    let photo = match download_largest_photo(&bot, &msg).await {
        Ok(photo) => photo,
        Err(e) => {
            error!("Conversation {}: error processing photo: {}", conversation, e);
            bot.send_message(msg.chat.id, messages::PHOTO_PROCESSING_FAILED)
                .await?;
            return Ok(());
        }
    };

    let outcome = handler
        .handle(InboundEvent::PhotoReceived {
            conversation,
            photo,
        })
        .await;
    send_outcome(&bot, &msg, outcome, false).await
}

async fn on_text(bot: Bot, msg: Message, handler: Arc<PlateHandler>) -> HandlerResult {
    let conversation = conversation_of(&msg);
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let was_saving = handler.sessions().state(conversation).await != ConversationState::Idle;
    let outcome = handler
        .handle(InboundEvent::TextReceived {
            conversation,
            text: text.to_string(),
        })
        .await;
    send_outcome(&bot, &msg, outcome, was_saving).await
}

/// Fetch the highest-resolution variant of the message's photo
async fn download_largest_photo(bot: &Bot, msg: &Message) -> Result<Vec<u8>, HandlerError> {
    let photo = msg
        .photo()
        .and_then(|sizes| {
            sizes
                .iter()
                .max_by_key(|size| u64::from(size.width) * u64::from(size.height))
        })
        .ok_or("message carries no photo")?;

    let file = bot.get_file(photo.file.id.clone()).await?;
    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data).await?;
    Ok(data)
}

async fn send_outcome(
    bot: &Bot,
    msg: &Message,
    outcome: Outcome,
    was_saving: bool,
) -> HandlerResult {
    match messages::render(outcome, was_saving) {
        Reply::Text(text) => {
            bot.send_message(msg.chat.id, text).await?;
        }
        Reply::Photos { caption, photos } => {
            for (index, photo) in photos.into_iter().enumerate() {
                let file =
                    InputFile::memory(photo).file_name(messages::photo_file_name(index));
                bot.send_photo(msg.chat.id, file)
                    .caption(caption.clone())
                    .await?;
            }
        }
    }
    Ok(())
}
