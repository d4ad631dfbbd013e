use memoir_graph::{InboundMessage, MessageHandler};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};

/// Answer text messages until the process is interrupted
pub async fn run(bot_token: String, handler: Arc<MessageHandler>) {
    let bot = Bot::new(bot_token);
    info!("Starting Telegram long polling");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let handler = handler.clone();
        async move {
            let (Some(text), Some(from)) = (msg.text(), msg.from.as_ref()) else {
                return respond(());
            };

            let inbound = InboundMessage::new(from.id.0 as i64, from.username.clone(), text);
            let answer = handler.handle(inbound).await;

            if let Err(err) = bot.send_message(msg.chat.id, answer).await {
                warn!(chat_id = msg.chat.id.0, error = %err, "Failed to deliver answer");
            }
            respond(())
        }
    })
    .await;

    info!("Telegram long polling stopped");
}
