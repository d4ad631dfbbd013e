use anyhow::Result;
use memoir_graph::{InboundMessage, MessageHandler};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const PROMPT: &[u8] = b"> ";

/// Read messages from stdin and print the answers; `/quit` or EOF ends the session
pub async fn run(handler: Arc<MessageHandler>, user_id: i64, name: Option<String>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(PROMPT).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if matches!(text, "/quit" | "/exit") {
            break;
        }

        if !text.is_empty() {
            let answer = handler
                .handle(InboundMessage::new(user_id, name.clone(), text))
                .await;
            stdout.write_all(answer.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }

        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;
    }

    Ok(())
}
