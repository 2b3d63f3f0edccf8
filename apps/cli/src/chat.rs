//! Interactive raw-ISCP chat with the receiver.

use anyhow::Result;
use onkyo_core::eiscp::CommandTransport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const DEVICE_NAME: &str = "TX-L20D";

const BANNER: &str = "Chat session with Onkyo TX-L20D established.\n\
Type EISCP commands or 'exit' to quit.\n\
Type 'history' to list the commands sent so far.\n\
Use Ctrl+C or Ctrl+D to terminate the session.\n";

/// Runs the chat loop until `exit` or EOF.
///
/// Every non-empty line other than `exit` and `history` is forwarded as-is
/// and the next response is printed. Device errors are printed and the loop
/// continues. Returns the lines sent during the session.
///
/// Ctrl+C is not handled here: a pending stdin read cannot be cancelled, so
/// the caller terminates the process on interrupt instead.
pub async fn run<R, W>(transport: &dyn CommandTransport, input: R, mut out: W) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut history: Vec<String> = Vec::new();

    out.write_all(BANNER.as_bytes()).await?;

    loop {
        out.write_all(b"> ").await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            out.write_all(b"\nTerminating chat session...\n").await?;
            break;
        };

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") {
            out.write_all(b"Terminating chat session...\n").await?;
            break;
        }
        if command.eq_ignore_ascii_case("history") {
            for (i, entry) in history.iter().enumerate() {
                out.write_all(format!("{:>4}  {}\n", i + 1, entry).as_bytes())
                    .await?;
            }
            continue;
        }

        history.push(command.to_string());
        let reply = match transport.send_and_await(command).await {
            Ok(response) => format!("{}: {}\n", DEVICE_NAME, response),
            Err(e) => format!("Error: {}\n", e),
        };
        out.write_all(reply.as_bytes()).await?;
    }

    out.flush().await?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use onkyo_core::{EiscpError, EiscpResult};

    /// Echoes volume queries and times out on everything else.
    #[derive(Default)]
    struct EchoTransport {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandTransport for EchoTransport {
        async fn send(&self, command: &str) -> EiscpResult<()> {
            self.sent.lock().unwrap().push(command.to_string());
            Ok(())
        }

        async fn send_and_await(&self, command: &str) -> EiscpResult<String> {
            self.sent.lock().unwrap().push(command.to_string());
            if command == "MVLQSTN" {
                Ok("MVL1E".to_string())
            } else {
                Err(EiscpError::Timeout(Duration::from_secs(2)))
            }
        }
    }

    async fn chat(script: &str) -> (String, Vec<String>, Vec<String>) {
        let transport = EchoTransport::default();
        let mut out = Vec::new();
        let history = run(&transport, script.as_bytes(), &mut out).await.unwrap();
        let sent = transport.sent.lock().unwrap().clone();
        (String::from_utf8(out).unwrap(), history, sent)
    }

    #[tokio::test]
    async fn forwards_lines_and_prints_responses() {
        let (out, history, sent) = chat("MVLQSTN\n\n  \nEXIT\nPWR01\n").await;

        assert!(out.starts_with("Chat session with Onkyo TX-L20D established."));
        assert!(out.contains("TX-L20D: MVL1E\n"), "{out}");
        assert_eq!(sent, vec!["MVLQSTN"]);
        assert_eq!(history, vec!["MVLQSTN"]);
    }

    #[tokio::test]
    async fn errors_do_not_end_the_session() {
        let (out, _, sent) = chat("SLIQSTN\nMVLQSTN\n").await;

        assert!(out.contains("Error: "), "{out}");
        assert!(out.contains("TX-L20D: MVL1E"), "{out}");
        assert_eq!(sent, vec!["SLIQSTN", "MVLQSTN"]);
        assert!(out.ends_with("Terminating chat session...\n"));
    }

    #[tokio::test]
    async fn history_lists_sent_lines() {
        let (out, history, sent) = chat("MVLQSTN\nPWRQSTN\nhistory\nHistory\n").await;

        assert_eq!(out.matches("   1  MVLQSTN\n   2  PWRQSTN\n").count(), 2, "{out}");
        assert_eq!(history.len(), 2);
        assert_eq!(sent.len(), 2);
    }
}
