use crate::commands::{self, Command};
use strata::Platform;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Reads commands until `quit` or end of input and writes one reply line per command.
///
/// Blank lines and lines starting with `#` are skipped. Failed commands reply with
/// `error: <message>` and the session continues.
///
/// # Errors
/// Only I/O failures on `input` or `output` end the session with an error.
pub(crate) async fn run<R, W>(platform: &Platform, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Shell session started");
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = match commands::parse(line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => commands::help(),
            Ok(command) => match commands::execute(platform.users(), command).await {
                Ok(json) => json,
                Err(err) => {
                    debug!(error = %err, "Command failed");
                    format!("error: {err}")
                },
            },
            Err(message) => format!("error: {message}"),
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    info!("Shell session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata::domain::config::AppConfig;

    fn platform() -> Platform {
        let mut config = AppConfig::default();
        config.database.name = "session-tests".to_owned();
        Platform::builder().config(config).build().expect("platform")
    }

    async fn transcript(script: &str) -> Vec<String> {
        let mut output = Vec::new();
        run(&platform(), script.as_bytes(), &mut output).await.expect("session");
        String::from_utf8(output).expect("utf8").lines().map(str::to_owned).collect()
    }

    #[tokio::test]
    async fn replies_once_per_command() {
        let lines = transcript(
            "create Al al@x.com\n\n# comment\nget 1\ndeactivate 1\nget 2\nlist\n",
        )
        .await;

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains(r#""id":1"#));
        assert!(lines[1].contains(r#""email":"al@x.com""#));
        assert!(lines[2].contains(r#""isActive":false"#));
        assert_eq!(lines[3], "error: User 2 not found");
        assert!(lines[4].starts_with('['));
    }

    #[tokio::test]
    async fn business_errors_do_not_end_the_session() {
        let lines = transcript(
            "create A al@x.com\ncreate Ad ad@x.com --admin\ndeactivate 1\nbogus\nlist\n",
        )
        .await;

        assert!(lines[0].starts_with("error: Invalid name"));
        assert!(lines[1].contains(r#""isAdmin":true"#));
        assert!(lines[2].starts_with("error: Operation not permitted"));
        assert!(lines[3].starts_with("error: "));
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let lines = transcript("help\nquit\nlist\n").await;
        assert!(lines[0].starts_with("Commands:"));
        assert!(!lines.iter().any(|l| l.starts_with('[')));
    }
}
