use crate::runner::Generator;
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Environment variable telling the command whether it may serve a cached answer
pub const USE_CACHE_ENV: &str = "CODEBOOK_USE_CACHE";

/// Generator backed by a shell command.
///
/// The prompt is written to the command's stdin while stdout and stderr are
/// drained concurrently; stdout is the response. A non-zero exit becomes an
/// error carrying the command's stderr, so connection failures reported by
/// the command are retried like any other. Dropping the call kills the child.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(&self, prompt: &str, use_cache: bool) -> anyhow::Result<String> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(USE_CACHE_ENV, if use_cache { "1" } else { "0" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn generator command `{}`", self.command))?;

        let mut stdin = child.stdin.take().context("Generator stdin was not captured")?;
        let mut stdout = child.stdout.take().context("Generator stdout was not captured")?;
        let mut stderr = child.stderr.take().context("Generator stderr was not captured")?;

        let write = async move {
            let written = stdin.write_all(prompt.as_bytes()).await;
            // Closing stdin signals end of prompt
            drop(stdin);
            match written {
                // The command finished without reading all of its input
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        let (written, read_out, read_err) = tokio::join!(
            write,
            stdout.read_to_end(&mut out),
            stderr.read_to_end(&mut err)
        );
        written.context("Failed to write prompt to generator stdin")?;
        read_out.context("Failed to read generator stdout")?;
        read_err.context("Failed to read generator stderr")?;

        let status = child
            .wait()
            .await
            .context("Failed to wait for generator command")?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&err);
            bail!("generator command exited with {status}: {}", stderr.trim());
        }

        String::from_utf8(out).context("Generator output is not valid UTF-8")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_stdin() {
        let generator = CommandGenerator::new("tr a-z A-Z");
        let response = generator.generate("hello", false).await.unwrap();
        assert_eq!(response, "HELLO");
    }

    #[tokio::test]
    async fn large_prompt_streams_through() {
        let prompt = "x".repeat(1_500_000);
        let generator = CommandGenerator::new("cat");
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            generator.generate(&prompt, false),
        )
        .await
        .expect("generator finished")
        .unwrap();
        assert_eq!(response.len(), prompt.len());
    }

    #[tokio::test]
    async fn command_may_ignore_its_input() {
        let prompt = "y".repeat(1_000_000);
        let generator = CommandGenerator::new("echo done");
        assert_eq!(generator.generate(&prompt, false).await.unwrap(), "done\n");
    }

    #[tokio::test]
    async fn cache_flag_is_exported() {
        let generator = CommandGenerator::new("cat >/dev/null; printf %s \"$CODEBOOK_USE_CACHE\"");
        assert_eq!(generator.generate("x", true).await.unwrap(), "1");
        assert_eq!(generator.generate("x", false).await.unwrap(), "0");
    }

    #[tokio::test]
    async fn failure_carries_stderr() {
        let generator = CommandGenerator::new("cat >/dev/null; echo 'connection reset' >&2; exit 3");
        let err = generator.generate("x", false).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("connection reset"));
        assert!(crate::retry::is_transient(&err));
    }
}
