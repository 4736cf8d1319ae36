use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished service control command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stderr if present, otherwise stdout, trimmed to one message
    pub fn message(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Run a command to completion and capture its output
pub async fn run(program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_stderr() {
        let output = CommandOutput {
            code: Some(1),
            stdout: "ignored".to_string(),
            stderr: "Failed to stop foo.service:\n  Access denied\n".to_string(),
        };
        assert!(!output.success());
        assert_eq!(output.message(), "Failed to stop foo.service: Access denied");
    }

    #[test]
    fn test_message_falls_back_to_stdout() {
        let output = CommandOutput {
            code: Some(0),
            stdout: "[SC] ChangeServiceConfig SUCCESS\r\n".to_string(),
            stderr: "  ".to_string(),
        };
        assert!(output.success());
        assert_eq!(output.message(), "[SC] ChangeServiceConfig SUCCESS");
    }
}
