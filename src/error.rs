use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrankError {
    #[error("Invalid Google Drive link: {0}")]
    InvalidLink(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("External command failed ({}): {command}{}", exit_label(.code), stderr_suffix(.stderr))]
    ExternalTool {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid chapter manifest at line {line}: {message}")]
    Manifest { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FrankError {
    fn from(err: reqwest::Error) -> Self {
        FrankError::Transport(err.to_string())
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

pub type Result<T> = std::result::Result<T, FrankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message() {
        let err = FrankError::ExternalTool {
            command: "ffmpeg -y -i in.m4b".to_string(),
            code: Some(1),
            stderr: "boom\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "External command failed (exit code 1): ffmpeg -y -i in.m4b\nboom"
        );

        let err = FrankError::ExternalTool {
            command: "ffmpeg".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "External command failed (no exit code): ffmpeg");
    }

    #[test]
    fn test_manifest_message() {
        let err = FrankError::Manifest {
            line: 3,
            message: "expected <start>,<end>,<title>".to_string(),
        };
        assert!(err.to_string().contains("line 3"));
    }
}
