use crate::normalize::refine;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::borrow::Cow;

/// Result of a program run that finished inside its limits
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Raw captured standard output
    #[serde(serialize_with = "lossy_text")]
    pub stdout: Bytes,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
    /// Exit status code
    pub code: Option<i32>,
    /// Wall-clock time from spawn to exit
    pub elapsed_ms: u64,
}

impl RunOutcome {
    /// Standard output as text
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard output after normalization
    pub fn refined(&self) -> String {
        refine(&self.stdout_text())
    }
}

fn lossy_text<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refined_output() {
        let outcome = RunOutcome {
            stdout: Bytes::from_static(b"  HELLO\n\n"),
            stderr: String::new(),
            code: Some(0),
            elapsed_ms: 3,
        };
        assert_eq!(outcome.stdout_text(), "  HELLO\n\n");
        assert_eq!(outcome.refined(), "HELLO");
    }

    #[test]
    fn serializes_stdout_as_text() {
        let outcome = RunOutcome {
            stdout: Bytes::from_static(b"42\n"),
            stderr: "warn".into(),
            code: Some(0),
            elapsed_ms: 10,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["stdout"], "42\n");
        assert_eq!(json["stderr"], "warn");
        assert_eq!(json["code"], 0);
    }
}
