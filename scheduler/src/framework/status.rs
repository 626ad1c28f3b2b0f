use std::fmt;

/// Outcome category of a plugin call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Success,
    /// Internal failure; aborts the scheduling attempt for this pod.
    Error,
    /// No node can take the pod right now.
    Unschedulable,
}

/// Result of running a plugin, with optional reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    code: Code,
    reasons: Vec<String>,
    plugin: Option<String>,
}

impl Status {
    pub fn new(code: Code, reason: impl Into<String>) -> Self {
        Self {
            code,
            reasons: vec![reason.into()],
            plugin: None,
        }
    }

    pub fn success() -> Self {
        Self {
            code: Code::Success,
            reasons: Vec::new(),
            plugin: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(Code::Error, reason)
    }

    pub fn unschedulable(reason: impl Into<String>) -> Self {
        Self::new(Code::Unschedulable, reason)
    }

    /// Records which plugin produced this status.
    pub fn with_plugin(mut self, plugin: &str) -> Self {
        self.plugin = Some(plugin.to_string());
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }

    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    pub fn message(&self) -> String {
        self.reasons.join(", ")
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{:?} from {}: {}", self.code, plugin, self.message()),
            None => write!(f, "{:?}: {}", self.code, self.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_message() {
        let status = Status::success();
        assert!(status.is_success());
        assert_eq!(status.message(), "");
    }

    #[test]
    fn test_error_display_names_plugin() {
        let status = Status::error("boom").with_plugin("EnergyScore");
        assert_eq!(status.code(), Code::Error);
        assert_eq!(status.to_string(), "Error from EnergyScore: boom");
    }
}
