use serde::Serialize;
use std::fmt;

/// Process-wide indexing run state, owned by the run controller
///
/// Only two transitions exist: `Idle -> Running` on an accepted start, and
/// `Running -> Idle` on stop or task completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_running() {
        assert!(RunState::Running.is_running());
        assert!(!RunState::Idle.is_running());
        assert_eq!(RunState::Idle.to_string(), "idle");
    }
}
