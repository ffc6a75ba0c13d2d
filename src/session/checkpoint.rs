//! Named pause points for debugging a pipeline run.
//!
//! A session announces each stage it reaches. A listener, present only in
//! development configurations, decides whether to pause there and open an
//! interactive view. Production runs carry no listener, so control flow
//! never depends on the process-wide breakpoint list.

use std::sync::{PoisonError, RwLock};

static BREAKPOINTS: RwLock<Vec<String>> = RwLock::new(Vec::new());

/// What a listener wants the session to do at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Continue,
    OpenView,
}

/// Receives checkpoint events from a session.
pub trait CheckpointListener: Send + Sync {
    fn on_checkpoint(&self, name: &str) -> Pause;
}

/// Replaces the process-wide breakpoint list.
///
/// Set once, before any session opens.
pub fn set_breakpoints<I, S>(names: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut list = BREAKPOINTS.write().unwrap_or_else(PoisonError::into_inner);
    *list = names.into_iter().map(Into::into).collect();
}

#[must_use]
pub fn breakpoints() -> Vec<String> {
    BREAKPOINTS.read().unwrap_or_else(PoisonError::into_inner).clone()
}

#[must_use]
pub fn is_breakpoint(name: &str) -> bool {
    BREAKPOINTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .any(|b| b == name)
}

/// Pauses at every checkpoint named in the breakpoint list.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakpointListener;

impl CheckpointListener for BreakpointListener {
    fn on_checkpoint(&self, name: &str) -> Pause {
        if is_breakpoint(name) {
            Pause::OpenView
        } else {
            Pause::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_follows_breakpoint_list() {
        let _guard = super::super::test_lock();
        set_breakpoints(["meshed"]);
        assert_eq!(BreakpointListener.on_checkpoint("meshed"), Pause::OpenView);
        assert_eq!(BreakpointListener.on_checkpoint("partitioned"), Pause::Continue);
        assert_eq!(breakpoints(), vec!["meshed".to_owned()]);
        set_breakpoints(Vec::<String>::new());
        assert!(!is_breakpoint("meshed"));
    }
}
