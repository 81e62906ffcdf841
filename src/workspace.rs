// In-memory state behind the estimator pages. There is one session per
// project kind, shared by every browser talking to this process.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::breakdown::Estimate;
use crate::form::{ProjectForm, ProjectKind};

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSession {
    pub form: ProjectForm,
    pub result: Option<Estimate>,
    pub quotation: Option<String>,
    /// Shown once on the next page render.
    pub notice: Option<String>,
}

impl ProjectSession {
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            form: ProjectForm::new(kind),
            result: None,
            quotation: None,
            notice: None,
        }
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

#[derive(Debug)]
pub struct Workspace {
    sessions: HashMap<ProjectKind, ProjectSession>,
}

impl Workspace {
    pub fn new() -> Self {
        let sessions = ProjectKind::ALL
            .iter()
            .map(|&kind| (kind, ProjectSession::new(kind)))
            .collect();
        Self { sessions }
    }

    pub fn session_mut(&mut self, kind: ProjectKind) -> &mut ProjectSession {
        self.sessions
            .entry(kind)
            .or_insert_with(|| ProjectSession::new(kind))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The page's loading flag: at most one upstream request per flag at a time.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns `None` while another request holds the flag.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, so a cancelled request cannot leave the page
/// stuck in the loading state.
#[derive(Debug)]
pub struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        debug!("Request finished, clearing loading flag");
        self.0.store(false, Ordering::Release);
    }
}

/// One loading flag per project kind.
#[derive(Debug, Default)]
pub struct LoadingFlags {
    software: InFlight,
    construction: InFlight,
}

impl LoadingFlags {
    pub fn get(&self, kind: ProjectKind) -> &InFlight {
        match kind {
            ProjectKind::Software => &self.software,
            ProjectKind::Construction => &self.construction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_is_exclusive() {
        let flag = InFlight::new();
        let guard = flag.try_begin().expect("first request starts");
        assert!(flag.is_busy());
        assert!(flag.try_begin().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_begin().is_some());
    }

    #[test]
    fn test_loading_flags_are_per_kind() {
        let flags = LoadingFlags::default();
        let _software = flags.get(ProjectKind::Software).try_begin().unwrap();
        assert!(flags.get(ProjectKind::Construction).try_begin().is_some());
        assert!(flags.get(ProjectKind::Software).try_begin().is_none());
    }

    #[test]
    fn test_workspace_has_a_session_per_kind() {
        let mut workspace = Workspace::new();
        workspace.session_mut(ProjectKind::Software).notice = Some("hi".to_string());
        assert_eq!(
            workspace.session_mut(ProjectKind::Construction).form.kind(),
            ProjectKind::Construction
        );
        assert_eq!(
            workspace.session_mut(ProjectKind::Software).take_notice().as_deref(),
            Some("hi")
        );
        assert!(workspace.session_mut(ProjectKind::Software).notice.is_none());
    }
}
