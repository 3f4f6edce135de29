//! Two-photo capture flow
//!
//! Drives a camera through the near/far capture sequence the form needs:
//! stage a shot into a temporary file, let the user review it, then accept,
//! redo, or cancel. Cancellation never leaves staged files behind. The
//! camera itself sits behind a trait so the flow runs the same against a
//! device camera, a file import, or a test stub.

mod relocate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use thiserror::Error;
use tracing::warn;

pub use relocate::{
    category_folder, relocate_photo, sanitize_title, DEFAULT_PHOTO_NAME, UNCATEGORIZED_FOLDER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Near,
    Far,
}

impl PhotoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PhotoKind::Near => "near",
            PhotoKind::Far => "far",
        }
    }
}

/// Shutter seam. Writes a JPEG to `target` or fails.
pub trait Camera {
    fn shoot(&mut self, target: &Path) -> Result<()>;
}

/// "Camera" that adopts an existing image file, for CLI use where the shot
/// was taken elsewhere.
pub struct FileImportCamera {
    source: PathBuf,
}

impl FileImportCamera {
    pub fn new(source: PathBuf) -> Self {
        Self { source }
    }
}

impl Camera for FileImportCamera {
    fn shoot(&mut self, target: &Path) -> Result<()> {
        std::fs::copy(&self.source, target)
            .with_context(|| format!("cannot import photo from {}", self.source.display()))?;
        Ok(())
    }
}

/// What happens to an already-accepted near photo when the far step is
/// abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPolicy {
    RetainNear,
    DiscardAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    CapturingNear,
    ReviewingNear,
    CapturingFar,
    ReviewingFar,
    Done,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: FlowState,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted paths once the flow reaches `Done`; near and far are
/// independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub near: Option<PathBuf>,
    pub far: Option<PathBuf>,
}

pub struct CaptureFlow {
    staging_dir: PathBuf,
    title: String,
    policy: CancelPolicy,
    state: FlowState,
    /// Shot staged for the state we are currently in
    pending: Option<PathBuf>,
    near: Option<PathBuf>,
    far: Option<PathBuf>,
    /// Whether `near` was staged by this flow (a resumed path is not ours
    /// to discard)
    near_staged: bool,
}

impl CaptureFlow {
    pub fn new(staging_dir: &Path, title: &str, policy: CancelPolicy) -> Self {
        Self::resume(staging_dir, title, policy, None, None)
    }

    /// Re-enter the flow with photos accepted earlier (editing an entry).
    pub fn resume(
        staging_dir: &Path,
        title: &str,
        policy: CancelPolicy,
        near: Option<PathBuf>,
        far: Option<PathBuf>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.to_path_buf(),
            title: title.to_string(),
            policy,
            state: FlowState::Idle,
            pending: None,
            near,
            far,
            near_staged: false,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn near_path(&self) -> Option<&Path> {
        self.near.as_deref()
    }

    pub fn far_path(&self) -> Option<&Path> {
        self.far.as_deref()
    }

    /// Begin capturing; returns the staging target the camera must write.
    pub fn start(&mut self, kind: PhotoKind) -> Result<PathBuf, CaptureError> {
        if self.state != FlowState::Idle {
            return Err(self.invalid("start"));
        }
        std::fs::create_dir_all(&self.staging_dir)?;

        let target = self.allocate(kind);
        self.pending = Some(target.clone());
        self.state = match kind {
            PhotoKind::Near => FlowState::CapturingNear,
            PhotoKind::Far => FlowState::CapturingFar,
        };
        Ok(target)
    }

    /// The camera wrote the staged file; move to review.
    pub fn capture_succeeded(&mut self) -> Result<(), CaptureError> {
        self.state = match self.state {
            FlowState::CapturingNear => FlowState::ReviewingNear,
            FlowState::CapturingFar => FlowState::ReviewingFar,
            _ => return Err(self.invalid("finish capturing")),
        };
        Ok(())
    }

    /// The camera failed; equivalent to cancelling the current step.
    pub fn capture_failed(&mut self) -> Result<(), CaptureError> {
        match self.state {
            FlowState::CapturingNear | FlowState::CapturingFar => {
                self.cancel();
                Ok(())
            }
            _ => Err(self.invalid("fail capturing")),
        }
    }

    /// Discard the shot under review and re-stage for another attempt.
    pub fn redo(&mut self) -> Result<PathBuf, CaptureError> {
        let kind = match self.state {
            FlowState::ReviewingNear => PhotoKind::Near,
            FlowState::ReviewingFar => PhotoKind::Far,
            _ => return Err(self.invalid("redo")),
        };
        if let Some(old) = self.pending.take() {
            discard_file(&old);
        }

        let target = self.allocate(kind);
        self.pending = Some(target.clone());
        self.state = match kind {
            PhotoKind::Near => FlowState::CapturingNear,
            PhotoKind::Far => FlowState::CapturingFar,
        };
        Ok(target)
    }

    /// Keep the near shot and continue to the far capture.
    pub fn next(&mut self) -> Result<PathBuf, CaptureError> {
        if self.state != FlowState::ReviewingNear {
            return Err(self.invalid("continue to far"));
        }
        self.near = self.pending.take();
        self.near_staged = true;

        let target = self.allocate(PhotoKind::Far);
        self.pending = Some(target.clone());
        self.state = FlowState::CapturingFar;
        Ok(target)
    }

    /// Keep the shot under review and finish the flow.
    pub fn accept(&mut self) -> Result<(), CaptureError> {
        match self.state {
            FlowState::ReviewingNear => {
                self.near = self.pending.take();
                self.near_staged = true;
            }
            FlowState::ReviewingFar => {
                self.far = self.pending.take();
            }
            _ => return Err(self.invalid("accept")),
        }
        self.state = FlowState::Done;
        Ok(())
    }

    /// Abandon the current step. Always removes the staged shot; whether an
    /// already-accepted near photo survives a far-step cancel is the
    /// flow's [`CancelPolicy`].
    pub fn cancel(&mut self) {
        if self.state == FlowState::Done {
            return;
        }

        let in_far_step = matches!(
            self.state,
            FlowState::CapturingFar | FlowState::ReviewingFar
        );
        if let Some(pending) = self.pending.take() {
            discard_file(&pending);
        }
        if in_far_step && self.policy == CancelPolicy::DiscardAll && self.near_staged {
            if let Some(near) = self.near.take() {
                discard_file(&near);
            }
            self.near_staged = false;
        }
        self.state = FlowState::Idle;
    }

    /// Accepted paths, available only once the flow is `Done`.
    pub fn outcome(self) -> Option<CaptureOutcome> {
        if self.state != FlowState::Done {
            return None;
        }
        Some(CaptureOutcome {
            near: self.near,
            far: self.far,
        })
    }

    fn allocate(&self, kind: PhotoKind) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d %H-%M-%S");
        self.staging_dir.join(format!(
            "{} {} {}.jpg",
            sanitize_title(&self.title),
            stamp,
            kind.as_str()
        ))
    }

    fn invalid(&self, action: &'static str) -> CaptureError {
        CaptureError::InvalidState {
            action,
            state: self.state,
        }
    }
}

/// Best-effort file removal for staged photos and deleted entries.
pub fn discard_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!("could not remove {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct StubCamera;

    impl Camera for StubCamera {
        fn shoot(&mut self, target: &Path) -> Result<()> {
            std::fs::write(target, b"jpeg")?;
            Ok(())
        }
    }

    struct BrokenCamera;

    impl Camera for BrokenCamera {
        fn shoot(&mut self, _target: &Path) -> Result<()> {
            anyhow::bail!("shutter jammed")
        }
    }

    fn staged_files(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(read) => read.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn shoot_into(flow_target: &Path, camera: &mut dyn Camera) {
        camera.shoot(flow_target).unwrap();
    }

    #[test]
    fn test_near_only_flow() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        let target = flow.start(PhotoKind::Near).unwrap();
        assert_eq!(flow.state(), FlowState::CapturingNear);
        shoot_into(&target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        assert_eq!(flow.state(), FlowState::ReviewingNear);
        flow.accept().unwrap();
        assert_eq!(flow.state(), FlowState::Done);

        let outcome = flow.outcome().unwrap();
        let near = outcome.near.unwrap();
        assert!(near.exists());
        assert_eq!(outcome.far, None);
    }

    #[test]
    fn test_two_photo_flow_yields_two_distinct_paths() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        let near_target = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&near_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();

        let far_target = flow.next().unwrap();
        assert_eq!(flow.state(), FlowState::CapturingFar);
        assert_ne!(near_target, far_target);
        shoot_into(&far_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        flow.accept().unwrap();

        let outcome = flow.outcome().unwrap();
        let near = outcome.near.unwrap();
        let far = outcome.far.unwrap();
        assert_ne!(near, far);
        assert!(near.exists());
        assert!(far.exists());
    }

    #[test]
    fn test_cancel_leaves_no_staged_files() {
        let dir = tempdir().unwrap();

        // Cancel while capturing
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);
        let target = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&target, &mut StubCamera);
        flow.cancel();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(staged_files(dir.path()).is_empty());

        // Cancel while reviewing
        let target = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        flow.cancel();
        assert!(staged_files(dir.path()).is_empty());
        assert!(flow.outcome().is_none());
    }

    #[test]
    fn test_capture_failure_cleans_up() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        let target = flow.start(PhotoKind::Near).unwrap();
        assert!(BrokenCamera.shoot(&target).is_err());
        flow.capture_failed().unwrap();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn test_redo_discards_previous_shot() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        let first = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&first, &mut StubCamera);
        flow.capture_succeeded().unwrap();

        let second = flow.redo().unwrap();
        assert_eq!(flow.state(), FlowState::CapturingNear);
        assert!(!first.exists() || first == second);

        shoot_into(&second, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        flow.accept().unwrap();
        assert_eq!(flow.outcome().unwrap().near, Some(second));
    }

    #[test]
    fn test_cancel_far_retains_near_by_default() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        let near_target = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&near_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        let far_target = flow.next().unwrap();
        shoot_into(&far_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();

        flow.cancel();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(!far_target.exists());
        assert!(near_target.exists());
        assert_eq!(flow.near_path(), Some(near_target.as_path()));
    }

    #[test]
    fn test_cancel_far_discard_all_policy() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::DiscardAll);

        let near_target = flow.start(PhotoKind::Near).unwrap();
        shoot_into(&near_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        let far_target = flow.next().unwrap();
        shoot_into(&far_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();

        flow.cancel();
        assert!(staged_files(dir.path()).is_empty());
        assert_eq!(flow.near_path(), None);
    }

    #[test]
    fn test_discard_all_does_not_touch_resumed_photos() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("settled near.jpg");
        std::fs::write(&existing, b"jpeg").unwrap();

        let mut flow = CaptureFlow::resume(
            dir.path(),
            "Mural",
            CancelPolicy::DiscardAll,
            Some(existing.clone()),
            None,
        );
        let far_target = flow.start(PhotoKind::Far).unwrap();
        shoot_into(&far_target, &mut StubCamera);
        flow.capture_succeeded().unwrap();
        flow.cancel();

        // The far shot goes, the photo accepted in an earlier flow stays
        assert!(!far_target.exists());
        assert!(existing.exists());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let dir = tempdir().unwrap();
        let mut flow = CaptureFlow::new(dir.path(), "Mural", CancelPolicy::RetainNear);

        assert!(flow.accept().is_err());
        assert!(flow.redo().is_err());
        assert!(flow.next().is_err());

        flow.start(PhotoKind::Near).unwrap();
        assert!(flow.start(PhotoKind::Near).is_err());
    }

    #[test]
    fn test_file_import_camera() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("from-device.jpg");
        std::fs::write(&source, b"jpeg").unwrap();
        let target = dir.path().join("staged.jpg");

        FileImportCamera::new(source.clone()).shoot(&target).unwrap();
        assert!(target.exists());
        assert!(source.exists());

        let missing = FileImportCamera::new(dir.path().join("absent.jpg"))
            .shoot(&dir.path().join("t2.jpg"));
        assert!(missing.is_err());
    }
}
