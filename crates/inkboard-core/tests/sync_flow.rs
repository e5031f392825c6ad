//! Admin/View Sync Integration Tests
//!
//! Tests two editor windows sharing a canvas file:
//! - The admin publishes, the view applies
//! - Concurrent edits surface a conflict
//! - Each resolution strategy settles it

use inkboard_core::canvas::CanvasState;
use inkboard_core::editor::EditorSession;
use inkboard_core::shapes::ObjectType;
use inkboard_core::storage::FileSource;
use inkboard_core::sync::{ResolutionStrategy, SyncEngine, SyncError, SyncOutcome};
use inkboard_core::tools::ToolSettings;
use kurbo::{Point, Size};
use pollster::block_on;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

struct Window {
    session: EditorSession,
    engine: SyncEngine<FileSource>,
}

impl Window {
    fn admin(dir: &TempDir) -> Self {
        Self::open(dir, EditorSession::new(CanvasState::new(), ToolSettings::default()))
    }

    fn view(dir: &TempDir) -> Self {
        Self::open(dir, EditorSession::read_only(CanvasState::new()))
    }

    fn open(dir: &TempDir, session: EditorSession) -> Self {
        let source = Arc::new(FileSource::new(dir.path().join("board.json")));
        let mut engine = SyncEngine::new(source);
        engine.start();
        Self { session, engine }
    }

    fn publish(&mut self) {
        let state = self.session.state().clone();
        assert!(block_on(self.engine.publish(&state)).is_some());
    }

    fn poll(&mut self) -> SyncOutcome {
        let local = self.session.state().clone();
        block_on(self.engine.notify_changed(&local))
    }

    fn accept(&mut self, strategy: ResolutionStrategy) {
        let resolved = self.engine.resolve(strategy).unwrap();
        self.session.replace_state(resolved);
    }
}

// ============================================================================
// Admin -> View
// ============================================================================

#[test]
fn test_view_follows_admin_with_remote_strategy() {
    let dir = tempdir().unwrap();
    let mut admin = Window::admin(&dir);
    let mut view = Window::view(&dir);

    admin.session.add_object(ObjectType::Text).unwrap();
    admin.publish();

    assert!(matches!(view.poll(), SyncOutcome::Conflict(_)));
    view.accept(ResolutionStrategy::Remote);
    assert_eq!(view.session.state().objects, admin.session.state().objects);

    // Nothing changed since: the view sees the same state again.
    let outcome = view.poll();
    assert!(matches!(outcome, SyncOutcome::Applied(ref s) if s.objects == admin.session.state().objects));
}

#[test]
fn test_admin_does_not_reimport_own_publish() {
    let dir = tempdir().unwrap();
    let mut admin = Window::admin(&dir);
    admin.session.add_object(ObjectType::Shape).unwrap();
    admin.publish();

    let local = admin.session.state().clone();
    assert_eq!(block_on(admin.engine.poll(&local)), SyncOutcome::Unchanged);
}

// ============================================================================
// Conflicts
// ============================================================================

/// Two admins edit the same file. Returns both windows, the object only the
/// left window has, and the object only the right window published.
fn diverged(dir: &TempDir) -> (Window, Window, String, String) {
    let mut left = Window::admin(dir);
    let mut right = Window::admin(dir);

    let shared = left
        .session
        .add_object_at(ObjectType::Shape, Point::new(100.0, 100.0), Size::new(100.0, 100.0))
        .unwrap();
    left.publish();
    assert!(matches!(right.poll(), SyncOutcome::Conflict(_)));
    right.accept(ResolutionStrategy::Remote);

    // Right moves the shared object later than left's last edit and adds its own.
    right.session.select(&shared).unwrap();
    right.session.rotate_selected(90.0).unwrap();
    let theirs = right
        .session
        .add_object_at(ObjectType::Text, Point::new(600.0, 600.0), Size::new(100.0, 40.0))
        .unwrap();
    right.publish();

    let mine = left
        .session
        .add_object_at(ObjectType::Image, Point::new(1200.0, 200.0), Size::new(100.0, 100.0))
        .unwrap();
    (left, right, mine, theirs)
}

#[test]
fn test_merge_takes_newest_of_each_object() {
    let dir = tempdir().unwrap();
    let (mut left, right, mine, theirs) = diverged(&dir);

    assert!(matches!(left.poll(), SyncOutcome::Conflict(_)));
    assert_eq!(left.poll(), SyncOutcome::Pending);
    left.accept(ResolutionStrategy::Merge);

    let state = left.session.state();
    assert!(state.object(&mine).is_some());
    assert!(state.object(&theirs).is_some());
    assert_eq!(state.objects.len(), 3);
    let shared = &right.session.state().objects[0];
    assert_eq!(state.object(&shared.id).unwrap().rotation, 90.0);
}

#[test]
fn test_local_strategy_keeps_local_state() {
    let dir = tempdir().unwrap();
    let (mut left, _right, mine, theirs) = diverged(&dir);
    let before = left.session.state().clone();

    assert!(matches!(left.poll(), SyncOutcome::Conflict(_)));
    left.accept(ResolutionStrategy::Local);

    assert_eq!(**left.session.state(), *before);
    assert!(left.session.state().object(&mine).is_some());
    assert!(left.session.state().object(&theirs).is_none());
}

#[test]
fn test_remote_strategy_takes_remote_state() {
    let dir = tempdir().unwrap();
    let (mut left, right, mine, _theirs) = diverged(&dir);

    assert!(matches!(left.poll(), SyncOutcome::Conflict(_)));
    left.accept(ResolutionStrategy::Remote);

    assert_eq!(left.session.state().objects, right.session.state().objects);
    assert!(left.session.state().object(&mine).is_none());
}

#[test]
fn test_unknown_strategy_leaves_conflict_pending() {
    let dir = tempdir().unwrap();
    let (mut left, _right, _mine, _theirs) = diverged(&dir);

    assert!(matches!(left.poll(), SyncOutcome::Conflict(_)));
    assert!(matches!(
        left.engine.resolve_token("newest"),
        Err(SyncError::UnsupportedStrategy(_))
    ));
    assert!(left.engine.pending_conflict().is_some());
}

#[test]
fn test_broken_file_reports_error_and_keeps_watching() {
    let dir = tempdir().unwrap();
    let mut view = Window::view(&dir);
    std::fs::write(dir.path().join("board.json"), "{ half written").unwrap();

    assert!(matches!(view.poll(), SyncOutcome::Error(_)));
    assert!(view.engine.is_watching());
    assert!(view.engine.last_error().is_some());
}
