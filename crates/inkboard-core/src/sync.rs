//! File-watch synchronization between an editor and a shared state source.
//!
//! The engine is tick-driven like the auto-save manager: the host checks
//! [`SyncEngine::should_poll`] from its event loop and awaits
//! [`SyncEngine::poll`]. A change notification from a file watcher goes
//! through [`SyncEngine::notify_changed`] instead.
//!
//! Any divergence between the local state and the source is a conflict. The
//! engine then waits for an explicit [`ResolutionStrategy`] and does nothing
//! else until the conflict is resolved or dismissed.

use crate::canvas::CanvasState;
use crate::shapes::{CanvasObject, Stroke};
use crate::storage::{BoxFuture, StorageError, StorageResult};
use crate::timestamp::{iso_now, now_millis};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default polling interval in milliseconds.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 5_000;

/// Opaque change token of a state source. Only compared for equality.
pub type Revision = u64;

/// A shared canvas state that another window may rewrite at any time.
pub trait StateSource: Send + Sync {
    /// Current change token, or `None` when nothing has been written yet.
    fn revision(&self) -> BoxFuture<'_, StorageResult<Option<Revision>>>;

    /// Read and parse the current state.
    fn read(&self) -> BoxFuture<'_, StorageResult<CanvasState>>;

    /// Replace the contents with `state` and return the new revision.
    fn write(&self, state: &CanvasState) -> BoxFuture<'_, StorageResult<Revision>>;

    /// Human-readable location, used in log and status messages.
    fn describe(&self) -> String;
}

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unsupported resolution strategy: {0}")]
    UnsupportedStrategy(String),
    #[error("No conflict is pending")]
    NoPendingConflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// How to settle a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    /// Keep the local state unchanged.
    Local,
    /// Take the remote state unchanged.
    Remote,
    /// Per-entity merge, newest `lastModified` wins.
    Merge,
}

impl ResolutionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionStrategy::Local => "local",
            ResolutionStrategy::Remote => "remote",
            ResolutionStrategy::Merge => "merge",
        }
    }
}

impl FromStr for ResolutionStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ResolutionStrategy::Local),
            "remote" => Ok(ResolutionStrategy::Remote),
            "merge" => Ok(ResolutionStrategy::Merge),
            other => Err(SyncError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two diverging states awaiting a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConflict {
    pub local_state: CanvasState,
    pub remote_state: CanvasState,
    /// Detection time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl SyncConflict {
    pub fn new(local_state: CanvasState, remote_state: CanvasState) -> Self {
        Self {
            local_state,
            remote_state,
            timestamp: now_millis(),
        }
    }

    /// Settle the conflict with `strategy`.
    pub fn resolve(&self, strategy: ResolutionStrategy) -> CanvasState {
        resolve_conflict(&self.local_state, &self.remote_state, strategy)
    }
}

/// Whether two states differ anywhere in their serialized form.
///
/// A difference in the whole-state `lastModified` alone counts as a conflict.
pub fn detect_conflict(local: &CanvasState, remote: &CanvasState) -> bool {
    match (serde_json::to_value(local), serde_json::to_value(remote)) {
        (Ok(local), Ok(remote)) => local != remote,
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Treating unserializable state as a conflict: {}", e);
            true
        }
    }
}

/// Settle a conflict between `local` and `remote`.
pub fn resolve_conflict(
    local: &CanvasState,
    remote: &CanvasState,
    strategy: ResolutionStrategy,
) -> CanvasState {
    match strategy {
        ResolutionStrategy::Local => local.clone(),
        ResolutionStrategy::Remote => remote.clone(),
        ResolutionStrategy::Merge => merge_states(local, remote),
    }
}

/// Per-entity merge of objects and strokes.
///
/// For every id present on either side the entry with the greater
/// `lastModified` wins; on a tie the local entry is kept. Local entries keep
/// their order, remote-only entries follow in remote order. The canvas
/// settings and tool buttons are taken from `local`.
pub fn merge_states(local: &CanvasState, remote: &CanvasState) -> CanvasState {
    CanvasState {
        canvas: local.canvas,
        objects: merge_by_id(&local.objects, &remote.objects, |o: &CanvasObject| {
            (o.id.as_str(), o.last_modified)
        }),
        strokes: merge_by_id(&local.strokes, &remote.strokes, |s: &Stroke| {
            (s.id.as_str(), s.last_modified)
        }),
        tool_buttons: local.tool_buttons.clone(),
        last_modified: iso_now(),
    }
}

fn merge_by_id<T, K>(local: &[T], remote: &[T], key: impl Fn(&T) -> (&str, K)) -> Vec<T>
where
    T: Clone,
    K: PartialOrd,
{
    let mut merged: Vec<T> = local.to_vec();
    let mut index: HashMap<String, usize> = local
        .iter()
        .enumerate()
        .map(|(i, item)| (key(item).0.to_string(), i))
        .collect();

    for item in remote {
        let (id, stamp) = key(item);
        match index.get(id).copied() {
            Some(i) => {
                if stamp > key(&merged[i]).1 {
                    merged[i] = item.clone();
                }
            }
            None => {
                index.insert(id.to_string(), merged.len());
                merged.push(item.clone());
            }
        }
    }
    merged
}

/// Where the engine is in its watch cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Watching,
    /// A changed source is being read and compared.
    Applying,
    ConflictPending(SyncConflict),
}

/// Result of one poll or notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The engine is stopped.
    Idle,
    /// The source did not change, or is not due yet.
    Unchanged,
    /// The source matches the local state; this is the state to show.
    Applied(CanvasState),
    /// A new conflict was detected.
    Conflict(SyncConflict),
    /// A conflict is still waiting for a decision.
    Pending,
    /// Reading the source failed; watching continues.
    Error(String),
}

/// Watches a [`StateSource`] and reconciles it with the local state.
pub struct SyncEngine<S: StateSource> {
    source: Arc<S>,
    phase: SyncPhase,
    /// Whether `start` was called without a matching `stop`.
    active: bool,
    interval: Duration,
    last_poll: Option<Instant>,
    /// Last revision read or written, so unchanged sources are not re-read.
    last_revision: Option<Revision>,
    last_error: Option<String>,
}

impl<S: StateSource> SyncEngine<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            phase: SyncPhase::Idle,
            active: false,
            interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
            last_poll: None,
            last_revision: None,
            last_error: None,
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    /// Begin watching. The first poll is due immediately.
    pub fn start(&mut self) {
        log::info!("Watching {}", self.source.describe());
        self.active = true;
        self.last_poll = None;
        if !matches!(self.phase, SyncPhase::ConflictPending(_)) {
            self.phase = SyncPhase::Watching;
        }
    }

    /// Stop watching. No further polls are due after this returns and any
    /// pending conflict is dropped.
    pub fn stop(&mut self) {
        if self.active {
            log::info!("Stopped watching {}", self.source.describe());
        }
        self.active = false;
        self.phase = SyncPhase::Idle;
    }

    pub fn is_watching(&self) -> bool {
        self.active
    }

    /// Whether the host should call [`poll`](Self::poll) now.
    pub fn should_poll(&self) -> bool {
        if self.phase != SyncPhase::Watching {
            return false;
        }
        match self.last_poll {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Re-read the source if its revision changed since the last read or
    /// write and compare it with `local`.
    pub async fn poll(&mut self, local: &CanvasState) -> SyncOutcome {
        if let Some(outcome) = self.blocked() {
            return outcome;
        }
        self.last_poll = Some(Instant::now());

        let revision = match self.source.revision().await {
            Ok(revision) => revision,
            Err(e) => return self.fail(e),
        };
        match revision {
            None => SyncOutcome::Unchanged,
            Some(r) if Some(r) == self.last_revision => SyncOutcome::Unchanged,
            Some(r) => self.fetch(local, Some(r)).await,
        }
    }

    /// The source reported a change: re-read it unconditionally.
    pub async fn notify_changed(&mut self, local: &CanvasState) -> SyncOutcome {
        if let Some(outcome) = self.blocked() {
            return outcome;
        }
        let revision = match self.source.revision().await {
            Ok(revision) => revision,
            Err(e) => return self.fail(e),
        };
        self.fetch(local, revision).await
    }

    /// Compare a freshly read `remote` state with `local`.
    pub fn receive(&mut self, local: &CanvasState, remote: CanvasState) -> SyncOutcome {
        if let Some(outcome) = self.blocked() {
            return outcome;
        }

        if detect_conflict(local, &remote) {
            log::warn!("Conflict with {}", self.source.describe());
            let conflict = SyncConflict::new(local.clone(), remote);
            self.phase = SyncPhase::ConflictPending(conflict.clone());
            return SyncOutcome::Conflict(conflict);
        }

        self.phase = self.resting_phase();
        SyncOutcome::Applied(remote)
    }

    /// The conflict awaiting a decision, if any.
    pub fn pending_conflict(&self) -> Option<&SyncConflict> {
        match &self.phase {
            SyncPhase::ConflictPending(conflict) => Some(conflict),
            _ => None,
        }
    }

    /// Settle the pending conflict and return the state to adopt locally.
    pub fn resolve(&mut self, strategy: ResolutionStrategy) -> SyncResult<CanvasState> {
        let conflict = self.take_conflict().ok_or(SyncError::NoPendingConflict)?;
        log::info!("Resolving conflict with strategy '{}'", strategy);
        Ok(conflict.resolve(strategy))
    }

    /// Settle the pending conflict with a strategy token.
    ///
    /// An unknown token leaves the conflict pending.
    pub fn resolve_token(&mut self, token: &str) -> SyncResult<CanvasState> {
        let strategy = token.parse::<ResolutionStrategy>()?;
        self.resolve(strategy)
    }

    /// Drop the pending conflict without changing anything.
    pub fn dismiss_conflict(&mut self) -> Option<SyncConflict> {
        let conflict = self.take_conflict();
        if conflict.is_some() {
            log::info!("Conflict dismissed");
        }
        conflict
    }

    /// Write `state` to the source and remember the revision so the write is
    /// not read back as a remote change.
    pub async fn publish(&mut self, state: &CanvasState) -> Option<Revision> {
        match self.source.write(state).await {
            Ok(revision) => {
                log::debug!("Published state to {}", self.source.describe());
                self.last_revision = Some(revision);
                self.last_error = None;
                Some(revision)
            }
            Err(e) => {
                log::error!("Failed to publish to {}: {}", self.source.describe(), e);
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn blocked(&self) -> Option<SyncOutcome> {
        match self.phase {
            SyncPhase::Idle => Some(SyncOutcome::Idle),
            SyncPhase::ConflictPending(_) => Some(SyncOutcome::Pending),
            SyncPhase::Watching | SyncPhase::Applying => None,
        }
    }

    async fn fetch(&mut self, local: &CanvasState, revision: Option<Revision>) -> SyncOutcome {
        self.phase = SyncPhase::Applying;
        let remote = match self.source.read().await {
            Ok(remote) => remote,
            Err(e) => {
                self.phase = self.resting_phase();
                return self.fail(e);
            }
        };
        self.last_revision = revision;
        self.last_error = None;
        self.receive(local, remote)
    }

    fn fail(&mut self, error: StorageError) -> SyncOutcome {
        log::error!("Sync with {} failed: {}", self.source.describe(), error);
        let message = error.to_string();
        self.last_error = Some(message.clone());
        SyncOutcome::Error(message)
    }

    fn take_conflict(&mut self) -> Option<SyncConflict> {
        if !matches!(self.phase, SyncPhase::ConflictPending(_)) {
            return None;
        }
        let resting = self.resting_phase();
        match std::mem::replace(&mut self.phase, resting) {
            SyncPhase::ConflictPending(conflict) => Some(conflict),
            _ => None,
        }
    }

    fn resting_phase(&self) -> SyncPhase {
        if self.active {
            SyncPhase::Watching
        } else {
            SyncPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasConfig;
    use crate::shapes::{ObjectOverrides, ObjectType, OverlapRule, create_object, move_object};
    use crate::storage::MemorySource;
    use crate::tools::ToolKind;
    use kurbo::{Point, Size};
    use pollster::block_on;
    use proptest::prelude::*;

    fn object(id: &str, x: f64, last_modified: u64) -> CanvasObject {
        let mut object = create_object(
            ObjectType::Shape,
            Point::new(x, 0.0),
            Size::new(40.0, 40.0),
            &CanvasConfig::default(),
            ObjectOverrides::new(),
        );
        object.id = id.to_string();
        object.last_modified = last_modified;
        object
    }

    fn stroke(id: &str, last_modified: Option<u64>) -> Stroke {
        let mut stroke = Stroke::begin(ToolKind::Pen, Point::ZERO, "#000000", 2.0);
        stroke.id = id.to_string();
        stroke.last_modified = last_modified;
        stroke
    }

    fn state_with(objects: Vec<CanvasObject>) -> CanvasState {
        CanvasState::new().with_objects(objects)
    }

    fn watching(source: MemorySource) -> SyncEngine<MemorySource> {
        let mut engine = SyncEngine::new(Arc::new(source));
        engine.start();
        engine
    }

    #[test]
    fn test_detect_conflict() {
        let state = state_with(vec![object("1", 0.0, 100)]);
        assert!(!detect_conflict(&state, &state.clone()));

        let mut other = state.clone();
        other.objects[0].rotation = 90.0;
        assert!(detect_conflict(&state, &other));

        let mut retimed = state.clone();
        retimed.last_modified = "2000-01-01T00:00:00.000Z".to_string();
        assert!(detect_conflict(&state, &retimed));
    }

    #[test]
    fn test_merge_newer_remote_wins() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let remote = state_with(vec![object("1", 200.0, 200)]);

        let merged = resolve_conflict(&local, &remote, ResolutionStrategy::Merge);
        assert_eq!(merged.objects, remote.objects);
    }

    #[test]
    fn test_merge_tie_keeps_local() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let remote = state_with(vec![object("1", 200.0, 100)]);

        let merged = resolve_conflict(&local, &remote, ResolutionStrategy::Merge);
        assert_eq!(merged.objects, local.objects);
    }

    #[test]
    fn test_merge_union_order() {
        let local = state_with(vec![object("a", 0.0, 5), object("b", 40.0, 5)]);
        let remote = state_with(vec![object("c", 80.0, 1), object("b", 120.0, 9), object("d", 160.0, 1)]);

        let merged = merge_states(&local, &remote);
        let ids: Vec<&str> = merged.objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(merged.objects[1].position.x, 120.0);
    }

    #[test]
    fn test_merge_strokes_without_stamps() {
        let mut local = CanvasState::new();
        local.strokes = vec![stroke("s", None), stroke("t", Some(10))];
        let mut remote = CanvasState::new();
        remote.strokes = vec![stroke("s", None), stroke("t", None), stroke("u", None)];
        remote.strokes[0].width = 9.0;

        let merged = merge_states(&local, &remote);
        assert_eq!(merged.strokes.len(), 3);
        assert_eq!(merged.strokes[0].width, 2.0);
        assert_eq!(merged.strokes[1].last_modified, Some(10));
    }

    #[test]
    fn test_merge_keeps_local_canvas_and_buttons() {
        let local = CanvasState::new()
            .with_tool_button(crate::shapes::create_tool_button(Point::ZERO, ToolKind::Pen, &CanvasConfig::default()));
        let remote = CanvasState::with_canvas(CanvasConfig {
            width: 800.0,
            height: 600.0,
            grid_size: 10.0,
        });

        let merged = merge_states(&local, &remote);
        assert_eq!(merged.canvas, local.canvas);
        assert_eq!(merged.tool_buttons, local.tool_buttons);
    }

    #[test]
    fn test_local_strategy_ignores_newer_remote() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let remote = state_with(vec![object("1", 200.0, 900)]);
        assert_eq!(resolve_conflict(&local, &remote, ResolutionStrategy::Local), local);
        assert_eq!(resolve_conflict(&local, &remote, ResolutionStrategy::Remote), remote);
    }

    #[test]
    fn test_strategy_tokens() {
        assert_eq!("merge".parse::<ResolutionStrategy>().unwrap(), ResolutionStrategy::Merge);
        assert!(matches!(
            "theirs".parse::<ResolutionStrategy>(),
            Err(SyncError::UnsupportedStrategy(token)) if token == "theirs"
        ));
    }

    #[test]
    fn test_idle_engine_does_nothing() {
        let mut engine = SyncEngine::new(Arc::new(MemorySource::new()));
        assert!(!engine.should_poll());
        assert_eq!(block_on(engine.poll(&CanvasState::new())), SyncOutcome::Idle);
    }

    #[test]
    fn test_poll_applies_identical_state() {
        let state = state_with(vec![object("1", 0.0, 100)]);
        let mut engine = watching(MemorySource::with_state(&state).unwrap());
        assert!(engine.should_poll());

        assert_eq!(block_on(engine.poll(&state)), SyncOutcome::Applied(state.clone()));
        assert!(!engine.should_poll());
        assert_eq!(block_on(engine.poll(&state)), SyncOutcome::Unchanged);
        assert_eq!(engine.phase(), &SyncPhase::Watching);
    }

    #[test]
    fn test_poll_surfaces_conflict_and_waits() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let remote = state_with(vec![object("1", 200.0, 200)]);
        let mut engine = watching(MemorySource::with_state(&remote).unwrap());

        let outcome = block_on(engine.poll(&local));
        assert!(matches!(outcome, SyncOutcome::Conflict(ref c) if c.remote_state == remote));
        assert!(engine.pending_conflict().is_some());
        assert!(!engine.should_poll());
        assert_eq!(block_on(engine.notify_changed(&local)), SyncOutcome::Pending);

        let resolved = engine.resolve(ResolutionStrategy::Merge).unwrap();
        assert_eq!(resolved.objects, remote.objects);
        assert_eq!(engine.phase(), &SyncPhase::Watching);
        assert!(matches!(engine.resolve(ResolutionStrategy::Local), Err(SyncError::NoPendingConflict)));
    }

    #[test]
    fn test_bad_token_keeps_conflict() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let mut engine = watching(MemorySource::with_state(&CanvasState::new()).unwrap());
        block_on(engine.poll(&local));

        assert!(engine.resolve_token("both").is_err());
        assert!(engine.pending_conflict().is_some());
        assert_eq!(engine.resolve_token("local").unwrap(), local);
    }

    #[test]
    fn test_dismiss_conflict() {
        let mut engine = watching(MemorySource::new());
        let outcome = engine.receive(&CanvasState::new(), state_with(vec![object("1", 0.0, 1)]));
        assert!(matches!(outcome, SyncOutcome::Conflict(_)));
        assert!(engine.dismiss_conflict().is_some());
        assert!(engine.dismiss_conflict().is_none());
        assert_eq!(engine.phase(), &SyncPhase::Watching);
    }

    #[test]
    fn test_published_write_is_not_reimported() {
        let local = state_with(vec![object("1", 0.0, 100)]);
        let mut engine = watching(MemorySource::new());

        let moved = local.with_object_replaced(move_object(&local.objects[0], Point::new(100.0, 0.0), &local.canvas));
        assert!(block_on(engine.publish(&moved)).is_some());
        assert_eq!(block_on(engine.poll(&moved)), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_read_error_keeps_watching() {
        let source = MemorySource::new();
        source.put_raw("{ not json").unwrap();
        let mut engine = watching(source);

        let outcome = block_on(engine.poll(&CanvasState::new()));
        assert!(matches!(outcome, SyncOutcome::Error(_)));
        assert!(engine.last_error().is_some());
        assert_eq!(engine.phase(), &SyncPhase::Watching);

        let state = CanvasState::new();
        engine.source().put_raw(&state.to_json().unwrap()).unwrap();
        assert_eq!(block_on(engine.notify_changed(&state)), SyncOutcome::Applied(state.clone()));
        assert!(engine.last_error().is_none());
    }

    #[test]
    fn test_stop_drops_conflict() {
        let mut engine = watching(MemorySource::new());
        engine.receive(&CanvasState::new(), state_with(vec![object("1", 0.0, 1)]));
        engine.stop();
        assert!(!engine.is_watching());
        assert!(engine.pending_conflict().is_none());
        assert!(!engine.should_poll());
    }

    #[test]
    fn test_stopped_engine_ignores_received_state() {
        let mut engine = watching(MemorySource::new());
        engine.stop();
        let outcome = engine.receive(&CanvasState::new(), state_with(vec![object("1", 0.0, 1)]));
        assert_eq!(outcome, SyncOutcome::Idle);
        assert!(engine.pending_conflict().is_none());
        assert_eq!(engine.phase(), &SyncPhase::Idle);
    }

    fn arb_state() -> impl Strategy<Value = CanvasState> {
        prop::collection::vec((0u32..90, 1u64..1_000_000), 1..8).prop_map(|entries| {
            let objects = entries
                .into_iter()
                .enumerate()
                .map(|(i, (x, stamp))| object(&i.to_string(), f64::from(x) * 20.0, stamp))
                .collect();
            state_with(objects)
        })
    }

    proptest! {
        #[test]
        fn prop_state_never_conflicts_with_its_copy(state in arb_state()) {
            prop_assert!(!detect_conflict(&state, &state.clone()));
        }

        #[test]
        fn prop_any_single_field_change_conflicts(
            state in arb_state(),
            pick in any::<prop::sample::Index>(),
            field in 0usize..5,
        ) {
            let mut changed = state.clone();
            let target = &mut changed.objects[pick.index(state.objects.len())];
            match field {
                0 => target.rotation += 1.0,
                1 => target.position.y += 20.0,
                2 => target.last_modified += 1,
                3 => target.z_index += 1,
                _ => target.overlap_rule = OverlapRule::Allow,
            }
            prop_assert!(detect_conflict(&state, &changed));
        }
    }
}
