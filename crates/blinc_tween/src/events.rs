//! Tween lifecycle notifications
//!
//! Units and tweens record [`TweenEvent`]s while they advance; the owning
//! tween hands them to its [`TweenListeners`] synchronously, in the order the
//! transitions happened.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// A lifecycle notification
#[derive(Clone, Debug, PartialEq)]
pub enum TweenEvent {
    /// The tween was put into play
    Active,
    /// The first unit left its start delay
    Start,
    /// A unit wrote an interpolated value
    Update { unit: usize, key: String, value: f32 },
    /// A unit bounced and now plays backward
    Yoyo { unit: usize, key: String },
    /// A unit began a repeated forward pass
    Repeat { unit: usize, key: String },
    /// A unit reached its end and is holding
    Hold { unit: usize, key: String },
    /// A unit finished all of its passes
    UnitComplete { unit: usize, key: String },
    /// The whole tween restarted for another loop
    Loop,
    Pause,
    Resume,
    Stop,
    /// Every unit completed (after any complete delay)
    Complete,
}

/// Discriminant of [`TweenEvent`], used to key listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenEventKind {
    Active,
    Start,
    Update,
    Yoyo,
    Repeat,
    Hold,
    UnitComplete,
    Loop,
    Pause,
    Resume,
    Stop,
    Complete,
}

impl TweenEvent {
    pub fn kind(&self) -> TweenEventKind {
        match self {
            TweenEvent::Active => TweenEventKind::Active,
            TweenEvent::Start => TweenEventKind::Start,
            TweenEvent::Update { .. } => TweenEventKind::Update,
            TweenEvent::Yoyo { .. } => TweenEventKind::Yoyo,
            TweenEvent::Repeat { .. } => TweenEventKind::Repeat,
            TweenEvent::Hold { .. } => TweenEventKind::Hold,
            TweenEvent::UnitComplete { .. } => TweenEventKind::UnitComplete,
            TweenEvent::Loop => TweenEventKind::Loop,
            TweenEvent::Pause => TweenEventKind::Pause,
            TweenEvent::Resume => TweenEventKind::Resume,
            TweenEvent::Stop => TweenEventKind::Stop,
            TweenEvent::Complete => TweenEventKind::Complete,
        }
    }
}

/// Listener callback type
pub type Listener = Box<dyn FnMut(&TweenEvent)>;

/// Event buffer filled by a unit during one update
pub type EventOutbox = SmallVec<[TweenEvent; 4]>;

/// Listener registry for one tween or chain
#[derive(Default)]
pub struct TweenListeners {
    by_kind: FxHashMap<TweenEventKind, SmallVec<[Listener; 2]>>,
    any: Vec<Listener>,
}

impl TweenListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event
    pub fn on<F>(&mut self, kind: TweenEventKind, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.by_kind
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Register a listener receiving every event
    pub fn on_any<F>(&mut self, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.any.push(Box::new(listener));
    }

    /// Drop all listeners of a kind
    pub fn off(&mut self, kind: TweenEventKind) {
        self.by_kind.remove(&kind);
    }

    pub fn clear(&mut self) {
        self.by_kind.clear();
        self.any.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.any.is_empty() && self.by_kind.values().all(|l| l.is_empty())
    }

    /// Whether dispatching an event of `kind` would reach any listener
    pub fn wants(&self, kind: TweenEventKind) -> bool {
        !self.any.is_empty() || self.by_kind.get(&kind).is_some_and(|l| !l.is_empty())
    }

    /// Deliver an event to its kind listeners, then the catch-all listeners
    pub fn dispatch(&mut self, event: &TweenEvent) {
        if let Some(listeners) = self.by_kind.get_mut(&event.kind()) {
            for listener in listeners.iter_mut() {
                listener(event);
            }
        }
        for listener in self.any.iter_mut() {
            listener(event);
        }
    }
}

impl fmt::Debug for TweenListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenListeners")
            .field("kinds", &self.by_kind.len())
            .field("any", &self.any.len())
            .finish()
    }
}
