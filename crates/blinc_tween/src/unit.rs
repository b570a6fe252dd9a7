//! Per-property timing units
//!
//! A [`TimingUnit`] drives one `(target, property)` pair through
//! delay → play → hold → yoyo → repeat → complete. It never owns its target:
//! the owning tween passes its target list in through a [`UnitContext`] on
//! every call, and folds the unit's duration summary back up after a reset.
//!
//! Time that overshoots a phase boundary is carried into the next phase
//! rather than dropped, so motion stays continuous across frames.

use crate::easing::Ease;
use crate::error::{Result, TweenError};
use crate::events::{EventOutbox, TweenEvent};
use crate::resolver::{ResolveContext, Resolver, TweenInfo};
use crate::target::{SharedTarget, Target};

/// Smallest pass duration in milliseconds. Non-positive durations are
/// clamped to this so progress is always computable.
pub const MIN_DURATION: f32 = 0.01;

/// How many extra passes to play
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Additional passes after the first (`Count(0)` plays once)
    Count(u32),
    /// Never stop repeating
    Unbounded,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::NONE
    }
}

impl Repeat {
    pub const NONE: Repeat = Repeat::Count(0);

    /// Signed config convention: negative means unbounded
    pub fn from_count(count: i32) -> Self {
        if count < 0 {
            Repeat::Unbounded
        } else {
            Repeat::Count(count as u32)
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Repeat::Unbounded)
    }

    /// Whether at least one more pass is owed
    pub fn is_pending(&self) -> bool {
        match self {
            Repeat::Count(n) => *n > 0,
            Repeat::Unbounded => true,
        }
    }

    /// Consume one pass. Unbounded never runs out.
    pub fn decrement(&mut self) {
        if let Repeat::Count(n) = self {
            *n = n.saturating_sub(1);
        }
    }

    /// `time_per_pass * count`, infinite when unbounded
    pub fn span(&self, time_per_pass: f32) -> f32 {
        match self {
            Repeat::Count(n) => time_per_pass * *n as f32,
            Repeat::Unbounded => f32::INFINITY,
        }
    }
}

/// Lifecycle state of a unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitState {
    #[default]
    Created,
    Delay,
    PendingRender,
    PlayingForward,
    PlayingBackward,
    HoldDelay,
    RepeatDelay,
    Complete,
}

/// How values are produced between start and end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueMode {
    /// Interpolate through the easing curve; start/end re-resolved at
    /// yoyo/repeat boundaries
    #[default]
    Continuous,
    /// Hold the start value for the pass, then jump to the end (sprite frame
    /// swaps). Start/end are only resolved on the first render.
    DiscreteFrameSwap,
}

/// What a single update did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Still running
    Continuing,
    /// Reached `Complete` during this update
    JustCompleted,
    /// Not running (never reset, stuck on bad config, or already complete)
    Inactive,
}

/// Fixed timing of a unit
#[derive(Clone, Debug, PartialEq)]
pub struct UnitTiming {
    pub duration: f32,
    pub hold: f32,
    pub yoyo: bool,
    pub repeat: Repeat,
    pub repeat_delay: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for UnitTiming {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            hold: 0.0,
            yoyo: false,
            repeat: Repeat::NONE,
            repeat_delay: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// Everything a unit needs from its owner for one call
pub struct UnitContext<'a> {
    pub targets: &'a [SharedTarget],
    pub tween: TweenInfo,
    /// Index of the unit within its tween, stamped on events
    pub unit_index: usize,
    pub events: &'a mut EventOutbox,
    /// Record `Update` events for every interpolated write
    pub record_updates: bool,
}

impl<'a> UnitContext<'a> {
    pub fn new(
        targets: &'a [SharedTarget],
        tween: TweenInfo,
        unit_index: usize,
        events: &'a mut EventOutbox,
    ) -> Self {
        Self {
            targets,
            tween,
            unit_index,
            events,
            record_updates: false,
        }
    }

    fn target(&self, index: usize) -> Result<SharedTarget> {
        self.targets
            .get(index)
            .cloned()
            .ok_or(TweenError::TargetOutOfRange {
                index,
                len: self.targets.len(),
            })
    }
}

/// State machine animating one property of one target
#[derive(Clone, Debug)]
pub struct TimingUnit {
    target_index: usize,
    key: String,
    duration: f32,
    hold: f32,
    yoyo: bool,
    repeat: Repeat,
    repeat_delay: f32,
    flip_x: bool,
    flip_y: bool,
    ease: Ease,
    mode: ValueMode,
    delay_resolver: Resolver,
    start_resolver: Resolver,
    end_resolver: Resolver,

    delay: f32,
    total_duration: f32,
    repeat_remaining: Repeat,
    progress: f32,
    elapsed: f32,
    state: UnitState,
    start: f32,
    end: f32,
    current: f32,
    detached: bool,
}

impl TimingUnit {
    /// Create a unit for `key` on target `target_index`. Until `to` or
    /// `values` is called both ends resolve to the target's current value.
    pub fn new(target_index: usize, key: impl Into<String>, timing: UnitTiming) -> Self {
        let duration = if timing.duration.is_finite() && timing.duration <= 0.0 {
            MIN_DURATION
        } else {
            timing.duration
        };

        Self {
            target_index,
            key: key.into(),
            duration,
            hold: timing.hold.max(0.0),
            yoyo: timing.yoyo,
            repeat: timing.repeat,
            repeat_delay: timing.repeat_delay.max(0.0),
            flip_x: timing.flip_x,
            flip_y: timing.flip_y,
            ease: Ease::default(),
            mode: ValueMode::Continuous,
            delay_resolver: Resolver::Constant(0.0),
            start_resolver: Resolver::Current,
            end_resolver: Resolver::Current,
            delay: 0.0,
            total_duration: 0.0,
            repeat_remaining: timing.repeat,
            progress: 0.0,
            elapsed: 0.0,
            state: UnitState::Created,
            start: 0.0,
            end: 0.0,
            current: 0.0,
            detached: false,
        }
    }

    /// Builder: start and end resolvers
    pub fn values(mut self, start: Resolver, end: Resolver) -> Self {
        self.start_resolver = start;
        self.end_resolver = end;
        self
    }

    /// Builder: end resolver, start taken from the target
    pub fn to(mut self, end: impl Into<Resolver>) -> Self {
        self.end_resolver = end.into();
        self
    }

    /// Builder: delay resolver
    pub fn delay(mut self, delay: impl Into<Resolver>) -> Self {
        self.delay_resolver = delay.into();
        self
    }

    /// Builder: easing
    pub fn ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = ease.into();
        self
    }

    /// Builder: value mode
    pub fn mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Effective pass duration (always > 0 for finite configs)
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Full span including delay, hold, yoyo and repeats
    pub fn total_duration(&self) -> f32 {
        self.total_duration
    }

    /// Delay resolved by the last reset
    pub fn resolved_delay(&self) -> f32 {
        self.delay
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn repeat_remaining(&self) -> Repeat {
        self.repeat_remaining
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn start_value(&self) -> f32 {
        self.start
    }

    pub fn end_value(&self) -> f32 {
        self.end
    }

    pub fn current_value(&self) -> f32 {
        self.current
    }

    pub fn value_mode(&self) -> ValueMode {
        self.mode
    }

    pub fn is_infinite(&self) -> bool {
        self.repeat.is_unbounded()
    }

    /// Waiting rather than interpolating
    pub fn is_countdown(&self) -> bool {
        matches!(
            self.state,
            UnitState::Delay | UnitState::HoldDelay | UnitState::RepeatDelay
        )
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.state,
            UnitState::PlayingForward | UnitState::PlayingBackward
        )
    }

    pub fn is_complete(&self) -> bool {
        self.state == UnitState::Complete
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Recompute delay, repeat counter and total duration, and rewind to the
    /// delay (or pending-render) state.
    ///
    /// Configuration errors (non-finite duration or delay, missing property)
    /// leave the unit in `Created`; resolver errors are returned.
    pub fn reset(&mut self, cx: &UnitContext<'_>) -> Result<()> {
        if self.detached {
            tracing::warn!("reset() on destroyed unit `{}` ignored", self.key);
            return Ok(());
        }

        self.progress = 0.0;
        self.elapsed = 0.0;
        self.delay = 0.0;
        self.total_duration = 0.0;
        self.state = UnitState::Created;

        if !self.duration.is_finite() {
            tracing::warn!(
                "unit `{}` has non-finite duration {}, it will not play",
                self.key,
                self.duration
            );
            return Ok(());
        }

        let target = cx.target(self.target_index)?;
        let target = target.borrow();

        if target.get(&self.key).is_none() {
            tracing::warn!(
                "target {} has no numeric property `{}`, unit will not play",
                self.target_index,
                self.key
            );
            return Ok(());
        }

        let delay = self.resolve(&self.delay_resolver, &*target, 0.0, cx)?;
        if !delay.is_finite() {
            tracing::warn!("unit `{}` resolved a non-finite delay", self.key);
            return Ok(());
        }

        self.delay = delay.max(0.0);
        self.repeat_remaining = self.repeat;
        self.state = UnitState::PendingRender;

        let pass = self.duration + self.hold + if self.yoyo { self.duration } else { 0.0 };
        let cycle = pass + self.repeat_delay;
        self.total_duration = self.delay + pass + self.repeat.span(cycle);

        if self.delay > 0.0 {
            self.elapsed = self.delay;
            self.state = UnitState::Delay;
        }

        tracing::trace!(
            "unit `{}` reset: delay={} total={} state={:?}",
            self.key,
            self.delay,
            self.total_duration,
            self.state
        );

        Ok(())
    }

    /// Advance by `delta` ms, writing the target as a side effect
    pub fn update(&mut self, delta: f32, cx: &mut UnitContext<'_>) -> Result<UnitOutcome> {
        if matches!(self.state, UnitState::Created | UnitState::Complete) {
            return Ok(UnitOutcome::Inactive);
        }

        let target = cx.target(self.target_index)?;
        let mut target = target.borrow_mut();
        let mut delta = delta;

        if self.is_countdown() {
            self.elapsed -= delta;
            if self.elapsed > 0.0 {
                return Ok(UnitOutcome::Continuing);
            }

            let carry = -self.elapsed;
            self.elapsed = 0.0;
            delta = carry;

            match self.state {
                UnitState::Delay => self.state = UnitState::PendingRender,
                UnitState::RepeatDelay => {
                    self.state = UnitState::PlayingForward;
                    self.emit(cx, |unit, key| TweenEvent::Repeat { unit, key });
                }
                UnitState::HoldDelay => {
                    self.state_from_end(carry, &mut *target, cx)?;
                    delta = 0.0;
                }
                _ => unreachable!("is_countdown() covers only delay states"),
            }
        }

        if self.state == UnitState::PendingRender {
            self.render_start(&mut *target, cx)?;
        }

        if self.is_playing() {
            self.advance(delta, &mut *target, cx)?;
        }

        if self.state == UnitState::Complete {
            self.emit(cx, |unit, key| TweenEvent::UnitComplete { unit, key });
            Ok(UnitOutcome::JustCompleted)
        } else {
            Ok(UnitOutcome::Continuing)
        }
    }

    /// Terminal: mark complete and stop addressing the owner's targets
    pub fn destroy(&mut self) {
        self.state = UnitState::Complete;
        self.detached = true;
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn render_start(&mut self, target: &mut dyn Target, cx: &UnitContext<'_>) -> Result<()> {
        let current = target
            .get(&self.key)
            .ok_or_else(|| TweenError::MissingProperty {
                key: self.key.clone(),
                index: self.target_index,
            })?;

        self.start = self.resolve(&self.start_resolver, &*target, current, cx)?;
        self.end = self.resolve(&self.end_resolver, &*target, self.start, cx)?;
        self.current = self.start;
        target.set(&self.key, self.start);
        self.state = UnitState::PlayingForward;
        Ok(())
    }

    fn advance(&mut self, delta: f32, target: &mut dyn Target, cx: &mut UnitContext<'_>) -> Result<()> {
        let forward = self.state == UnitState::PlayingForward;
        let mut elapsed = self.elapsed + delta;
        let mut diff = 0.0;
        let complete = elapsed >= self.duration;

        if complete {
            diff = elapsed - self.duration;
            elapsed = self.duration;
        } else if elapsed < 0.0 {
            elapsed = 0.0;
        }

        self.elapsed = elapsed;
        self.progress = (elapsed / self.duration).clamp(0.0, 1.0);

        if complete {
            if forward {
                self.write(target, self.end);
                if self.hold > 0.0 {
                    self.elapsed = self.hold - diff;
                    self.state = UnitState::HoldDelay;
                    self.emit(cx, |unit, key| TweenEvent::Hold { unit, key });
                } else {
                    self.state_from_end(diff, target, cx)?;
                }
            } else {
                self.write(target, self.start);
                self.state_from_start(diff, target, cx)?;
            }
            return Ok(());
        }

        let value = match self.mode {
            ValueMode::Continuous => {
                let v = if forward {
                    self.ease.apply(self.progress)
                } else {
                    self.ease.apply(1.0 - self.progress)
                };
                self.start + (self.end - self.start) * v
            }
            ValueMode::DiscreteFrameSwap => {
                if forward {
                    self.start
                } else {
                    self.end
                }
            }
        };

        self.write(target, value);
        if cx.record_updates {
            cx.events.push(TweenEvent::Update {
                unit: cx.unit_index,
                key: self.key.clone(),
                value,
            });
        }
        Ok(())
    }

    fn state_from_end(&mut self, diff: f32, target: &mut dyn Target, cx: &mut UnitContext<'_>) -> Result<()> {
        if self.yoyo {
            self.on_repeat(diff, true, true, target, cx)
        } else if self.repeat_remaining.is_pending() {
            self.on_repeat(diff, true, false, target, cx)
        } else {
            self.state = UnitState::Complete;
            Ok(())
        }
    }

    fn state_from_start(&mut self, diff: f32, target: &mut dyn Target, cx: &mut UnitContext<'_>) -> Result<()> {
        if self.repeat_remaining.is_pending() {
            self.on_repeat(diff, false, false, target, cx)
        } else {
            self.state = UnitState::Complete;
            Ok(())
        }
    }

    fn on_repeat(
        &mut self,
        diff: f32,
        set_start: bool,
        is_yoyo: bool,
        target: &mut dyn Target,
        cx: &mut UnitContext<'_>,
    ) -> Result<()> {
        let continuous = self.mode == ValueMode::Continuous;

        self.elapsed = diff;
        self.progress = (diff / self.duration).min(1.0);

        if self.flip_x {
            target.toggle_flip_x();
        }
        if self.flip_y {
            target.toggle_flip_y();
        }

        if continuous && (set_start || is_yoyo) {
            self.start = self.resolve(&self.start_resolver, &*target, self.start, cx)?;
        }

        if is_yoyo {
            self.state = UnitState::PlayingBackward;
            self.emit(cx, |unit, key| TweenEvent::Yoyo { unit, key });
            return Ok(());
        }

        self.repeat_remaining.decrement();

        if continuous {
            self.end = self.resolve(&self.end_resolver, &*target, self.start, cx)?;
        }

        if self.repeat_delay > 0.0 {
            self.elapsed = self.repeat_delay - diff;
            if continuous {
                self.write(target, self.start);
            }
            self.state = UnitState::RepeatDelay;
        } else {
            self.state = UnitState::PlayingForward;
            self.emit(cx, |unit, key| TweenEvent::Repeat { unit, key });
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn resolve(
        &self,
        resolver: &Resolver,
        target: &dyn Target,
        value: f32,
        cx: &UnitContext<'_>,
    ) -> Result<f32> {
        let resolved = resolver.resolve(&ResolveContext {
            target,
            key: &self.key,
            value,
            index: self.target_index,
            total: cx.targets.len(),
            tween: &cx.tween,
        })?;

        if resolved.is_nan() {
            return Err(TweenError::resolver(&self.key, "resolved to NaN"));
        }
        Ok(resolved)
    }

    fn write(&mut self, target: &mut dyn Target, value: f32) {
        self.current = value;
        target.set(&self.key, value);
    }

    fn emit<F>(&self, cx: &mut UnitContext<'_>, event: F)
    where
        F: FnOnce(usize, String) -> TweenEvent,
    {
        cx.events.push(event(cx.unit_index, self.key.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::events::TweenEventKind;
    use crate::target::{shared, PropertyTarget};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        target: Rc<RefCell<PropertyTarget>>,
        targets: Vec<SharedTarget>,
        events: Vec<TweenEvent>,
    }

    impl Harness {
        fn new(x: f32) -> Self {
            let target = shared(PropertyTarget::new().with("x", x));
            let targets: Vec<SharedTarget> = vec![target.clone()];
            Self {
                target,
                targets,
                events: Vec::new(),
            }
        }

        fn reset(&mut self, unit: &mut TimingUnit) {
            let mut outbox = EventOutbox::new();
            let cx = UnitContext::new(&self.targets, TweenInfo::default(), 0, &mut outbox);
            unit.reset(&cx).unwrap();
        }

        fn update(&mut self, unit: &mut TimingUnit, delta: f32) -> UnitOutcome {
            let mut outbox = EventOutbox::new();
            let mut cx = UnitContext::new(&self.targets, TweenInfo::default(), 0, &mut outbox);
            let outcome = unit.update(delta, &mut cx).unwrap();
            self.events.extend(outbox);
            outcome
        }

        fn x(&self) -> f32 {
            self.target.borrow().value("x").unwrap()
        }

        fn count(&self, kind: TweenEventKind) -> usize {
            self.events.iter().filter(|e| e.kind() == kind).count()
        }
    }

    fn timing(duration: f32) -> UnitTiming {
        UnitTiming {
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_duration_clamped_to_epsilon() {
        for d in [0.0, -5.0, -0.0001] {
            let unit = TimingUnit::new(0, "x", timing(d));
            assert_eq!(unit.duration(), MIN_DURATION);
        }
        assert_eq!(TimingUnit::new(0, "x", timing(250.0)).duration(), 250.0);
    }

    #[test]
    fn test_zero_duration_completes_without_nan() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(0.0)).to(10.0);
        h.reset(&mut unit);

        assert_eq!(h.update(&mut unit, 16.0), UnitOutcome::JustCompleted);
        assert_eq!(h.x(), 10.0);
        assert!(unit.progress().is_finite());
    }

    #[test]
    fn test_linear_quarter_steps() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(1000.0)).to(100.0);
        h.reset(&mut unit);
        assert_eq!(unit.state(), UnitState::PendingRender);

        let mut values = Vec::new();
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(h.update(&mut unit, 250.0));
            values.push(h.x());
        }

        for (got, want) in values.iter().zip([25.0, 50.0, 75.0, 100.0]) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
        assert_eq!(outcomes[2], UnitOutcome::Continuing);
        assert_eq!(outcomes[3], UnitOutcome::JustCompleted);
        assert!(unit.is_complete());
    }

    #[test]
    fn test_complete_unit_never_writes_again() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(100.0)).to(50.0);
        h.reset(&mut unit);
        h.update(&mut unit, 100.0);
        assert!(unit.is_complete());

        h.target.borrow_mut().set("x", -1.0);
        assert_eq!(h.update(&mut unit, 100.0), UnitOutcome::Inactive);
        assert_eq!(h.x(), -1.0);
    }

    #[test]
    fn test_repeat_plays_n_plus_one_forward_passes() {
        for n in 0..4u32 {
            let mut h = Harness::new(0.0);
            let mut unit = TimingUnit::new(
                0,
                "x",
                UnitTiming {
                    duration: 100.0,
                    repeat: Repeat::Count(n),
                    ..Default::default()
                },
            )
            .to(1.0);
            h.reset(&mut unit);

            let mut ticks = 0;
            while !unit.is_complete() {
                h.update(&mut unit, 100.0);
                ticks += 1;
                assert!(ticks < 100);
            }

            // one forward entry from the first render, one per repeat
            assert_eq!(ticks as u32, n + 1);
            assert_eq!(h.count(TweenEventKind::Repeat) as u32 + 1, n + 1);
        }
    }

    #[test]
    fn test_unbounded_repeat_never_completes() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 50.0,
                repeat: Repeat::Unbounded,
                ..Default::default()
            },
        )
        .to(1.0);
        h.reset(&mut unit);

        assert!(unit.is_infinite());
        assert_eq!(unit.total_duration(), f32::INFINITY);

        for _ in 0..10_000 {
            assert_ne!(h.update(&mut unit, 37.0), UnitOutcome::JustCompleted);
        }
        assert!(!unit.is_complete());
        assert_eq!(unit.repeat_remaining(), Repeat::Unbounded);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut h = Harness::new(3.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 200.0,
                hold: 50.0,
                yoyo: true,
                repeat: Repeat::Count(2),
                repeat_delay: 25.0,
                ..Default::default()
            },
        )
        .delay(40.0)
        .to(10.0);

        h.reset(&mut unit);
        let first = (
            unit.total_duration(),
            unit.resolved_delay(),
            unit.state(),
            unit.elapsed(),
            unit.repeat_remaining(),
        );
        h.reset(&mut unit);
        let second = (
            unit.total_duration(),
            unit.resolved_delay(),
            unit.state(),
            unit.elapsed(),
            unit.repeat_remaining(),
        );

        assert_eq!(first, second);
        assert_eq!(first.2, UnitState::Delay);
        // 40 + (200 + 50 + 200) + (450 + 25) * 2
        assert_eq!(first.0, 40.0 + 450.0 + 475.0 * 2.0);
    }

    #[test]
    fn test_overshoot_carried_into_yoyo() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        h.update(&mut unit, 130.0);
        assert_eq!(unit.state(), UnitState::PlayingBackward);
        assert!((unit.elapsed() - 30.0).abs() < 1e-4);
        assert!((unit.progress() - 0.3).abs() < 1e-4);
        // boundary write is the exact end value
        assert_eq!(h.x(), 100.0);
    }

    #[test]
    fn test_overshoot_carried_into_repeat() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                repeat: Repeat::Count(1),
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        h.update(&mut unit, 140.0);
        assert_eq!(unit.state(), UnitState::PlayingForward);
        assert!((unit.elapsed() - 40.0).abs() < 1e-4);

        // the carried 40ms shows up in the next interpolated value
        h.update(&mut unit, 10.0);
        assert!((h.x() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_delay_overshoot_carries_into_play() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(100.0)).delay(50.0).to(100.0);
        h.reset(&mut unit);
        assert!(unit.is_countdown());

        h.update(&mut unit, 30.0);
        assert_eq!(unit.state(), UnitState::Delay);
        assert_eq!(h.x(), 0.0);

        h.update(&mut unit, 40.0);
        assert_eq!(unit.state(), UnitState::PlayingForward);
        assert!((unit.elapsed() - 20.0).abs() < 1e-4);
        assert!((h.x() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_yoyo_does_not_consume_repeat() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                repeat: Repeat::Count(1),
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        let mut states = Vec::new();
        for _ in 0..4 {
            h.update(&mut unit, 100.0);
            states.push(unit.state());
        }

        assert_eq!(
            states,
            vec![
                UnitState::PlayingBackward,
                UnitState::PlayingForward,
                UnitState::PlayingBackward,
                UnitState::Complete,
            ]
        );
        assert_eq!(h.count(TweenEventKind::Yoyo), 2);
        assert_eq!(h.count(TweenEventKind::Repeat), 1);
        assert_eq!(h.x(), 0.0);
    }

    #[test]
    fn test_yoyo_with_two_repeats_plays_three_round_trips() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                repeat: Repeat::Count(2),
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        let mut ticks = 0;
        while h.update(&mut unit, 100.0) != UnitOutcome::JustCompleted {
            ticks += 1;
            assert!(ticks < 20);
        }
        assert_eq!(ticks + 1, 6);
        assert_eq!(h.count(TweenEventKind::Yoyo), 3);
    }

    #[test]
    fn test_backward_pass_uses_mirrored_ease() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                ..Default::default()
            },
        )
        .to(100.0)
        .ease(Easing::EaseInQuad);
        h.reset(&mut unit);

        h.update(&mut unit, 100.0);
        h.update(&mut unit, 25.0);
        // ease(1 - 0.25) = 0.5625
        assert!((h.x() - 56.25).abs() < 1e-3);
    }

    #[test]
    fn test_flip_toggled_once_per_boundary() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                repeat: Repeat::Count(1),
                flip_x: true,
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        let mut flips = 0;
        let mut last = h.target.borrow().flip_x;
        for _ in 0..16 {
            h.update(&mut unit, 25.0);
            let now = h.target.borrow().flip_x;
            if now != last {
                flips += 1;
                last = now;
            }
        }

        // yoyo, repeat, yoyo
        assert_eq!(flips, 3);
        assert!(!h.target.borrow().flip_y);
    }

    #[test]
    fn test_hold_then_yoyo() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                hold: 50.0,
                yoyo: true,
                ..Default::default()
            },
        )
        .to(10.0);
        h.reset(&mut unit);

        h.update(&mut unit, 100.0);
        assert_eq!(unit.state(), UnitState::HoldDelay);
        assert_eq!(h.count(TweenEventKind::Hold), 1);

        h.update(&mut unit, 30.0);
        assert_eq!(unit.state(), UnitState::HoldDelay);
        assert_eq!(h.x(), 10.0);

        // 20ms finishes the hold, 10ms carries into the backward pass
        h.update(&mut unit, 30.0);
        assert_eq!(unit.state(), UnitState::PlayingBackward);
        assert!((unit.elapsed() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_repeat_delay_rests_at_start() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                repeat: Repeat::Count(1),
                repeat_delay: 60.0,
                ..Default::default()
            },
        )
        .to(100.0);
        h.reset(&mut unit);

        h.update(&mut unit, 110.0);
        assert_eq!(unit.state(), UnitState::RepeatDelay);
        assert_eq!(h.x(), 0.0);
        assert!((unit.elapsed() - 50.0).abs() < 1e-4);
        assert_eq!(h.count(TweenEventKind::Repeat), 0);

        h.update(&mut unit, 75.0);
        assert_eq!(unit.state(), UnitState::PlayingForward);
        assert_eq!(h.count(TweenEventKind::Repeat), 1);
        assert!((h.x() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_relative_end_resolved_from_start_each_repeat() {
        let mut h = Harness::new(10.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                repeat: Repeat::Count(2),
                ..Default::default()
            },
        )
        .to("+=5".parse::<Resolver>().unwrap());
        h.reset(&mut unit);

        h.update(&mut unit, 50.0);
        assert_eq!(unit.start_value(), 10.0);
        assert_eq!(unit.end_value(), 15.0);

        h.update(&mut unit, 50.0);
        h.update(&mut unit, 50.0);
        // start is re-resolved from its own previous value, not the target
        assert_eq!(unit.start_value(), 10.0);
        assert_eq!(unit.end_value(), 15.0);
    }

    #[test]
    fn test_frame_swap_skips_interpolation() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(
            0,
            "x",
            UnitTiming {
                duration: 100.0,
                yoyo: true,
                ..Default::default()
            },
        )
        .values(Resolver::Constant(3.0), Resolver::Constant(7.0))
        .mode(ValueMode::DiscreteFrameSwap);
        h.reset(&mut unit);

        h.update(&mut unit, 50.0);
        assert_eq!(h.x(), 3.0);
        h.update(&mut unit, 50.0);
        assert_eq!(h.x(), 7.0);
        h.update(&mut unit, 50.0);
        assert_eq!(h.x(), 7.0);
        h.update(&mut unit, 50.0);
        assert_eq!(h.x(), 3.0);
        assert!(unit.is_complete());
    }

    #[test]
    fn test_missing_property_leaves_unit_created() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "alpha", timing(100.0)).to(1.0);
        h.reset(&mut unit);

        assert_eq!(unit.state(), UnitState::Created);
        assert_eq!(h.update(&mut unit, 100.0), UnitOutcome::Inactive);
    }

    #[test]
    fn test_nan_duration_leaves_unit_created() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(f32::NAN)).to(1.0);
        h.reset(&mut unit);
        assert_eq!(unit.state(), UnitState::Created);
    }

    #[test]
    fn test_resolver_error_propagates() {
        let targets: Vec<SharedTarget> = vec![shared(PropertyTarget::new().with("x", 0.0))];
        let mut unit = TimingUnit::new(0, "x", timing(100.0)).to(Resolver::dynamic(|cx| {
            Err(TweenError::resolver(cx.key, "boom"))
        }));

        let mut outbox = EventOutbox::new();
        let mut cx = UnitContext::new(&targets, TweenInfo::default(), 0, &mut outbox);
        unit.reset(&cx).unwrap();
        let err = unit.update(16.0, &mut cx).unwrap_err();
        assert_eq!(err, TweenError::resolver("x", "boom"));
    }

    #[test]
    fn test_target_out_of_range() {
        let targets: Vec<SharedTarget> = Vec::new();
        let mut unit = TimingUnit::new(2, "x", timing(100.0));
        let mut outbox = EventOutbox::new();
        let cx = UnitContext::new(&targets, TweenInfo::default(), 0, &mut outbox);
        assert_eq!(
            unit.reset(&cx),
            Err(TweenError::TargetOutOfRange { index: 2, len: 0 })
        );
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut h = Harness::new(0.0);
        let mut unit = TimingUnit::new(0, "x", timing(100.0)).to(1.0);
        h.reset(&mut unit);
        unit.destroy();

        assert!(unit.is_complete());
        assert!(unit.is_detached());
        h.reset(&mut unit);
        assert!(unit.is_complete());
        assert_eq!(h.update(&mut unit, 50.0), UnitOutcome::Inactive);
    }
}
