//! Aggregate tweens
//!
//! A [`Tween`] owns a fixed set of [`TimingUnit`]s over a shared target list.
//! Its duration, start delay and infinity are not pushed up by the units;
//! they are folded from the units after every reset, in index order.

use crate::error::{Result, TweenError};
use crate::events::{EventOutbox, TweenEvent, TweenEventKind, TweenListeners};
use crate::resolver::TweenInfo;
use crate::target::{same_target, SharedTarget};
use crate::unit::{Repeat, TimingUnit, UnitContext};

/// Step used when seeking, roughly one frame at 60fps
pub const SEEK_STEP_MS: f32 = 16.6;

/// Furthest a seek replays into a tween with no repeating period
pub const MAX_SEEK_MS: f32 = 3_600_000.0;

/// Lifecycle of a tween as seen by its scheduler
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Built but not yet played
    #[default]
    Pending,
    /// Advancing its units
    Active,
    /// Waiting between loops
    LoopDelay,
    /// All units done, waiting before reporting completion
    CompleteDelay,
    /// Frozen; remembers the state to resume into
    Paused,
    /// Finished; the scheduler will drop it
    Complete,
    /// Stopped or destroyed; the scheduler will drop it
    Removed,
}

/// A set of timing units sharing one play/pause lifecycle
pub struct Tween {
    targets: Vec<SharedTarget>,
    units: Vec<TimingUnit>,
    state: PlaybackState,
    paused_from: PlaybackState,

    duration: f32,
    start_delay: f32,
    is_infinite: bool,

    elapsed: f32,
    /// Time fed to the units since the current loop began
    loop_elapsed: f32,
    /// Loop-boundary overshoot owed to the units on the next advance
    carry: f32,
    countdown: f32,
    time_scale: f32,
    loop_count: Repeat,
    loop_remaining: Repeat,
    loop_delay: f32,
    complete_delay: f32,
    has_started: bool,
    seeking: bool,

    listeners: TweenListeners,
    outbox: EventOutbox,
}

impl Tween {
    /// Create a pending tween. The unit set is fixed from here on.
    pub fn new(targets: Vec<SharedTarget>, units: Vec<TimingUnit>) -> Self {
        Self {
            targets,
            units,
            state: PlaybackState::Pending,
            paused_from: PlaybackState::Pending,
            duration: 0.0,
            start_delay: 0.0,
            is_infinite: false,
            elapsed: 0.0,
            loop_elapsed: 0.0,
            carry: 0.0,
            countdown: 0.0,
            time_scale: 1.0,
            loop_count: Repeat::NONE,
            loop_remaining: Repeat::NONE,
            loop_delay: 0.0,
            complete_delay: 0.0,
            has_started: false,
            seeking: false,
            listeners: TweenListeners::new(),
            outbox: EventOutbox::new(),
        }
    }

    /// Builder: replay every unit this many extra times
    pub fn with_loop(mut self, loops: Repeat) -> Self {
        self.loop_count = loops;
        self.loop_remaining = loops;
        self
    }

    /// Builder: pause between loops
    pub fn with_loop_delay(mut self, ms: f32) -> Self {
        self.loop_delay = ms.max(0.0);
        self
    }

    /// Builder: pause between the last unit finishing and `Complete`
    pub fn with_complete_delay(mut self, ms: f32) -> Self {
        self.complete_delay = ms.max(0.0);
        self
    }

    /// Builder: time scale
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.set_time_scale(scale);
        self
    }

    /// Builder: listener registry
    pub fn with_listeners(mut self, listeners: TweenListeners) -> Self {
        self.listeners = listeners;
        self
    }

    /// Register a listener for one kind of event
    pub fn on<F>(&mut self, kind: TweenEventKind, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on(kind, listener);
    }

    /// Register a listener for every event
    pub fn on_any<F>(&mut self, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on_any(listener);
    }

    pub fn listeners_mut(&mut self) -> &mut TweenListeners {
        &mut self.listeners
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Longest unit total duration
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Shortest unit delay
    pub fn start_delay(&self) -> f32 {
        self.start_delay
    }

    pub fn is_infinite(&self) -> bool {
        self.is_infinite
    }

    /// Duration including loops and the complete delay
    pub fn total_duration(&self) -> f32 {
        if self.is_infinite {
            return f32::INFINITY;
        }
        let loops = match self.loop_count {
            Repeat::Count(n) => n as f32,
            Repeat::Unbounded => return f32::INFINITY,
        };
        self.duration * (loops + 1.0) + self.loop_delay * loops + self.complete_delay
    }

    /// Time spent playing, in scaled milliseconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Fraction of [`total_duration`](Self::total_duration) played; always 0
    /// for infinite tweens
    pub fn progress(&self) -> f32 {
        if self.state == PlaybackState::Complete {
            return 1.0;
        }
        let total = self.total_duration();
        if !total.is_finite() || total <= 0.0 {
            return 0.0;
        }
        (self.elapsed / total).clamp(0.0, 1.0)
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    pub fn units(&self) -> &[TimingUnit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Option<&TimingUnit> {
        self.units.get(index)
    }

    pub fn targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    pub fn has_target(&self, target: &SharedTarget) -> bool {
        self.targets.iter().any(|t| same_target(t, target))
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// Advancing (including loop and complete delays)
    pub fn is_playing(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Active | PlaybackState::LoopDelay | PlaybackState::CompleteDelay
        )
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }

    /// Not yet complete or removed
    pub fn is_alive(&self) -> bool {
        !matches!(self.state, PlaybackState::Complete | PlaybackState::Removed)
    }

    // =========================================================================
    // Playback control
    // =========================================================================

    /// Start a pending tween, resume a paused one, or restart a finished one
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Pending => self.begin(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Complete => self.restart(),
            PlaybackState::Active | PlaybackState::LoopDelay | PlaybackState::CompleteDelay => {
                Ok(())
            }
            PlaybackState::Removed => {
                tracing::warn!("play() on a removed tween ignored");
                Ok(())
            }
        }
    }

    /// Freeze every unit in place
    pub fn pause(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Paused | PlaybackState::Complete | PlaybackState::Removed
        ) {
            return;
        }
        self.paused_from = self.state;
        self.state = PlaybackState::Paused;
        self.emit(TweenEvent::Pause);
    }

    /// Continue from where `pause` froze the tween. A tween paused before it
    /// was ever played starts playing.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        self.emit(TweenEvent::Resume);
        if self.paused_from == PlaybackState::Pending {
            self.state = PlaybackState::Pending;
            return self.begin();
        }
        self.state = self.paused_from;
        Ok(())
    }

    /// Stop for good; the scheduler drops the tween at the next tick boundary
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Removed {
            return;
        }
        self.state = PlaybackState::Removed;
        self.emit(TweenEvent::Stop);
    }

    /// Reset every unit and play from the top
    pub fn restart(&mut self) -> Result<()> {
        if self.state == PlaybackState::Removed {
            tracing::warn!("restart() on a removed tween ignored");
            return Ok(());
        }
        self.rewind()?;
        self.state = PlaybackState::Active;
        Ok(())
    }

    /// Jump to `time_ms` by replaying from the start in fixed steps without
    /// dispatching events. Paused tweens stay paused.
    ///
    /// Tweens that loop forever are replayed to the same point within one
    /// loop; other infinite tweens replay at most [`MAX_SEEK_MS`].
    pub fn seek(&mut self, time_ms: f32) -> Result<()> {
        if !time_ms.is_finite() {
            return Err(TweenError::InvalidSeek(time_ms));
        }
        if self.state == PlaybackState::Removed {
            tracing::warn!("seek() on a removed tween ignored");
            return Ok(());
        }

        let stay_paused = self.state == PlaybackState::Paused;

        self.seeking = true;
        let result = self.seek_to(time_ms);
        self.seeking = false;
        self.outbox.clear();
        result?;

        if stay_paused && self.is_playing() {
            self.paused_from = self.state;
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    /// Advance by `delta_ms` (scaled by the time scale). Returns whether the
    /// tween is still alive.
    pub fn update(&mut self, delta_ms: f32) -> Result<bool> {
        if self.is_playing() {
            self.advance(delta_ms * self.time_scale)?;
        }
        Ok(self.is_alive())
    }

    /// Release units, listeners and targets
    pub fn destroy(&mut self) {
        for unit in self.units.iter_mut() {
            unit.destroy();
        }
        self.listeners.clear();
        self.targets.clear();
        self.outbox.clear();
        self.state = PlaybackState::Removed;
    }

    /// Scheduler hook: pending tweens start playing, paused ones stay put
    pub(crate) fn activate(&mut self) -> Result<()> {
        if self.state == PlaybackState::Pending {
            self.begin()?;
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin(&mut self) -> Result<()> {
        self.rewind()?;
        self.state = PlaybackState::Active;
        self.emit(TweenEvent::Active);
        tracing::debug!(
            "tween started: {} units, duration={}, start_delay={}",
            self.units.len(),
            self.duration,
            self.start_delay
        );
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.elapsed = 0.0;
        self.loop_elapsed = 0.0;
        self.carry = 0.0;
        self.countdown = 0.0;
        self.has_started = false;
        self.loop_remaining = self.loop_count;
        self.reset_units()
    }

    fn seek_to(&mut self, time_ms: f32) -> Result<()> {
        self.rewind()?;
        self.state = PlaybackState::Active;

        let total = self.total_duration();
        let to_end = total.is_finite() && time_ms >= total;
        let span = if to_end { total } else { self.seek_span(time_ms) };

        let steps = (span / SEEK_STEP_MS).floor().max(0.0) as u64;
        for _ in 0..steps {
            if !self.is_playing() {
                break;
            }
            self.advance(SEEK_STEP_MS)?;
        }
        let rest = (f64::from(span) - steps as f64 * f64::from(SEEK_STEP_MS)) as f32;
        if rest > 0.0 && self.is_playing() {
            self.advance(rest)?;
        }

        // absorb rounding left over from summing steps
        if to_end && self.is_playing() {
            self.advance(SEEK_STEP_MS)?;
        }
        if span < time_ms && !to_end {
            self.elapsed = time_ms;
        }
        Ok(())
    }

    /// Replay span that lands on the same playhead as `time_ms`
    fn seek_span(&self, time_ms: f32) -> f32 {
        let time_ms = time_ms.max(0.0);
        if !self.is_infinite {
            return time_ms;
        }

        let period = self.duration + self.loop_delay;
        let units_finite = !self.units.iter().any(|u| u.is_infinite());
        if self.loop_count.is_unbounded() && units_finite && period > 0.0 {
            return time_ms % period;
        }

        if time_ms > MAX_SEEK_MS {
            tracing::warn!(
                "seek to {}ms on an infinite tween replays only {}ms",
                time_ms,
                MAX_SEEK_MS
            );
        }
        time_ms.min(MAX_SEEK_MS)
    }

    fn reset_units(&mut self) -> Result<()> {
        let info = self.info();
        for (index, unit) in self.units.iter_mut().enumerate() {
            let cx = UnitContext::new(&self.targets, info, index, &mut self.outbox);
            unit.reset(&cx)?;
        }
        self.outbox.clear();
        self.refresh_summary();
        Ok(())
    }

    /// Fold unit summaries left to right; the first unit wins duration ties
    fn refresh_summary(&mut self) {
        let (duration, start_delay) = self.units.iter().fold(
            (0.0_f32, f32::INFINITY),
            |(duration, delay), unit| {
                let duration = if unit.total_duration() > duration {
                    unit.total_duration()
                } else {
                    duration
                };
                (duration, delay.min(unit.resolved_delay()))
            },
        );

        self.duration = duration;
        self.start_delay = if start_delay.is_finite() { start_delay } else { 0.0 };
        self.is_infinite =
            self.loop_count.is_unbounded() || self.units.iter().any(|u| u.is_infinite());
    }

    fn info(&self) -> TweenInfo {
        TweenInfo {
            duration: self.duration,
            start_delay: self.start_delay,
            elapsed: self.elapsed,
        }
    }

    fn advance(&mut self, delta: f32) -> Result<()> {
        self.elapsed += delta;

        match self.state {
            PlaybackState::LoopDelay => {
                self.countdown -= delta;
                if self.countdown <= 0.0 {
                    self.begin_loop(-self.countdown)?;
                }
                return Ok(());
            }
            PlaybackState::CompleteDelay => {
                self.countdown -= delta;
                if self.countdown <= 0.0 {
                    self.finish();
                }
                return Ok(());
            }
            PlaybackState::Active => {}
            _ => return Ok(()),
        }

        let delta = delta + std::mem::take(&mut self.carry);
        self.loop_elapsed += delta;

        if !self.has_started && self.elapsed >= self.start_delay {
            self.has_started = true;
            self.emit(TweenEvent::Start);
        }

        let info = self.info();
        let record_updates = !self.seeking && self.listeners_want_updates();
        let mut all_complete = true;

        for index in 0..self.units.len() {
            {
                let unit = &mut self.units[index];
                if !unit.is_complete() {
                    let mut cx = UnitContext {
                        targets: &self.targets,
                        tween: info,
                        unit_index: index,
                        events: &mut self.outbox,
                        record_updates,
                    };
                    unit.update(delta, &mut cx)?;
                }
                all_complete &= unit.is_complete();
            }
            self.flush_events();
        }

        if all_complete {
            let overshoot = (self.loop_elapsed - self.duration).max(0.0);
            self.on_units_complete(overshoot)?;
        }
        Ok(())
    }

    /// `overshoot` is the time played past the end of this loop; it is
    /// taken off the following delay or handed to the next loop
    fn on_units_complete(&mut self, overshoot: f32) -> Result<()> {
        if self.loop_remaining.is_pending() {
            self.loop_remaining.decrement();
            self.countdown = self.loop_delay - overshoot;
            if self.countdown > 0.0 {
                self.state = PlaybackState::LoopDelay;
                Ok(())
            } else {
                self.begin_loop(-self.countdown)
            }
        } else {
            self.countdown = self.complete_delay - overshoot;
            if self.countdown > 0.0 {
                self.state = PlaybackState::CompleteDelay;
            } else {
                self.finish();
            }
            Ok(())
        }
    }

    /// Reset the units for another loop; `carry` is played on the next advance
    fn begin_loop(&mut self, carry: f32) -> Result<()> {
        self.reset_units()?;
        self.loop_elapsed = 0.0;
        self.carry = carry;
        self.state = PlaybackState::Active;
        self.emit(TweenEvent::Loop);
        Ok(())
    }

    fn finish(&mut self) {
        self.state = PlaybackState::Complete;
        self.emit(TweenEvent::Complete);
        tracing::debug!("tween complete after {}ms", self.elapsed);
    }

    fn listeners_want_updates(&self) -> bool {
        self.listeners.wants(TweenEventKind::Update)
    }

    fn flush_events(&mut self) {
        for event in self.outbox.drain(..) {
            if !self.seeking {
                self.listeners.dispatch(&event);
            }
        }
    }

    fn emit(&mut self, event: TweenEvent) {
        if !self.seeking {
            self.listeners.dispatch(&event);
        }
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("state", &self.state)
            .field("units", &self.units.len())
            .field("targets", &self.targets.len())
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
