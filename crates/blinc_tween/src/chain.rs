//! Sequential tween chains
//!
//! A [`TweenChain`] plays its tweens one after another. When the current
//! tween completes the next one is (re)started on the same tick.

use crate::error::Result;
use crate::events::{TweenEvent, TweenEventKind, TweenListeners};
use crate::target::SharedTarget;
use crate::tween::{PlaybackState, Tween};
use crate::unit::Repeat;

/// Ordered list of tweens played back to back
pub struct TweenChain {
    tweens: Vec<Tween>,
    current: usize,
    state: PlaybackState,
    paused_from: PlaybackState,
    loop_count: Repeat,
    loop_remaining: Repeat,
    listeners: TweenListeners,
}

impl TweenChain {
    pub fn new(tweens: Vec<Tween>) -> Self {
        Self {
            tweens,
            current: 0,
            state: PlaybackState::Pending,
            paused_from: PlaybackState::Pending,
            loop_count: Repeat::NONE,
            loop_remaining: Repeat::NONE,
            listeners: TweenListeners::new(),
        }
    }

    /// Builder: replay the whole chain this many extra times
    pub fn with_loop(mut self, loops: Repeat) -> Self {
        self.loop_count = loops;
        self.loop_remaining = loops;
        self
    }

    /// Builder: append a tween
    pub fn then(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    pub fn on<F>(&mut self, kind: TweenEventKind, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on(kind, listener);
    }

    pub fn on_any<F>(&mut self, listener: F)
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on_any(listener);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the tween currently playing
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Tween> {
        self.tweens.get(self.current)
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn tweens_mut(&mut self) -> &mut [Tween] {
        &mut self.tweens
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn has_target(&self, target: &SharedTarget) -> bool {
        self.tweens.iter().any(|t| t.has_target(target))
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Active
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self.state, PlaybackState::Complete | PlaybackState::Removed)
    }

    /// Start from the first tween, resume, or restart a finished chain
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Pending | PlaybackState::Complete => self.begin(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Removed => {
                tracing::warn!("play() on a removed chain ignored");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn pause(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Paused | PlaybackState::Complete | PlaybackState::Removed
        ) {
            return;
        }
        if let Some(tween) = self.tweens.get_mut(self.current) {
            tween.pause();
        }
        self.paused_from = self.state;
        self.state = PlaybackState::Paused;
        self.listeners.dispatch(&TweenEvent::Pause);
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        self.listeners.dispatch(&TweenEvent::Resume);
        if self.paused_from == PlaybackState::Pending {
            return self.begin();
        }
        self.state = self.paused_from;
        if let Some(tween) = self.tweens.get_mut(self.current) {
            tween.resume()?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Removed {
            return;
        }
        if let Some(tween) = self.tweens.get_mut(self.current) {
            tween.stop();
        }
        self.state = PlaybackState::Removed;
        self.listeners.dispatch(&TweenEvent::Stop);
    }

    /// Advance the current tween, moving on when it completes. Returns
    /// whether the chain is still alive.
    pub fn update(&mut self, delta_ms: f32) -> Result<bool> {
        if self.state != PlaybackState::Active {
            return Ok(self.is_alive());
        }

        let done = match self.tweens.get_mut(self.current) {
            Some(tween) => {
                // a member stopped from outside counts as done
                !tween.update(delta_ms)?
            }
            None => true,
        };

        if done {
            self.advance_to_next()?;
        }
        Ok(self.is_alive())
    }

    pub fn destroy(&mut self) {
        for tween in self.tweens.iter_mut() {
            tween.destroy();
        }
        self.listeners.clear();
        self.state = PlaybackState::Removed;
    }

    pub(crate) fn activate(&mut self) -> Result<()> {
        if self.state == PlaybackState::Pending {
            self.begin()?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.current = 0;
        self.loop_remaining = self.loop_count;
        self.state = PlaybackState::Active;
        self.listeners.dispatch(&TweenEvent::Active);

        if self.tweens.is_empty() {
            self.finish();
            return Ok(());
        }
        self.start_current()
    }

    fn start_current(&mut self) -> Result<()> {
        let Some(tween) = self.tweens.get_mut(self.current) else {
            return Ok(());
        };
        tracing::trace!("chain starting tween {}", self.current);
        if tween.state() == PlaybackState::Pending {
            tween.play()
        } else {
            tween.restart()
        }
    }

    fn advance_to_next(&mut self) -> Result<()> {
        if self.current + 1 < self.tweens.len() {
            self.current += 1;
            return self.start_current();
        }

        if self.loop_remaining.is_pending() && !self.tweens.is_empty() {
            self.loop_remaining.decrement();
            self.current = 0;
            self.listeners.dispatch(&TweenEvent::Loop);
            return self.start_current();
        }

        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        self.state = PlaybackState::Complete;
        self.listeners.dispatch(&TweenEvent::Complete);
        tracing::debug!("chain of {} tweens complete", self.tweens.len());
    }
}

impl std::fmt::Debug for TweenChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenChain")
            .field("state", &self.state)
            .field("current", &self.current)
            .field("tweens", &self.tweens.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{shared, PropertyTarget};
    use crate::unit::{TimingUnit, UnitTiming};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn step(target: &Rc<RefCell<PropertyTarget>>, end: f32) -> Tween {
        Tween::new(
            vec![target.clone()],
            vec![TimingUnit::new(
                0,
                "x",
                UnitTiming {
                    duration: 100.0,
                    ..Default::default()
                },
            )
            .to(end)],
        )
    }

    #[test]
    fn test_tweens_play_in_sequence() {
        let target = shared(PropertyTarget::new().with("x", 0.0));
        let mut chain = TweenChain::new(vec![step(&target, 10.0)]).then(step(&target, 20.0));
        chain.play().unwrap();

        chain.update(100.0).unwrap();
        assert_eq!(target.borrow().value("x"), Some(10.0));
        assert_eq!(chain.current_index(), 1);

        chain.update(50.0).unwrap();
        assert!((target.borrow().value("x").unwrap() - 15.0).abs() < 1e-3);

        assert!(!chain.update(50.0).unwrap());
        assert!(chain.is_complete());
        assert_eq!(target.borrow().value("x"), Some(20.0));
    }

    #[test]
    fn test_chain_loops() {
        let target = shared(PropertyTarget::new().with("x", 0.0));
        let mut chain =
            TweenChain::new(vec![step(&target, 10.0), step(&target, 20.0)]).with_loop(Repeat::Count(1));

        let loops = Rc::new(RefCell::new(0));
        let loops_clone = loops.clone();
        chain.on(TweenEventKind::Loop, move |_| *loops_clone.borrow_mut() += 1);
        chain.play().unwrap();

        let mut ticks = 0;
        while chain.update(100.0).unwrap() {
            ticks += 1;
            assert!(ticks < 10);
        }
        assert_eq!(ticks + 1, 4);
        assert_eq!(*loops.borrow(), 1);
    }

    #[test]
    fn test_pause_and_stop() {
        let target = shared(PropertyTarget::new().with("x", 0.0));
        let mut chain = TweenChain::new(vec![step(&target, 100.0)]);
        chain.play().unwrap();
        chain.update(50.0).unwrap();

        chain.pause();
        chain.update(50.0).unwrap();
        assert!((target.borrow().value("x").unwrap() - 50.0).abs() < 1e-3);

        chain.resume().unwrap();
        chain.update(25.0).unwrap();
        assert!((target.borrow().value("x").unwrap() - 75.0).abs() < 1e-3);

        chain.stop();
        assert!(!chain.update(25.0).unwrap());
        assert_eq!(chain.tweens()[0].state(), PlaybackState::Removed);
    }

    #[test]
    fn test_empty_chain_completes_on_play() {
        let mut chain = TweenChain::new(Vec::new());
        chain.play().unwrap();
        assert!(chain.is_complete());
    }

    #[test]
    fn test_stopped_member_is_skipped() {
        let target = shared(PropertyTarget::new().with("x", 0.0));
        let mut chain = TweenChain::new(vec![step(&target, 10.0), step(&target, 20.0)]);
        chain.play().unwrap();
        chain.update(50.0).unwrap();

        chain.tweens_mut()[0].stop();
        chain.update(16.0).unwrap();
        assert_eq!(chain.current_index(), 1);

        chain.update(100.0).unwrap();
        assert!(chain.is_complete());
        assert_eq!(target.borrow().value("x"), Some(20.0));
    }
}
