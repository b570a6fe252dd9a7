//! Animation scheduler
//!
//! Owns every running tween and chain and advances them each frame.
//! Animations added during a tick (directly or through a [`SchedulerQueue`])
//! only start at the next tick boundary; removed ones are purged there too.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use slotmap::{new_key_type, SlotMap};

use crate::chain::TweenChain;
use crate::error::Result;
use crate::target::SharedTarget;
use crate::tween::{PlaybackState, Tween};

new_key_type! {
    pub struct AnimationId;
}

/// Anything the scheduler can drive
#[derive(Debug)]
pub enum Animation {
    Tween(Tween),
    Chain(TweenChain),
}

impl Animation {
    pub fn state(&self) -> PlaybackState {
        match self {
            Animation::Tween(t) => t.state(),
            Animation::Chain(c) => c.state(),
        }
    }

    pub fn play(&mut self) -> Result<()> {
        match self {
            Animation::Tween(t) => t.play(),
            Animation::Chain(c) => c.play(),
        }
    }

    pub fn pause(&mut self) {
        match self {
            Animation::Tween(t) => t.pause(),
            Animation::Chain(c) => c.pause(),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self {
            Animation::Tween(t) => t.resume(),
            Animation::Chain(c) => c.resume(),
        }
    }

    pub fn stop(&mut self) {
        match self {
            Animation::Tween(t) => t.stop(),
            Animation::Chain(c) => c.stop(),
        }
    }

    pub fn update(&mut self, delta_ms: f32) -> Result<bool> {
        match self {
            Animation::Tween(t) => t.update(delta_ms),
            Animation::Chain(c) => c.update(delta_ms),
        }
    }

    pub fn destroy(&mut self) {
        match self {
            Animation::Tween(t) => t.destroy(),
            Animation::Chain(c) => c.destroy(),
        }
    }

    pub fn has_target(&self, target: &SharedTarget) -> bool {
        match self {
            Animation::Tween(t) => t.has_target(target),
            Animation::Chain(c) => c.has_target(target),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Animation::Tween(t) => t.is_alive(),
            Animation::Chain(c) => c.is_alive(),
        }
    }

    pub fn is_playing(&self) -> bool {
        match self {
            Animation::Tween(t) => t.is_playing(),
            Animation::Chain(c) => c.is_playing(),
        }
    }

    fn activate(&mut self) -> Result<()> {
        match self {
            Animation::Tween(t) => t.activate(),
            Animation::Chain(c) => c.activate(),
        }
    }
}

impl From<Tween> for Animation {
    fn from(tween: Tween) -> Self {
        Animation::Tween(tween)
    }
}

impl From<TweenChain> for Animation {
    fn from(chain: TweenChain) -> Self {
        Animation::Chain(chain)
    }
}

enum QueuedOp {
    Add(Animation),
    Remove(AnimationId),
}

/// Deferred handle onto a scheduler
///
/// Listeners run while the scheduler is mid-tick, so they cannot borrow it.
/// Operations pushed here are applied at the start of the next tick.
#[derive(Clone, Default)]
pub struct SchedulerQueue {
    ops: Rc<RefCell<Vec<QueuedOp>>>,
}

impl SchedulerQueue {
    pub fn add(&self, animation: impl Into<Animation>) {
        self.ops.borrow_mut().push(QueuedOp::Add(animation.into()));
    }

    pub fn remove(&self, id: AnimationId) {
        self.ops.borrow_mut().push(QueuedOp::Remove(id));
    }

    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    fn take(&self) -> Vec<QueuedOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }
}

impl std::fmt::Debug for SchedulerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerQueue")
            .field("ops", &self.len())
            .finish()
    }
}

/// The animation scheduler that ticks all active animations
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Animation>,
    /// Added since the last tick, in insertion order
    pending: Vec<AnimationId>,
    /// Update order
    active: Vec<AnimationId>,
    queue: SchedulerQueue,
    time_scale: f32,
    last_frame: Instant,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
            pending: Vec::new(),
            active: Vec::new(),
            queue: SchedulerQueue::default(),
            time_scale: 1.0,
            last_frame: Instant::now(),
        }
    }

    /// Global multiplier applied to every tick's delta
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Handle for deferring add/remove from inside listeners
    pub fn queue(&self) -> SchedulerQueue {
        self.queue.clone()
    }

    /// Add an animation. It starts playing at the next tick.
    pub fn add(&mut self, animation: impl Into<Animation>) -> AnimationId {
        let id = self.animations.insert(animation.into());
        self.pending.push(id);
        tracing::debug!("animation {:?} added, pending until next tick", id);
        id
    }

    /// Stop an animation now; it is dropped at the next tick boundary
    pub fn remove(&mut self, id: AnimationId) -> bool {
        match self.animations.get_mut(id) {
            Some(animation) => {
                animation.stop();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.get(id)
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
        self.animations.get_mut(id)
    }

    pub fn tween(&self, id: AnimationId) -> Option<&Tween> {
        match self.animations.get(id) {
            Some(Animation::Tween(t)) => Some(t),
            _ => None,
        }
    }

    pub fn tween_mut(&mut self, id: AnimationId) -> Option<&mut Tween> {
        match self.animations.get_mut(id) {
            Some(Animation::Tween(t)) => Some(t),
            _ => None,
        }
    }

    pub fn chain(&self, id: AnimationId) -> Option<&TweenChain> {
        match self.animations.get(id) {
            Some(Animation::Chain(c)) => Some(c),
            _ => None,
        }
    }

    pub fn chain_mut(&mut self, id: AnimationId) -> Option<&mut TweenChain> {
        match self.animations.get_mut(id) {
            Some(Animation::Chain(c)) => Some(c),
            _ => None,
        }
    }

    /// Advance every animation by `delta_ms`
    ///
    /// Order: apply queued ops, start pending animations in insertion order,
    /// update active animations in insertion order, purge finished ones.
    /// The first resolver error aborts the tick and is returned.
    pub fn tick(&mut self, delta_ms: f32) -> Result<()> {
        self.drain_queue();
        self.activate_pending()?;

        let delta = delta_ms * self.time_scale;
        for index in 0..self.active.len() {
            let id = self.active[index];
            if let Some(animation) = self.animations.get_mut(id) {
                animation.update(delta)?;
            }
        }

        self.purge();
        Ok(())
    }

    /// Tick using the wall-clock time since the previous frame
    pub fn tick_frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.tick(dt)
    }

    pub fn pause_all(&mut self) {
        for (_, animation) in self.animations.iter_mut() {
            animation.pause();
        }
    }

    pub fn resume_all(&mut self) -> Result<()> {
        for (_, animation) in self.animations.iter_mut() {
            animation.resume()?;
        }
        Ok(())
    }

    /// Stop everything; all animations are purged at the next tick
    pub fn kill_all(&mut self) {
        for (_, animation) in self.animations.iter_mut() {
            animation.stop();
        }
    }

    /// Whether a live animation addresses `target`
    pub fn is_tweening(&self, target: &SharedTarget) -> bool {
        self.animations
            .iter()
            .any(|(_, a)| a.is_alive() && a.has_target(target))
    }

    /// Stop every animation addressing `target`, returning how many
    pub fn kill_tweens_of(&mut self, target: &SharedTarget) -> usize {
        let mut killed = 0;
        for (_, animation) in self.animations.iter_mut() {
            if animation.is_alive() && animation.has_target(target) {
                animation.stop();
                killed += 1;
            }
        }
        killed
    }

    /// Check if any animations are still playing
    pub fn has_active_animations(&self) -> bool {
        self.animations.iter().any(|(_, a)| a.is_playing())
    }

    /// Ids in update order, followed by those still pending
    pub fn ids(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.active.iter().chain(self.pending.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    fn drain_queue(&mut self) {
        for op in self.queue.take() {
            match op {
                QueuedOp::Add(animation) => {
                    self.add(animation);
                }
                QueuedOp::Remove(id) => {
                    self.remove(id);
                }
            }
        }
    }

    fn activate_pending(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for (index, id) in pending.iter().enumerate() {
            let Some(animation) = self.animations.get_mut(*id) else {
                continue;
            };
            if let Err(err) = animation.activate() {
                // retried from the failed one on the next tick
                self.pending.extend_from_slice(&pending[index..]);
                return Err(err);
            }
            self.active.push(*id);
        }
        Ok(())
    }

    fn purge(&mut self) {
        let animations = &mut self.animations;
        self.active.retain(|id| {
            if animations.get(*id).is_some_and(|a| a.is_alive()) {
                return true;
            }
            if let Some(mut animation) = animations.remove(*id) {
                tracing::debug!("animation {:?} finished ({:?})", id, animation.state());
                animation.destroy();
            }
            false
        });
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
