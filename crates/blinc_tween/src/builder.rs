//! Fluent tween construction
//!
//! ```ignore
//! let tween = TweenBuilder::new()
//!     .target(sprite.clone())
//!     .to("x", 400.0)
//!     .to("alpha", "-=0.5".parse::<Resolver>()?)
//!     .duration(600.0)
//!     .ease(Easing::EaseOutCubic)
//!     .yoyo(true)
//!     .build()?;
//! ```

use crate::easing::Ease;
use crate::error::{Result, TweenError};
use crate::events::{TweenEvent, TweenEventKind, TweenListeners};
use crate::resolver::Resolver;
use crate::target::SharedTarget;
use crate::tween::Tween;
use crate::unit::{Repeat, TimingUnit, UnitTiming, ValueMode};

/// One animated property, with optional per-property overrides
#[derive(Clone, Debug)]
pub struct PropTween {
    key: String,
    start: Resolver,
    end: Resolver,
    timing: Option<UnitTiming>,
    ease: Option<Ease>,
    delay: Option<Resolver>,
    mode: Option<ValueMode>,
}

impl PropTween {
    /// Animate `key` from and to its current value until configured
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            start: Resolver::Current,
            end: Resolver::Current,
            timing: None,
            ease: None,
            delay: None,
            mode: None,
        }
    }

    pub fn from(mut self, start: impl Into<Resolver>) -> Self {
        self.start = start.into();
        self
    }

    pub fn to(mut self, end: impl Into<Resolver>) -> Self {
        self.end = end.into();
        self
    }

    /// Override the shared timing for this property
    pub fn timing(mut self, timing: UnitTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn delay(mut self, delay: impl Into<Resolver>) -> Self {
        self.delay = Some(delay.into());
        self
    }

    pub fn mode(mut self, mode: ValueMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Builder producing a [`Tween`] with one unit per `(target, property)`
#[derive(Default)]
pub struct TweenBuilder {
    targets: Vec<SharedTarget>,
    props: Vec<PropTween>,
    timing: UnitTiming,
    ease: Ease,
    delay: Resolver,
    mode: ValueMode,
    loop_count: Repeat,
    loop_delay: f32,
    complete_delay: f32,
    time_scale: Option<f32>,
    paused: bool,
    listeners: TweenListeners,
}

impl TweenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: SharedTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = SharedTarget>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Animate `key` from its current value to `end`
    pub fn to(self, key: impl Into<String>, end: impl Into<Resolver>) -> Self {
        self.prop(PropTween::new(key).to(end))
    }

    /// Animate `key` between explicit values
    pub fn from_to(
        self,
        key: impl Into<String>,
        start: impl Into<Resolver>,
        end: impl Into<Resolver>,
    ) -> Self {
        self.prop(PropTween::new(key).from(start).to(end))
    }

    pub fn prop(mut self, prop: PropTween) -> Self {
        self.props.push(prop);
        self
    }

    /// Replace the shared timing wholesale
    pub fn timing(mut self, timing: UnitTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn duration(mut self, ms: f32) -> Self {
        self.timing.duration = ms;
        self
    }

    pub fn hold(mut self, ms: f32) -> Self {
        self.timing.hold = ms;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.timing.yoyo = yoyo;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.timing.repeat = repeat;
        self
    }

    pub fn repeat_delay(mut self, ms: f32) -> Self {
        self.timing.repeat_delay = ms;
        self
    }

    pub fn flip_x(mut self, flip: bool) -> Self {
        self.timing.flip_x = flip;
        self
    }

    pub fn flip_y(mut self, flip: bool) -> Self {
        self.timing.flip_y = flip;
        self
    }

    pub fn ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = ease.into();
        self
    }

    /// Shared delay; use [`stagger`](crate::resolver::stagger) to space targets
    pub fn delay(mut self, delay: impl Into<Resolver>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_loop(mut self, loops: Repeat) -> Self {
        self.loop_count = loops;
        self
    }

    pub fn loop_delay(mut self, ms: f32) -> Self {
        self.loop_delay = ms;
        self
    }

    pub fn complete_delay(mut self, ms: f32) -> Self {
        self.complete_delay = ms;
        self
    }

    pub fn time_scale(mut self, scale: f32) -> Self {
        self.time_scale = Some(scale);
        self
    }

    /// Build the tween already paused; it starts on `resume()`
    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn on<F>(mut self, kind: TweenEventKind, listener: F) -> Self
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on(kind, listener);
        self
    }

    pub fn on_any<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&TweenEvent) + 'static,
    {
        self.listeners.on_any(listener);
        self
    }

    /// Create one unit per `(target, property)`, target-major
    pub fn build(self) -> Result<Tween> {
        if self.targets.is_empty() {
            return Err(TweenError::InvalidConfig("tween has no targets".into()));
        }
        if self.props.is_empty() {
            return Err(TweenError::InvalidConfig("tween has no properties".into()));
        }

        let mut units = Vec::with_capacity(self.targets.len() * self.props.len());
        for target_index in 0..self.targets.len() {
            for prop in &self.props {
                let timing = prop.timing.clone().unwrap_or_else(|| self.timing.clone());
                let unit = TimingUnit::new(target_index, prop.key.clone(), timing)
                    .values(prop.start.clone(), prop.end.clone())
                    .delay(prop.delay.clone().unwrap_or_else(|| self.delay.clone()))
                    .ease(prop.ease.clone().unwrap_or_else(|| self.ease.clone()))
                    .mode(prop.mode.unwrap_or(self.mode));
                units.push(unit);
            }
        }

        tracing::debug!(
            "building tween: {} targets x {} properties",
            self.targets.len(),
            self.props.len()
        );

        let mut tween = Tween::new(self.targets, units)
            .with_loop(self.loop_count)
            .with_loop_delay(self.loop_delay)
            .with_complete_delay(self.complete_delay);
        if let Some(scale) = self.time_scale {
            tween.set_time_scale(scale);
        }
        if self.paused {
            tween.pause();
        }
        Ok(tween.with_listeners(self.listeners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::resolver::stagger;
    use crate::target::{shared, PropertyTarget};
    use crate::tween::PlaybackState;

    #[test]
    fn test_units_are_target_major() {
        let a: SharedTarget = shared(PropertyTarget::new().with("x", 0.0).with("y", 0.0));
        let b: SharedTarget = shared(PropertyTarget::new().with("x", 0.0).with("y", 0.0));

        let tween = TweenBuilder::new()
            .targets([a, b])
            .to("x", 1.0)
            .to("y", 2.0)
            .build()
            .unwrap();

        let layout: Vec<(usize, &str)> = tween
            .units()
            .iter()
            .map(|u| (u.target_index(), u.key()))
            .collect();
        assert_eq!(layout, vec![(0, "x"), (0, "y"), (1, "x"), (1, "y")]);
    }

    #[test]
    fn test_empty_builder_is_rejected() {
        assert!(matches!(
            TweenBuilder::new().to("x", 1.0).build(),
            Err(TweenError::InvalidConfig(_))
        ));

        let target: SharedTarget = shared(PropertyTarget::new());
        assert!(matches!(
            TweenBuilder::new().target(target).build(),
            Err(TweenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shared_timing_and_overrides() {
        let target = shared(PropertyTarget::new().with("x", 0.0).with("y", 0.0));
        let mut tween = TweenBuilder::new()
            .target(target.clone())
            .duration(200.0)
            .ease(Easing::EaseInQuad)
            .to("x", 100.0)
            .prop(PropTween::new("y").to(100.0).timing(UnitTiming {
                duration: 100.0,
                ..Default::default()
            }))
            .build()
            .unwrap();

        tween.play().unwrap();
        assert_eq!(tween.unit(0).unwrap().duration(), 200.0);
        assert_eq!(tween.unit(1).unwrap().duration(), 100.0);

        tween.update(100.0).unwrap();
        // ease_in_quad(0.5) = 0.25; y has finished its shorter pass
        assert!((target.borrow().value("x").unwrap() - 25.0).abs() < 1e-3);
        assert_eq!(target.borrow().value("y"), Some(100.0));
    }

    #[test]
    fn test_staggered_delays() {
        let targets: Vec<SharedTarget> = (0..3)
            .map(|_| shared(PropertyTarget::new().with("x", 0.0)) as SharedTarget)
            .collect();
        let mut tween = TweenBuilder::new()
            .targets(targets)
            .to("x", 1.0)
            .delay(stagger(100.0, 0.0))
            .build()
            .unwrap();
        tween.play().unwrap();

        let delays: Vec<f32> = tween.units().iter().map(|u| u.resolved_delay()).collect();
        assert_eq!(delays, vec![0.0, 100.0, 200.0]);
        assert_eq!(tween.start_delay(), 0.0);
        assert_eq!(tween.duration(), 1200.0);
    }

    #[test]
    fn test_paused_build_waits_for_resume() {
        let target: SharedTarget = shared(PropertyTarget::new().with("x", 0.0));
        let mut tween = TweenBuilder::new()
            .target(target)
            .to("x", 1.0)
            .paused(true)
            .build()
            .unwrap();

        assert!(tween.is_paused());
        tween.resume().unwrap();
        assert_eq!(tween.state(), PlaybackState::Active);
    }
}
