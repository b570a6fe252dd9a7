//! Serializable tween configuration
//!
//! ```json
//! {
//!   "duration": 500,
//!   "ease": "ease-out-cubic",
//!   "yoyo": true,
//!   "repeat": -1,
//!   "props": {
//!     "x": 400,
//!     "alpha": "-=0.5",
//!     "scale": { "from": 0.5, "to": 1, "duration": 250 }
//!   }
//! }
//! ```
//!
//! `repeat` and `loop` use the signed convention: `-1` repeats forever.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::builder::{PropTween, TweenBuilder};
use crate::easing::Easing;
use crate::error::Result;
use crate::resolver::{stagger_from, Resolver, StaggerFrom};
use crate::target::SharedTarget;
use crate::tween::Tween;
use crate::unit::{Repeat, UnitTiming};

/// Timing shared by every property of a tween
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub duration: f32,
    pub hold: f32,
    pub yoyo: bool,
    pub repeat: i32,
    pub repeat_delay: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub ease: Easing,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            hold: 0.0,
            yoyo: false,
            repeat: 0,
            repeat_delay: 0.0,
            flip_x: false,
            flip_y: false,
            ease: Easing::Linear,
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> UnitTiming {
        UnitTiming {
            duration: self.duration,
            hold: self.hold,
            yoyo: self.yoyo,
            repeat: Repeat::from_count(self.repeat),
            repeat_delay: self.repeat_delay,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
        }
    }
}

/// Per-property timing overrides; unset fields inherit the shared timing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoyo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_delay: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_x: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_y: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ease: Option<Easing>,
}

impl TimingOverrides {
    fn has_timing(&self) -> bool {
        self.duration.is_some()
            || self.hold.is_some()
            || self.yoyo.is_some()
            || self.repeat.is_some()
            || self.repeat_delay.is_some()
            || self.flip_x.is_some()
            || self.flip_y.is_some()
    }

    fn apply(&self, base: &TimingConfig) -> TimingConfig {
        TimingConfig {
            duration: self.duration.unwrap_or(base.duration),
            hold: self.hold.unwrap_or(base.hold),
            yoyo: self.yoyo.unwrap_or(base.yoyo),
            repeat: self.repeat.unwrap_or(base.repeat),
            repeat_delay: self.repeat_delay.unwrap_or(base.repeat_delay),
            flip_x: self.flip_x.unwrap_or(base.flip_x),
            flip_y: self.flip_y.unwrap_or(base.flip_y),
            ease: self.ease.unwrap_or(base.ease),
        }
    }
}

/// A number or a `"+=n"` style expression
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueConfig {
    Number(f32),
    Expr(String),
}

impl ValueConfig {
    pub fn to_resolver(&self) -> Result<Resolver> {
        match self {
            ValueConfig::Number(v) => Ok(Resolver::Constant(*v)),
            ValueConfig::Expr(s) => s.parse(),
        }
    }
}

/// Explicit start/end with optional timing overrides
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ValueConfig>,
    pub to: ValueConfig,
    #[serde(flatten)]
    pub overrides: TimingOverrides,
}

/// Configuration for one property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropConfig {
    Value(ValueConfig),
    Detailed(PropDetail),
}

impl PropConfig {
    fn into_prop(self, key: String, base: &TimingConfig) -> Result<PropTween> {
        match self {
            PropConfig::Value(end) => Ok(PropTween::new(key).to(end.to_resolver()?)),
            PropConfig::Detailed(detail) => {
                let mut prop = PropTween::new(key).to(detail.to.to_resolver()?);
                if let Some(from) = &detail.from {
                    prop = prop.from(from.to_resolver()?);
                }
                if detail.overrides.has_timing() {
                    prop = prop.timing(detail.overrides.apply(base).to_timing());
                }
                if let Some(ease) = detail.overrides.ease {
                    prop = prop.ease(ease);
                }
                if let Some(delay) = detail.overrides.delay {
                    prop = prop.delay(Resolver::Constant(delay));
                }
                Ok(prop)
            }
        }
    }
}

/// Spacing applied to the shared delay across targets
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    pub step: f32,
    pub from: StaggerFrom,
}

/// Complete tween description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    #[serde(flatten)]
    pub timing: TimingConfig,
    pub delay: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger: Option<StaggerConfig>,
    #[serde(rename = "loop")]
    pub loop_count: i32,
    pub loop_delay: f32,
    pub complete_delay: f32,
    pub time_scale: f32,
    pub paused: bool,
    pub props: IndexMap<String, PropConfig>,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            delay: 0.0,
            stagger: None,
            loop_count: 0,
            loop_delay: 0.0,
            complete_delay: 0.0,
            time_scale: 1.0,
            paused: false,
            props: IndexMap::new(),
        }
    }
}

impl TweenConfig {
    /// Turn the description into a builder over `targets`. Property order
    /// follows the config.
    pub fn into_builder(self, targets: Vec<SharedTarget>) -> Result<TweenBuilder> {
        let delay = match &self.stagger {
            Some(s) => stagger_from(s.step, self.delay, s.from),
            None => Resolver::Constant(self.delay),
        };

        let mut builder = TweenBuilder::new()
            .targets(targets)
            .timing(self.timing.to_timing())
            .ease(self.timing.ease)
            .delay(delay)
            .with_loop(Repeat::from_count(self.loop_count))
            .loop_delay(self.loop_delay)
            .complete_delay(self.complete_delay)
            .time_scale(self.time_scale)
            .paused(self.paused);

        for (key, prop) in self.props {
            builder = builder.prop(prop.into_prop(key, &self.timing)?);
        }
        Ok(builder)
    }

    pub fn build(self, targets: Vec<SharedTarget>) -> Result<Tween> {
        self.into_builder(targets)?.build()
    }
}
