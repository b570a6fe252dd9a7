//! Blinc Tween Engine
//!
//! Time-based property tweening driven by an external frame clock.
//!
//! # Features
//!
//! - **Timing Units**: Per-property state machines with delay, hold, yoyo and repeat
//! - **Tweens**: Aggregate units over shared targets with one play/pause lifecycle
//! - **Chains**: Play tweens back to back, optionally looping
//! - **Scheduler**: Deterministic insertion-order ticking with deferred add/remove
//! - **Resolvers**: Per-target start, end and delay values (relative, staggered, dynamic)
//! - **Config**: Serde-friendly tween descriptions

pub mod builder;
pub mod chain;
pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod resolver;
pub mod scheduler;
pub mod target;
pub mod tween;
pub mod unit;

pub use builder::{PropTween, TweenBuilder};
pub use chain::TweenChain;
pub use config::{PropConfig, TimingConfig, TweenConfig, ValueConfig};
pub use easing::{Ease, Easing};
pub use error::{Result, TweenError};
pub use events::{TweenEvent, TweenEventKind, TweenListeners};
pub use resolver::{stagger, stagger_from, ResolveContext, Resolver, StaggerFrom};
pub use scheduler::{Animation, AnimationId, AnimationScheduler, SchedulerQueue};
pub use target::{shared, PropertyTarget, SharedTarget, Target};
pub use tween::{PlaybackState, Tween};
pub use unit::{Repeat, TimingUnit, UnitState, UnitTiming, ValueMode};
