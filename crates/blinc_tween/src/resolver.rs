//! Value resolvers
//!
//! Delays, start values and end values are resolved per target at the moment
//! a unit needs them (reset, first render, yoyo/repeat boundaries), so one
//! configuration can produce different values for each target.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TweenError};
use crate::target::Target;

/// Summary of the owning tween, visible to resolvers
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TweenInfo {
    /// Longest unit total duration
    pub duration: f32,
    /// Shortest unit delay
    pub start_delay: f32,
    /// Time the tween has been playing
    pub elapsed: f32,
}

/// Inputs handed to a resolver
pub struct ResolveContext<'a> {
    pub target: &'a dyn Target,
    pub key: &'a str,
    /// Previous value: the target's current value, the current start value,
    /// or the freshly resolved start value depending on the call site
    pub value: f32,
    pub index: usize,
    pub total: usize,
    pub tween: &'a TweenInfo,
}

/// Arithmetic applied to the hint value by [`Resolver::Relative`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Dynamic resolver callback
pub type ResolverFn = Rc<dyn Fn(&ResolveContext<'_>) -> Result<f32>>;

/// A first-class value producer
#[derive(Clone)]
pub enum Resolver {
    /// Always the same value
    Constant(f32),
    /// Whatever value is passed in (keeps the target's current value)
    Current,
    /// `value <op> operand`
    Relative(RelativeOp, f32),
    /// Arbitrary callback
    Dynamic(ResolverFn),
}

impl Resolver {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> Result<f32> + 'static,
    {
        Resolver::Dynamic(Rc::new(f))
    }

    pub fn resolve(&self, cx: &ResolveContext<'_>) -> Result<f32> {
        match self {
            Resolver::Constant(v) => Ok(*v),
            Resolver::Current => Ok(cx.value),
            Resolver::Relative(op, operand) => match op {
                RelativeOp::Add => Ok(cx.value + operand),
                RelativeOp::Sub => Ok(cx.value - operand),
                RelativeOp::Mul => Ok(cx.value * operand),
                RelativeOp::Div if *operand == 0.0 => {
                    Err(TweenError::resolver(cx.key, "division by zero"))
                }
                RelativeOp::Div => Ok(cx.value / operand),
            },
            Resolver::Dynamic(f) => f(cx),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::Constant(0.0)
    }
}

impl From<f32> for Resolver {
    fn from(value: f32) -> Self {
        Resolver::Constant(value)
    }
}

impl From<f64> for Resolver {
    fn from(value: f64) -> Self {
        Resolver::Constant(value as f32)
    }
}

impl FromStr for Resolver {
    type Err = TweenError;

    /// Parse `"100"`, `"+=50"`, `"-=5"`, `"*=2"` or `"/=2"`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (op, rest) = match s.get(..2) {
            Some("+=") => (Some(RelativeOp::Add), &s[2..]),
            Some("-=") => (Some(RelativeOp::Sub), &s[2..]),
            Some("*=") => (Some(RelativeOp::Mul), &s[2..]),
            Some("/=") => (Some(RelativeOp::Div), &s[2..]),
            _ => (None, s),
        };

        let operand: f32 = rest
            .trim()
            .parse()
            .map_err(|_| TweenError::InvalidConfig(format!("bad value expression `{s}`")))?;

        Ok(match op {
            Some(op) => Resolver::Relative(op, operand),
            None => Resolver::Constant(operand),
        })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Resolver::Current => f.write_str("Current"),
            Resolver::Relative(op, v) => f.debug_tuple("Relative").field(op).field(v).finish(),
            Resolver::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Where a stagger counts from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerFrom {
    #[default]
    First,
    Last,
    Center,
}

/// Delay resolver spacing targets `step` ms apart, starting at `start`
pub fn stagger(step: f32, start: f32) -> Resolver {
    stagger_from(step, start, StaggerFrom::First)
}

/// Like [`stagger`], measuring distance from the given origin
pub fn stagger_from(step: f32, start: f32, from: StaggerFrom) -> Resolver {
    Resolver::dynamic(move |cx| {
        let last = cx.total.saturating_sub(1) as f32;
        let index = cx.index as f32;
        let distance = match from {
            StaggerFrom::First => index,
            StaggerFrom::Last => last - index,
            StaggerFrom::Center => (index - last / 2.0).abs(),
        };
        Ok(start + distance * step)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::PropertyTarget;

    fn resolve(resolver: &Resolver, value: f32, index: usize, total: usize) -> Result<f32> {
        let target = PropertyTarget::new();
        let info = TweenInfo::default();
        resolver.resolve(&ResolveContext {
            target: &target,
            key: "x",
            value,
            index,
            total,
            tween: &info,
        })
    }

    #[test]
    fn test_constant_and_current() {
        assert_eq!(resolve(&Resolver::Constant(7.0), 3.0, 0, 1), Ok(7.0));
        assert_eq!(resolve(&Resolver::Current, 3.0, 0, 1), Ok(3.0));
    }

    #[test]
    fn test_parse_relative_expressions() {
        let add: Resolver = "+=50".parse().unwrap();
        assert_eq!(resolve(&add, 10.0, 0, 1), Ok(60.0));

        let sub: Resolver = "-= 5".parse().unwrap();
        assert_eq!(resolve(&sub, 10.0, 0, 1), Ok(5.0));

        let mul: Resolver = "*=2".parse().unwrap();
        assert_eq!(resolve(&mul, 10.0, 0, 1), Ok(20.0));

        let abs: Resolver = "-12.5".parse().unwrap();
        assert_eq!(resolve(&abs, 10.0, 0, 1), Ok(-12.5));

        assert!("+=abc".parse::<Resolver>().is_err());
    }

    #[test]
    fn test_divide_by_zero_is_resolver_error() {
        let div: Resolver = "/=0".parse().unwrap();
        assert!(matches!(
            resolve(&div, 10.0, 0, 1),
            Err(TweenError::Resolver { .. })
        ));
    }

    #[test]
    fn test_stagger() {
        let delay = stagger(100.0, 50.0);
        assert_eq!(resolve(&delay, 0.0, 0, 4), Ok(50.0));
        assert_eq!(resolve(&delay, 0.0, 3, 4), Ok(350.0));

        let from_last = stagger_from(10.0, 0.0, StaggerFrom::Last);
        assert_eq!(resolve(&from_last, 0.0, 0, 4), Ok(30.0));

        let from_center = stagger_from(10.0, 0.0, StaggerFrom::Center);
        assert_eq!(resolve(&from_center, 0.0, 2, 5), Ok(0.0));
        assert_eq!(resolve(&from_center, 0.0, 0, 5), Ok(20.0));
    }
}
