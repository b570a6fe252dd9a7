//! Animation targets
//!
//! A target is anything exposing numeric properties by name. Targets are
//! shared between the application and every unit addressing them, so tweens
//! hold them as [`SharedTarget`].

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Object whose numeric properties can be tweened
pub trait Target {
    /// Read a property, `None` if the target has no such numeric property
    fn get(&self, key: &str) -> Option<f32>;

    /// Write a property
    fn set(&mut self, key: &str, value: f32);

    /// Toggle horizontal flip. Only called on units configured with `flip_x`.
    fn toggle_flip_x(&mut self) {}

    /// Toggle vertical flip. Only called on units configured with `flip_y`.
    fn toggle_flip_y(&mut self) {}
}

/// A target shared by reference between the application and its tweens
pub type SharedTarget = Rc<RefCell<dyn Target>>;

/// Wrap a concrete target for use in a tween
pub fn shared<T: Target + 'static>(target: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(target))
}

/// Identity comparison for shared targets
pub fn same_target(a: &SharedTarget, b: &SharedTarget) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// A plain property bag target
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTarget {
    values: FxHashMap<String, f32>,
    /// Current horizontal flip state
    pub flip_x: bool,
    /// Current vertical flip state
    pub flip_y: bool,
}

impl PropertyTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a property
    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Read a property (convenience over [`Target::get`])
    pub fn value(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    /// Number of properties held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Target for PropertyTarget {
    fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f32) {
        match self.values.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(key.to_owned(), value);
            }
        }
    }

    fn toggle_flip_x(&mut self) {
        self.flip_x = !self.flip_x;
    }

    fn toggle_flip_y(&mut self) {
        self.flip_y = !self.flip_y;
    }
}
