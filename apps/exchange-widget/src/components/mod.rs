//! Widget units.

pub mod currency_panel;
pub mod exchange_widget;

pub use currency_panel::*;
pub use exchange_widget::*;

use std::fmt;
use std::rc::Rc;

use vdom_core::AttrValue;

/// Typed callback handed from a parent unit to a child through props.
pub struct Callback<T>(Rc<dyn Fn(T)>);

impl<T> Callback<T> {
    pub fn new(callback: impl Fn(T) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn emit(&self, value: T) {
        (self.0)(value)
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

impl<T: 'static> From<Callback<T>> for AttrValue {
    fn from(callback: Callback<T>) -> Self {
        AttrValue::any(callback)
    }
}
