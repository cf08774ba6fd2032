//! Store-into-caller-variable bindings.
//!
//! A rule created with one of the `store_*` modifiers carries a [`Sink`].
//! The parser writes the rule's resolved value into it exactly once per
//! successful pass, after every check has passed, so the bound variable and
//! the returned snapshot always agree. A rule left unset by a pass resets
//! its target to the zero value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::value::{FromValue, Value};

/// Shared, caller-readable storage for a bound rule value.
///
/// # Examples
///
/// ```
/// use argrules_core::{Parser, binding};
///
/// let level = binding::<i64>();
/// let mut parser = Parser::new();
/// parser.add_option("--power-level").store_int(&level);
///
/// parser.parse_args(&["--power-level", "10000"]).unwrap();
/// assert_eq!(*level.borrow(), 10000);
/// ```
pub type Binding<T> = Rc<RefCell<T>>;

/// Creates an empty [`Binding`] holding `T::default()`.
pub fn binding<T: Default>() -> Binding<T> {
    Rc::new(RefCell::new(T::default()))
}

/// A write target for resolved values.
pub trait Sink: fmt::Debug {
    fn write(&self, value: &Value);

    /// Restores the zero value after a pass that left the rule unset.
    fn reset(&self);
}

impl<T> Sink for RefCell<T>
where
    T: FromValue + Default + fmt::Debug,
{
    fn write(&self, value: &Value) {
        *self.borrow_mut() = T::from_value(value);
    }

    fn reset(&self) {
        *self.borrow_mut() = T::default();
    }
}
