//! Attribute values, component properties, context and events.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::ComponentId;
use crate::dom::NodeId;
use crate::vnode::VNode;

/// Ordered attribute mapping carried by a description node.
pub type Attributes = IndexMap<String, AttrValue>;

/// Event handler attached through an `on*` attribute.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// What a `ref` callback is pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefTarget {
    Node(NodeId),
    Component(ComponentId),
}

/// Side channel exposing the live instance of a description to its author.
///
/// Invoked with `Some` once the instance is reconciled and with `None` when
/// it is torn down.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<RefTarget>)>);

impl RefCallback {
    pub fn new(callback: impl Fn(Option<RefTarget>) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, target: Option<RefTarget>) {
        (self.0)(target)
    }

    pub fn ptr_eq(&self, other: &RefCallback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefCallback(..)")
    }
}

/// A single attribute or property value.
#[derive(Clone)]
pub enum AttrValue {
    Null,
    Str(String),
    Bool(bool),
    Number(f64),
    Handler(Handler),
    Ref(RefCallback),
    /// Class name to enabled flag; serialized as the space-joined enabled names.
    Classes(IndexMap<String, bool>),
    /// Style property to value; numeric values get a `px` suffix unless unitless.
    Style(IndexMap<String, AttrValue>),
    /// Opaque value handed from one unit to another, compared by identity.
    Any(Rc<dyn Any>),
}

impl AttrValue {
    pub fn any<T: 'static>(value: T) -> Self {
        AttrValue::Any(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Truthiness used wherever the host treats a value as "present".
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Str(s) => !s.is_empty(),
            AttrValue::Bool(b) => *b,
            AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
            _ => true,
        }
    }

    /// Values the host can store verbatim as an attribute string.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            AttrValue::Str(_) | AttrValue::Bool(_) | AttrValue::Number(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            AttrValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_ref_callback(&self) -> Option<&RefCallback> {
        match self {
            AttrValue::Ref(callback) => Some(callback),
            _ => None,
        }
    }

    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            AttrValue::Any(value) => value.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// String form the host stores for scalar values.
    pub fn to_host_string(&self) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }
}

/// Formats a number the way text children and host attributes display it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => true,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            (AttrValue::Handler(a), AttrValue::Handler(b)) => a.ptr_eq(b),
            (AttrValue::Ref(a), AttrValue::Ref(b)) => a.ptr_eq(b),
            (AttrValue::Classes(a), AttrValue::Classes(b)) => a == b,
            (AttrValue::Style(a), AttrValue::Style(b)) => a == b,
            (AttrValue::Any(a), AttrValue::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("Null"),
            AttrValue::Str(s) => write!(f, "Str({s:?})"),
            AttrValue::Bool(b) => write!(f, "Bool({b})"),
            AttrValue::Number(n) => write!(f, "Number({n})"),
            AttrValue::Handler(h) => h.fmt(f),
            AttrValue::Ref(r) => r.fmt(f),
            AttrValue::Classes(c) => f.debug_tuple("Classes").field(c).finish(),
            AttrValue::Style(s) => f.debug_tuple("Style").field(s).finish(),
            AttrValue::Any(_) => f.write_str("Any(..)"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<Handler> for AttrValue {
    fn from(value: Handler) -> Self {
        AttrValue::Handler(value)
    }
}

impl From<RefCallback> for AttrValue {
    fn from(value: RefCallback) -> Self {
        AttrValue::Ref(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

/// Stable identity token for matching siblings across renders.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    /// Reads a key from an attribute value; empty strings and non-scalars carry no key.
    pub fn from_value(value: &AttrValue) -> Option<Key> {
        match value {
            AttrValue::Str(s) if !s.is_empty() => Some(Key(s.clone())),
            AttrValue::Number(n) => Some(Key(format_number(*n))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs handed to a unit: its description's attributes plus its children.
#[derive(Clone, Default)]
pub struct Props {
    attributes: Attributes,
    children: Vec<VNode>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(attributes: Attributes, children: Vec<VNode>) -> Self {
        Self {
            attributes,
            children,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).map(AttrValue::is_truthy).unwrap_or(false)
    }

    pub fn get_any<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(AttrValue::downcast::<T>)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.attributes.shift_remove(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Values inherited from ancestor units; a unit may extend it for its subtree.
#[derive(Clone, Default)]
pub struct Context(Rc<Attributes>);

impl Context {
    pub fn new(values: Attributes) -> Self {
        Self(Rc::new(values))
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn get_any<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(AttrValue::downcast::<T>)
    }

    /// Returns a new context with `extra` layered over these values.
    pub fn extend(&self, extra: Attributes) -> Context {
        let mut values = (*self.0).clone();
        values.extend(extra);
        Context::new(values)
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&*self.0).finish()
    }
}

/// Event delivered through a node's listener proxy.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: String,
    pub target: NodeId,
    /// Live `value` of the target when the event was dispatched.
    pub value: Option<String>,
    /// Live `checked` state of the target when the event was dispatched.
    pub checked: Option<bool>,
}

impl Event {
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            value: None,
            checked: None,
        }
    }
}
