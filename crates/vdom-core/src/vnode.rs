//! Description nodes and the `h` builder.

use std::fmt;
use std::rc::Rc;

use crate::component::StatefulUnit;
use crate::options;
use crate::value::{format_number, AttrValue, Attributes, Context, Key, Props, RefCallback};

/// Pure render function: a unit without state or lifecycle.
#[derive(Clone)]
pub struct FunctionalUnit {
    name: &'static str,
    render: Rc<dyn Fn(&Props, &Context) -> Option<VNode>>,
}

impl FunctionalUnit {
    pub fn new(
        name: &'static str,
        render: impl Fn(&Props, &Context) -> Option<VNode> + 'static,
    ) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, props: &Props, context: &Context) -> Option<VNode> {
        (self.render)(props, context)
    }
}

impl PartialEq for FunctionalUnit {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

/// Reference to a unit definition.
#[derive(Clone, PartialEq)]
pub enum UnitType {
    Functional(FunctionalUnit),
    Stateful(StatefulUnit),
}

impl UnitType {
    pub fn name(&self) -> &'static str {
        match self {
            UnitType::Functional(unit) => unit.name(),
            UnitType::Stateful(unit) => unit.name(),
        }
    }
}

/// What a description node renders as; fixed when the node is built.
#[derive(Clone, PartialEq)]
pub enum NodeKind {
    Text(String),
    Element(String),
    Unit(UnitType),
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        NodeKind::Element(tag.to_string())
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::Element(tag)
    }
}

impl From<UnitType> for NodeKind {
    fn from(unit: UnitType) -> Self {
        NodeKind::Unit(unit)
    }
}

impl From<StatefulUnit> for NodeKind {
    fn from(unit: StatefulUnit) -> Self {
        NodeKind::Unit(UnitType::Stateful(unit))
    }
}

impl From<FunctionalUnit> for NodeKind {
    fn from(unit: FunctionalUnit) -> Self {
        NodeKind::Unit(UnitType::Functional(unit))
    }
}

/// Declarative description of one node for a single render pass.
#[derive(Clone)]
pub struct VNode {
    kind: NodeKind,
    attributes: Option<Attributes>,
    children: Vec<VNode>,
    key: Option<Key>,
}

impl VNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text(text.into()),
            attributes: None,
            children: Vec::new(),
            key: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Mutable access for vnode hooks that normalize attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes.get_or_insert_with(Attributes::new)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(name))
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub(crate) fn ref_callback(&self) -> Option<RefCallback> {
        self.attribute("ref")
            .and_then(AttrValue::as_ref_callback)
            .cloned()
    }

    /// Properties a unit receives for this node: attributes, children and
    /// any defaults the unit declares for attributes left unset.
    pub(crate) fn unit_props(&self, defaults: Option<Attributes>) -> Props {
        let mut attributes = self.attributes.clone().unwrap_or_default();
        if let Some(defaults) = defaults {
            for (name, value) in defaults {
                attributes.entry(name).or_insert(value);
            }
        }
        Props::from_parts(attributes, self.children.clone())
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Text(text) => write!(f, "{text:?}"),
            NodeKind::Element(tag) => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attributes", &self.attributes)
                .field("children", &self.children)
                .finish(),
            NodeKind::Unit(unit) => f
                .debug_struct("Unit")
                .field("name", &unit.name())
                .field("attributes", &self.attributes)
                .field("children", &self.children)
                .finish(),
        }
    }
}

/// Builder input for a child slot.
#[derive(Clone, Debug)]
pub enum Child {
    Node(VNode),
    List(Vec<Child>),
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Number(value)
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Number(value as f64)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Number(value as f64)
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Number(value as f64)
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Bool(value)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Child::Null)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(values: Vec<T>) -> Self {
        Child::List(values.into_iter().map(Into::into).collect())
    }
}

/// Builds a child list from heterogeneous expressions.
#[macro_export]
macro_rules! children {
    () => {
        ::std::vec::Vec::<$crate::Child>::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}

/// Builds an attribute map from `name => value` pairs.
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attributes::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut attributes = $crate::Attributes::new();
        $(attributes.insert(::std::string::String::from($name), $crate::AttrValue::from($value));)+
        attributes
    }};
}

/// Creates a description node.
///
/// Children are flattened depth-first. `Null` and `false` are dropped,
/// numbers and `true` become text, and runs of adjacent text merge into one
/// entry. When no children are given, a `children` attribute holding a
/// `Vec<VNode>` is used instead. The global vnode hook sees every node before
/// it is returned.
pub fn h(
    kind: impl Into<NodeKind>,
    attributes: Option<Attributes>,
    children: impl IntoIterator<Item = Child>,
) -> VNode {
    let mut attributes = attributes;
    let mut stack: Vec<Child> = children.into_iter().collect();
    if let Some(attrs) = attributes.as_mut() {
        if let Some(passed) = attrs.shift_remove("children") {
            if stack.is_empty() {
                if let Some(nodes) = passed.downcast::<Vec<VNode>>() {
                    stack.push(Child::List(nodes.iter().cloned().map(Child::Node).collect()));
                }
            }
        }
    }
    stack.reverse();

    let mut flattened: Vec<VNode> = Vec::new();
    let mut last_simple = false;
    while let Some(child) = stack.pop() {
        let text = match child {
            Child::List(items) => {
                stack.extend(items.into_iter().rev());
                continue;
            }
            Child::Null | Child::Bool(false) => continue,
            Child::Bool(true) => "true".to_string(),
            Child::Number(n) => format_number(n),
            Child::Text(text) => text,
            Child::Node(node) => match node.kind {
                NodeKind::Text(text) => text,
                _ => {
                    flattened.push(node);
                    last_simple = false;
                    continue;
                }
            },
        };
        if last_simple {
            if let Some(NodeKind::Text(previous)) = flattened.last_mut().map(|node| &mut node.kind)
            {
                previous.push_str(&text);
                continue;
            }
        }
        flattened.push(VNode::text(text));
        last_simple = true;
    }

    let key = attributes
        .as_ref()
        .and_then(|attrs| attrs.get("key"))
        .and_then(Key::from_value);

    let mut node = VNode {
        kind: kind.into(),
        attributes,
        children: flattened,
        key,
    };
    options::run_vnode_hook(&mut node);
    node
}
