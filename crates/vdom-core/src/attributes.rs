//! Attribute diffing and the per-name accessor rules.

use indexmap::IndexMap;

use crate::dom::{self, NodeId};
use crate::engine::{Engine, RenderError};
use crate::value::{format_number, AttrValue, Attributes};

/// Events that do not bubble and are registered in capture mode.
pub const NON_BUBBLING_EVENTS: &[&str] = &["blur", "error", "focus", "load", "resize", "scroll"];

/// Style properties that take bare numbers.
pub const NON_DIMENSION_PROPS: &[&str] = &[
    "boxFlex",
    "boxFlexGroup",
    "columnCount",
    "fillOpacity",
    "flex",
    "flexGrow",
    "flexPositive",
    "flexShrink",
    "flexNegative",
    "fontWeight",
    "lineClamp",
    "lineHeight",
    "opacity",
    "order",
    "orphans",
    "strokeOpacity",
    "widows",
    "zIndex",
    "zoom",
];

/// Space-joined names of the enabled classes.
pub fn class_list(classes: &IndexMap<String, bool>) -> String {
    classes
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn style_value(name: &str, value: &AttrValue) -> String {
    match value {
        AttrValue::Number(n) if !NON_DIMENSION_PROPS.contains(&name) => {
            format!("{}px", format_number(*n))
        }
        other => other.to_host_string().unwrap_or_default(),
    }
}

impl Engine {
    /// Brings the host attributes of `dom` in line with `attrs`, using `old`
    /// (the attributes applied last time) to find what changed.
    pub(crate) fn diff_attributes(
        &mut self,
        dom: NodeId,
        attrs: Option<&Attributes>,
        old: &mut Attributes,
    ) -> Result<(), RenderError> {
        let stale: Vec<String> = old
            .iter()
            .filter(|(name, value)| {
                !attrs.is_some_and(|attrs| attrs.contains_key(*name)) && !value.is_null()
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale {
            let previous = old.shift_remove(&name);
            self.set_accessor(dom, &name, previous.as_ref(), &AttrValue::Null)?;
        }

        let Some(attrs) = attrs else {
            return Ok(());
        };
        for (name, value) in attrs {
            if name == "children" || name == "innerHTML" {
                continue;
            }
            let changed = match old.get(name) {
                None => true,
                Some(_) if name == "value" || name == "checked" => {
                    !self.document.live_property_matches(dom, name, value)
                }
                Some(previous) => previous != value,
            };
            if changed {
                let previous = old.insert(name.clone(), value.clone());
                self.set_accessor(dom, name, previous.as_ref(), value)?;
            }
        }
        Ok(())
    }

    /// Applies one attribute to the host node.
    pub(crate) fn set_accessor(
        &mut self,
        dom: NodeId,
        name: &str,
        old: Option<&AttrValue>,
        value: &AttrValue,
    ) -> Result<(), RenderError> {
        let name = if name == "className" { "class" } else { name };
        match name {
            "key" | "ref" => {}
            "class" => {
                let class_name = match value {
                    AttrValue::Classes(classes) => class_list(classes),
                    other if other.is_truthy() => other.to_host_string().unwrap_or_default(),
                    _ => String::new(),
                };
                if self.document.node(dom)?.class_name() != class_name {
                    self.document.set_class_name(dom, &class_name)?;
                }
            }
            "style" => self.set_style(dom, old, value)?,
            "dangerouslySetInnerHTML" => {
                let html = value.as_str().filter(|_| value.is_truthy());
                self.document.set_inner_html(dom, html)?;
            }
            _ if name.len() > 2 && name.starts_with("on") => {
                let event = name[2..].to_lowercase();
                let capture = NON_BUBBLING_EVENTS.contains(&event.as_str());
                match value.as_handler() {
                    Some(handler) => {
                        let registered = self
                            .document
                            .node(dom)?
                            .binding
                            .handlers
                            .contains_key(&event);
                        if !registered {
                            self.document.add_event_listener(dom, &event, capture)?;
                        }
                        self.document
                            .node_mut(dom)?
                            .binding
                            .handlers
                            .insert(event, handler.clone());
                    }
                    None => {
                        let removed = self
                            .document
                            .node_mut(dom)?
                            .binding
                            .handlers
                            .remove(&event);
                        if removed.is_some() {
                            self.document.remove_event_listener(dom, &event)?;
                        }
                    }
                }
            }
            _ if name != "list" && name != "type" && dom::is_property(name) => {
                let assigned = if value.is_null() {
                    AttrValue::Str(String::new())
                } else {
                    value.clone()
                };
                if let Err(err) = self.document.set_property(dom, name, &assigned) {
                    log::debug!("ignoring rejected property write: {err}");
                }
                if value.is_null() || *value == AttrValue::Bool(false) {
                    self.document.remove_attribute(dom, name)?;
                }
            }
            _ => {
                if value.is_null() || *value == AttrValue::Bool(false) {
                    self.document.remove_attribute(dom, name)?;
                } else if let Some(text) = value.to_host_string() {
                    self.document.set_attribute(dom, name, &text)?;
                }
            }
        }
        Ok(())
    }

    fn set_style(
        &mut self,
        dom: NodeId,
        old: Option<&AttrValue>,
        value: &AttrValue,
    ) -> Result<(), RenderError> {
        let old_is_text = matches!(old, Some(AttrValue::Str(_)));
        if !value.is_truthy() || matches!(value, AttrValue::Str(_)) || old_is_text {
            let css = value.as_str().unwrap_or("");
            self.document.set_css_text(dom, css)?;
        }
        let AttrValue::Style(declarations) = value else {
            return Ok(());
        };
        if let Some(AttrValue::Style(previous)) = old {
            for property in previous.keys() {
                if !declarations.contains_key(property) {
                    self.document.set_style_property(dom, property, "")?;
                }
            }
        }
        for (property, raw) in declarations {
            let text = style_value(property, raw);
            if self.document.node(dom)?.style_property(property) != Some(text.as_str()) {
                self.document.set_style_property(dom, property, &text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
