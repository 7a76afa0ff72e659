use std::cell::Cell;

use vdom_core::{
    attrs, children, h, set_vnode_hook, AttrValue, Attributes, Child, Component, Context,
    FunctionalUnit, Link, Options, Props, VNode, View,
};
use vdom_testing::{run_test_render, RenderTestRule};

thread_local! {
    static TALLY_RENDERS: Cell<usize> = const { Cell::new(0) };
}

struct Tally {
    link: Link<Tally>,
}

impl Component for Tally {
    type State = u32;

    fn create(_props: &Props, _context: &Context, link: Link<Self>) -> Self {
        Self { link }
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        TALLY_RENDERS.with(|renders| renders.set(renders.get() + 1));
        Some(h(
            "div",
            Some(attrs! { "onClick" => self.link.handler(|count, _, _| *count += 1) }),
            children![h("span", Some(attrs! { "class" => "count" }), children![*view.state as usize])],
        ))
    }
}

struct Theme;

impl Component for Theme {
    type State = ();

    fn create(_props: &Props, _context: &Context, _link: Link<Self>) -> Self {
        Theme
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        let passed: Vec<Child> = view.props.children().iter().cloned().map(Child::from).collect();
        Some(h("section", None, passed))
    }

    fn child_context(&self, view: View<'_, Self>) -> Option<Attributes> {
        Some(attrs! { "theme" => view.props.get_str("theme").unwrap_or("light") })
    }
}

fn theme_label() -> FunctionalUnit {
    FunctionalUnit::new("ThemeLabel", |_props, context| {
        let theme = context
            .get("theme")
            .and_then(AttrValue::as_str)
            .unwrap_or("none");
        Some(h("span", None, children![theme]))
    })
}

struct Echo {
    link: Link<Echo>,
}

impl Component for Echo {
    type State = String;

    fn create(_props: &Props, _context: &Context, link: Link<Self>) -> Self {
        Self { link }
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        Some(h(
            "form",
            None,
            children![
                h(
                    "input",
                    Some(attrs! {
                        "value" => view.state.clone(),
                        "onInput" => self.link.handler(|text, _, event| {
                            *text = event.value.clone().unwrap_or_default();
                        }),
                    }),
                    children![],
                ),
                h("output", None, children![view.state.clone()]),
            ],
        ))
    }
}

#[test]
fn state_changes_batch_into_one_render_and_one_flush_request() {
    run_test_render(|rule| {
        rule.set_content(|| h(Tally::unit(), None, children![]))
            .expect("mount");
        let before = TALLY_RENDERS.with(Cell::get);

        let id = rule.engine().find_component::<Tally>().expect("tally");
        let link = rule
            .engine()
            .component::<Tally>(id)
            .map(|tally| tally.link.clone())
            .expect("instance");
        link.set_state(|count, _| *count += 1);
        link.set_state(|count, _| *count += 10);
        link.set_state(|count, _| *count *= 2);

        assert_eq!(rule.flush_requests(), 1);
        assert_eq!(rule.pump_until_idle().expect("pump"), 1);
        assert_eq!(TALLY_RENDERS.with(Cell::get), before + 1);
        assert_eq!(rule.engine().state::<Tally>(id), Some(&22));
        assert_eq!(rule.html(), "<div><span class=\"count\">22</span></div>");
    });
}

#[test]
fn clicks_bubble_to_ancestor_listeners() {
    run_test_render(|rule| {
        rule.set_content(|| h(Tally::unit(), None, children![]))
            .expect("mount");
        let count = rule.find_by_class("count").expect("count span");

        assert_eq!(rule.dispatch(count, "click").expect("click"), 1);
        assert_eq!(rule.dispatch(count, "click").expect("click"), 1);
        assert_eq!(rule.text_of(count), "2");
    });
}

#[test]
fn non_bubbling_events_reach_capturing_ancestors_first() {
    run_test_render(|rule| {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        rule.set_content({
            let seen = std::rc::Rc::clone(&seen);
            move || {
                let record = |name: &'static str| {
                    let seen = std::rc::Rc::clone(&seen);
                    vdom_core::Handler::new(move |_| seen.borrow_mut().push(name))
                };
                h(
                    "div",
                    Some(attrs! { "onFocus" => record("div") }),
                    children![h(
                        "label",
                        Some(attrs! { "onClick" => record("label") }),
                        children![h("input", Some(attrs! { "onFocus" => record("input") }), children![])],
                    )],
                )
            }
        })
        .expect("mount");
        let input = rule.find_by_tag("input").expect("input");
        let root = rule.root_id().expect("root");

        assert_eq!(rule.dispatch(input, "focus").expect("focus"), 2);
        assert_eq!(*seen.borrow(), vec!["div", "input"]);

        seen.borrow_mut().clear();
        assert_eq!(rule.dispatch(root, "focus").expect("focus"), 1);
        assert_eq!(*seen.borrow(), vec!["div"]);
        assert!(rule.node(root).is_some_and(|node| node
            .listeners()
            .any(|(event, capture)| event == "focus" && capture)));
    });
}

#[test]
fn child_context_reaches_functional_descendants() {
    run_test_render(|rule| {
        let label = theme_label();
        let theme = std::rc::Rc::new(Cell::new("dark"));
        rule.set_content({
            let theme = std::rc::Rc::clone(&theme);
            move || {
                h(
                    Theme::unit(),
                    Some(attrs! { "theme" => theme.get() }),
                    children![h(label.clone(), None, children![])],
                )
            }
        })
        .expect("mount");
        assert_eq!(rule.html(), "<section><span>dark</span></section>");

        theme.set("contrast");
        rule.rerender().expect("rerender");
        assert_eq!(rule.html(), "<section><span>contrast</span></section>");
    });
}

#[test]
fn context_is_empty_outside_a_provider() {
    run_test_render(|rule| {
        let label = theme_label();
        rule.set_content(move || h(label.clone(), None, children![]))
            .expect("mount");
        assert_eq!(rule.html(), "<span>none</span>");
    });
}

#[test]
fn event_hook_rewrites_events_before_handlers() {
    let options = Options::default().with_event_hook(|mut event| {
        event.value = event.value.map(|value| value.to_uppercase());
        event
    });
    let mut rule = RenderTestRule::with_options(options);
    rule.set_content(|| h(Echo::unit(), None, children![]))
        .expect("mount");
    let input = rule.find_by_tag("input").expect("input");

    assert_eq!(rule.input(input, "abc", "input").expect("input"), 1);
    let output = rule.find_by_tag("output").expect("output");
    assert_eq!(rule.text_of(output), "ABC");
    assert_eq!(rule.node(input).and_then(|node| node.value()), Some("ABC"));
}

#[test]
fn vnode_hook_sees_every_built_node_until_dropped() {
    {
        let _guard = set_vnode_hook(|node| {
            if node.tag().is_some() {
                node.attributes_mut()
                    .insert("data-built".to_string(), AttrValue::from(true));
            }
        });
        let hooked = h("p", None, children![h("b", None, children!["x"])]);
        assert!(hooked.attribute("data-built").is_some());
        assert!(hooked.children()[0].attribute("data-built").is_some());
    }
    let plain = h("p", None, children![]);
    assert!(plain.attribute("data-built").is_none());
}

#[test]
fn unit_swapped_for_element_unmounts_the_unit() {
    run_test_render(|rule| {
        let as_unit = std::rc::Rc::new(Cell::new(true));
        rule.set_content({
            let as_unit = std::rc::Rc::clone(&as_unit);
            move || {
                if as_unit.get() {
                    h(Tally::unit(), None, children![])
                } else {
                    h("p", None, children!["plain"])
                }
            }
        })
        .expect("mount");
        assert_eq!(rule.engine().component_count(), 1);

        as_unit.set(false);
        rule.rerender().expect("swap");
        assert_eq!(rule.engine().component_count(), 0);
        assert_eq!(rule.html(), "<p>plain</p>");
    });
}
