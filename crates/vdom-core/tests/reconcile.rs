use vdom_core::{attrs, children, h, AttrValue, Child, NodeId, NodeKind, VNode};
use vdom_testing::{run_test_render, RenderTestRule};

fn row(key: &str, selected: bool) -> Child {
    h(
        "li",
        Some(attrs! {
            "key" => key,
            "class" => if selected { "row selected" } else { "row" },
        }),
        children![key],
    )
    .into()
}

fn table(keys: &[&str], selected: Option<&str>) -> VNode {
    h(
        "ul",
        None,
        keys.iter()
            .map(|key| row(key, Some(*key) == selected))
            .collect::<Vec<_>>(),
    )
}

fn row_with_text(rule: &RenderTestRule, list: NodeId, text: &str) -> NodeId {
    rule.engine()
        .document()
        .children(list)
        .iter()
        .copied()
        .find(|&row| rule.text_of(row) == text)
        .expect("row present")
}

#[test]
fn builder_coalesces_mixed_children_into_one_text() {
    let node = h(
        "div",
        Some(attrs! {}),
        children!["a", 1, true, Option::<&str>::None, "b"],
    );
    assert_eq!(node.children().len(), 1);
    assert_eq!(node.children()[0].as_text(), Some("a1trueb"));
}

#[test]
fn builder_drops_false_and_flattens_lists() {
    let node = h(
        "p",
        None,
        children![
            false,
            vec![Child::from("x"), Child::from(vec![h("br", None, children![])])],
            2.5,
        ],
    );
    let kinds: Vec<_> = node
        .children()
        .iter()
        .map(|child| match child.kind() {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element(tag) => format!("<{tag}>"),
            NodeKind::Unit(unit) => unit.name().to_string(),
        })
        .collect();
    assert_eq!(kinds, vec!["x", "<br>", "2.5"]);
}

#[test]
fn builder_reads_key_and_children_attribute() {
    let passed = vec![h("i", None, children![]), VNode::text("t")];
    let node = h(
        "div",
        Some(attrs! {
            "key" => 7,
            "children" => AttrValue::any(passed),
        }),
        children![],
    );
    assert_eq!(node.key().map(|key| key.as_str()), Some("7"));
    assert_eq!(node.children().len(), 2);
    assert!(node.attribute("children").is_none());
}

#[test]
fn rerendering_identical_description_is_a_no_op() {
    run_test_render(|rule| {
        rule.set_content(|| table(&["a", "b", "c"], Some("b")))
            .expect("mount");
        rule.reset_stats();
        rule.rerender().expect("rerender");
        assert_eq!(rule.stats().total(), 0);
    });
}

#[test]
fn keyed_reorder_preserves_instances() {
    run_test_render(|rule| {
        let order = std::rc::Rc::new(std::cell::RefCell::new(vec!["a", "b", "c", "d"]));
        let root = rule
            .set_content({
                let order = std::rc::Rc::clone(&order);
                move || table(&order.borrow(), None)
            })
            .expect("mount");
        let a = row_with_text(rule, root, "a");
        let d = row_with_text(rule, root, "d");

        *order.borrow_mut() = vec!["d", "c", "b", "a"];
        rule.reset_stats();
        rule.rerender().expect("reverse");

        assert_eq!(rule.engine().document().first_child(root), Some(d));
        assert_eq!(rule.engine().document().last_child(root), Some(a));
        assert_eq!(rule.stats().created, 0);
        assert_eq!(rule.stats().removed, 0);
        assert_eq!(rule.text_of(root), "dcba");
    });
}

#[test]
fn single_attribute_change_is_a_single_mutation() {
    run_test_render(|rule| {
        let selected = std::rc::Rc::new(std::cell::Cell::new(None));
        rule.set_content({
            let selected = std::rc::Rc::clone(&selected);
            move || table(&["a", "b", "c"], selected.get())
        })
        .expect("mount");
        rule.reset_stats();

        selected.set(Some("c"));
        rule.rerender().expect("select");
        let stats = rule.stats();
        assert_eq!(stats.attribute_writes, 1);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.total(), 1);
    });
}

#[test]
fn growing_and_shrinking_lists_reuse_pooled_elements() {
    run_test_render(|rule| {
        let keys = std::rc::Rc::new(std::cell::RefCell::new(vec!["a", "b", "c"]));
        rule.set_content({
            let keys = std::rc::Rc::clone(&keys);
            move || table(&keys.borrow(), None)
        })
        .expect("mount");

        *keys.borrow_mut() = vec!["a"];
        rule.rerender().expect("shrink");
        assert_eq!(rule.engine().pooled_nodes(), 2);

        *keys.borrow_mut() = vec!["a", "x", "y"];
        rule.reset_stats();
        rule.rerender().expect("grow");
        assert_eq!(rule.engine().pooled_nodes(), 0);
        assert_eq!(rule.find_all_by_tag("li").len(), 3);
        assert_eq!(rule.html(), "<ul><li class=\"row\">a</li><li class=\"row\">x</li><li class=\"row\">y</li></ul>");
    });
}

#[test]
fn style_and_class_maps_serialize() {
    run_test_render(|rule| {
        let mut classes = indexmap::IndexMap::new();
        classes.insert("on".to_string(), true);
        classes.insert("off".to_string(), false);
        let mut style = indexmap::IndexMap::new();
        style.insert("width".to_string(), AttrValue::Number(4.0));
        style.insert("zIndex".to_string(), AttrValue::Number(2.0));
        let classes = AttrValue::Classes(classes);
        let style = AttrValue::Style(style);
        rule.set_content(move || {
            h(
                "div",
                Some(attrs! { "class" => classes.clone(), "style" => style.clone() }),
                children![],
            )
        })
        .expect("mount");
        assert_eq!(
            rule.html(),
            "<div class=\"on\" style=\"width: 4px; zIndex: 2;\"></div>"
        );
    });
}

#[test]
fn user_edits_survive_unrelated_rerenders_but_not_value_changes() {
    run_test_render(|rule| {
        let value = std::rc::Rc::new(std::cell::RefCell::new("start".to_string()));
        rule.set_content({
            let value = std::rc::Rc::clone(&value);
            move || h("input", Some(attrs! { "value" => value.borrow().clone() }), children![])
        })
        .expect("mount");
        let input = rule.find_by_tag("input").expect("input");

        rule.engine_mut()
            .document_mut()
            .set_live_value(input, "typed")
            .expect("type");
        rule.rerender().expect("rerender");
        assert_eq!(rule.node(input).and_then(|n| n.value()), Some("start"));

        *value.borrow_mut() = "next".to_string();
        rule.rerender().expect("rerender");
        assert_eq!(rule.node(input).and_then(|n| n.value()), Some("next"));
    });
}
