use super::*;

fn document_with_list(len: usize) -> (Document, NodeId, Vec<NodeId>) {
    let mut document = Document::new();
    let list = document.create_element("ul");
    let items = (0..len)
        .map(|_| {
            let item = document.create_element("li");
            document.append_child(list, item).expect("append item");
            item
        })
        .collect();
    (document, list, items)
}

#[test]
fn insert_before_moves_existing_children() {
    let (mut document, list, items) = document_with_list(3);
    document
        .insert_before(list, items[2], Some(items[0]))
        .expect("move last to front");
    assert_eq!(document.children(list), &[items[2], items[0], items[1]]);
    assert_eq!(document.parent(items[2]), Some(list));
}

#[test]
fn insert_before_appends_when_reference_is_foreign() {
    let (mut document, list, items) = document_with_list(2);
    let stray = document.create_element("li");
    document
        .insert_before(list, stray, Some(999))
        .expect("append stray");
    assert_eq!(document.last_child(list), Some(stray));
    assert_eq!(document.children(list).len(), 3);
    assert_eq!(document.first_child(list), Some(items[0]));
}

#[test]
fn replace_child_swaps_in_place() {
    let (mut document, list, items) = document_with_list(3);
    let replacement = document.create_element("li");
    document
        .replace_child(list, replacement, items[1])
        .expect("replace");
    assert_eq!(document.children(list), &[items[0], replacement, items[2]]);
    assert_eq!(document.parent(items[1]), None);
    assert!(document.contains(items[1]));
}

#[test]
fn remove_counts_only_attached_nodes() {
    let (mut document, _list, items) = document_with_list(1);
    document.reset_stats();
    document.remove(items[0]).expect("detach");
    document.remove(items[0]).expect("already detached");
    assert_eq!(document.stats().removed, 1);
}

#[test]
fn release_drops_the_slot() {
    let mut document = Document::new();
    let text = document.create_text("gone");
    document.release(text).expect("release");
    assert!(!document.contains(text));
    assert_eq!(document.node(text).err(), Some(DomError::Missing { id: text }));
}

#[test]
fn set_text_rejects_elements_and_skips_unchanged_writes() {
    let mut document = Document::new();
    let div = document.create_element("div");
    let text = document.create_text("a");
    assert_eq!(
        document.set_text(div, "x"),
        Err(DomError::NotText { id: div })
    );
    document.reset_stats();
    document.set_text(text, "a").expect("same text");
    assert_eq!(document.stats().text_writes, 0);
    document.set_text(text, "b").expect("new text");
    assert_eq!(document.stats().text_writes, 1);
    assert_eq!(document.node(text).ok().and_then(DomNode::text), Some("b"));
}

#[test]
fn css_text_parses_declarations() {
    let mut document = Document::new();
    let div = document.create_element("div");
    document
        .set_css_text(div, "color: red; margin : 0 ;; bogus")
        .expect("css");
    let node = document.node(div).expect("div");
    assert_eq!(node.style_property("color"), Some("red"));
    assert_eq!(node.style_property("margin"), Some("0"));
    assert_eq!(node.css_text(), "color: red; margin: 0;");

    document.set_style_property(div, "color", "").expect("clear");
    assert_eq!(document.node(div).expect("div").style_property("color"), None);
}

#[test]
fn set_property_rejects_structured_values() {
    let mut document = Document::new();
    let input = document.create_element("input");
    let rejected = document.set_property(input, "value", &AttrValue::Classes(IndexMap::new()));
    assert_eq!(
        rejected,
        Err(DomError::Rejected {
            id: input,
            name: "value".to_string()
        })
    );
    document
        .set_property(input, "value", &AttrValue::Number(3.5))
        .expect("scalar value");
    document
        .set_property(input, "disabled", &AttrValue::Bool(true))
        .expect("bool prop");
    let node = document.node(input).expect("input");
    assert_eq!(node.value(), Some("3.5"));
    assert_eq!(node.attribute("disabled"), Some(""));
}

#[test]
fn live_edits_are_not_counted() {
    let mut document = Document::new();
    let input = document.create_element("input");
    document.reset_stats();
    document.set_live_value(input, "typed").expect("type");
    document.set_live_checked(input, true).expect("toggle");
    assert_eq!(document.stats(), MutationStats::default());
    assert!(document.live_property_matches(input, "value", &AttrValue::from("typed")));
    assert!(document.live_property_matches(input, "checked", &AttrValue::Bool(true)));
    assert!(!document.live_property_matches(input, "value", &AttrValue::from("other")));
}

#[test]
fn outer_html_orders_class_attributes_then_style() {
    let mut document = Document::new();
    let div = document.create_element("DIV");
    let text = document.create_text("a < b");
    document.append_child(div, text).expect("append");
    document.set_attribute(div, "title", "\"hi\"").expect("attr");
    document.set_class_name(div, "box").expect("class");
    document.set_style_property(div, "width", "10px").expect("style");
    assert_eq!(
        document.outer_html(div),
        "<DIV class=\"box\" title=\"&quot;hi&quot;\" style=\"width: 10px;\">a &lt; b</DIV>"
    );
    assert_eq!(document.text_content(div), "a < b");
}

#[test]
fn inner_html_overrides_children_in_markup() {
    let mut document = Document::new();
    let div = document.create_element("div");
    let text = document.create_text("hidden");
    document.append_child(div, text).expect("append");
    document.set_inner_html(div, Some("<b>raw</b>")).expect("html");
    assert_eq!(document.outer_html(div), "<div><b>raw</b></div>");
    document.set_inner_html(div, None).expect("clear");
    assert_eq!(document.outer_html(div), "<div>hidden</div>");
}

#[test]
fn listeners_record_capture_flag() {
    let mut document = Document::new();
    let input = document.create_element("input");
    document.add_event_listener(input, "focus", true).expect("focus");
    document.add_event_listener(input, "input", false).expect("input");
    let listeners: Vec<_> = document.node(input).expect("input").listeners().collect();
    assert_eq!(listeners, vec![("focus", true), ("input", false)]);
    document.remove_event_listener(input, "focus").expect("remove");
    assert!(!document.node(input).expect("input").has_listener("focus"));
}

#[test]
fn dump_tree_indents_children() {
    let (document, list, items) = document_with_list(1);
    let dump = document.dump_tree(list);
    assert_eq!(dump, format!("#{list} <ul>\n  #{} <li>\n", items[0]));
}
