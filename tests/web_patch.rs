#![cfg(all(target_arch = "wasm32", feature = "web"))]

use std::sync::Once;
use twig_dom::{init, web::WebDom, OldRoot, VNode};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, HtmlBodyElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn setup() -> (WebDom, Element) {
	static TRACING: Once = Once::new();
	TRACING.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let container = document.create_element("div").unwrap();
	body.append_child(&container).unwrap();
	(WebDom::for_document(document), container)
}

fn list(keys: &[&str]) -> VNode<Node> {
	VNode::element("ul.list").with_children(keys.iter().map(|key| VNode::element("li").with_key(*key).with_text(*key)))
}

#[wasm_bindgen_test]
fn create() {
	let (dom, container) = setup();
	let mut patcher = init(Vec::new(), dom);

	let tree = patcher
		.patch(
			OldRoot::Handle(container.clone().into()),
			VNode::element("div").with_children(vec![
				VNode::element("p#greeting.big.bold").with_text("Hello twig-dom!"),
				VNode::text("text"),
				VNode::comment("comment"),
			]),
		)
		.unwrap();

	assert_eq!(
		container.inner_html(),
		r#"<p id="greeting" class="big bold">Hello twig-dom!</p>text<!--comment-->"#
	);
	assert_eq!(tree.handle, Some(Node::from(container)));
}

#[wasm_bindgen_test]
fn keyed_reorder_keeps_elements() {
	let (dom, container) = setup();
	let mut patcher = init(Vec::new(), dom);

	let old = patcher.patch(OldRoot::Handle(container.clone().into()), VNode::element("div").with_children(vec![list(&["a", "b", "c"])])).unwrap();
	let ul = container.first_element_child().unwrap();
	let before: Vec<_> = (0..3).map(|i| ul.children().item(i).unwrap()).collect();

	patcher.patch(old, VNode::element("div").with_children(vec![list(&["c", "a", "d"])])).unwrap();

	assert_eq!(ul.inner_html(), "<li>c</li><li>a</li><li>d</li>");
	assert_eq!(ul.children().item(0).unwrap(), before[2]);
	assert_eq!(ul.children().item(1).unwrap(), before[0]);
	assert!(before[1].parent_node().is_none());
}

#[wasm_bindgen_test]
fn identical_remove() {
	let (dom, container) = setup();
	let mut patcher = init(Vec::new(), dom);
	let tree = || VNode::element("div").with_children(vec![VNode::text("Hello"), list(&["x"])]);

	let old = patcher.patch(OldRoot::Handle(container.clone().into()), tree()).unwrap();
	let html = container.inner_html();
	let old = patcher.patch(old, tree()).unwrap();
	assert_eq!(container.inner_html(), html);

	patcher.patch(old, VNode::element("div").with_children(Vec::new())).unwrap();
	assert_eq!(container.inner_html(), "");
}
