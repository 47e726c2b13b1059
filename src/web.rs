//! The browser render target, backed by [`web_sys`].

use crate::dom_api::{DomApi, NodeKind};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Node};

/// Patches nodes of a [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
}

impl WebDom {
	#[must_use]
	pub fn for_document(document: Document) -> Self {
		Self { document }
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn new() -> Option<Self> {
		web_sys::window()?.document().map(Self::for_document)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn as_element(node: &Node) -> Result<&Element, JsValue> {
	node.dyn_ref::<Element>()
		.ok_or_else(|| js_sys::Error::new("twig-dom: Expected an element.").into())
}

impl DomApi for WebDom {
	type Handle = Node;
	type Error = JsValue;

	fn create_element(&self, tag: &str, ns: Option<&str>) -> Result<Node, JsValue> {
		let element = match ns {
			Some(ns) => self.document.create_element_ns(Some(ns), tag)?,
			None => self.document.create_element(tag)?,
		};
		Ok(element.into())
	}

	fn create_text_node(&self, text: &str) -> Node {
		self.document.create_text_node(text).into()
	}

	fn create_comment(&self, text: &str) -> Node {
		self.document.create_comment(text).into()
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) -> Result<(), JsValue> {
		parent.insert_before(node, reference).map(drop)
	}

	fn remove_child(&self, parent: &Node, node: &Node) -> Result<(), JsValue> {
		parent.remove_child(node).map(drop)
	}

	fn append_child(&self, parent: &Node, node: &Node) -> Result<(), JsValue> {
		parent.append_child(node).map(drop)
	}

	fn parent_node(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn set_text_content(&self, node: &Node, text: &str) {
		node.set_text_content(Some(text))
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		as_element(element)?.set_attribute(name, value)
	}

	fn tag_name(&self, element: &Node) -> String {
		match element.dyn_ref::<Element>() {
			Some(element) => element.tag_name(),
			None => element.node_name(),
		}
	}

	fn element_id(&self, element: &Node) -> Option<String> {
		Some(element.dyn_ref::<Element>()?.id()).filter(|id| !id.is_empty())
	}

	fn class_name(&self, element: &Node) -> Option<String> {
		Some(element.dyn_ref::<Element>()?.class_name()).filter(|class_name| !class_name.is_empty())
	}

	fn node_kind(&self, node: &Node) -> NodeKind {
		match node.node_type() {
			Node::ELEMENT_NODE => NodeKind::Element,
			Node::TEXT_NODE => NodeKind::Text,
			Node::COMMENT_NODE => NodeKind::Comment,
			_ => NodeKind::Other,
		}
	}

	fn text_data(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<CharacterData>().map(CharacterData::data)
	}
}
