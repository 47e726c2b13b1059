#![allow(dead_code)]

use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use twig_dom::{DomApi, NodeKind};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub usize);

/// Everything the patcher asked the render target to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
	Create(Id),
	Insert { parent: Id, node: Id, before: Option<Id> },
	Append { parent: Id, node: Id },
	Remove { parent: Id, node: Id },
	SetText { node: Id, text: String },
	SetAttribute { node: Id, name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure(pub String);

#[derive(Debug, Clone)]
struct Entry {
	kind: NodeKind,
	tag: String,
	ns: Option<String>,
	text: String,
	attributes: Vec<(String, String)>,
	parent: Option<Id>,
	children: Vec<Id>,
}

/// An in-memory render target that records every mutation.
///
/// Clones share their state, so hooks can inspect the tree mid-pass.
#[derive(Debug, Default, Clone)]
pub struct Recorder(Rc<State>);

#[derive(Debug, Default)]
struct State {
	nodes: RefCell<Vec<Entry>>,
	ops: RefCell<Vec<Op>>,
	fail_inserts: Cell<bool>,
}

impl Recorder {
	pub fn new() -> Self {
		Self::default()
	}

	fn add(&self, kind: NodeKind, tag: &str, ns: Option<&str>, text: &str) -> Id {
		let mut nodes = self.0.nodes.borrow_mut();
		nodes.push(Entry {
			kind,
			tag: tag.to_owned(),
			ns: ns.map(str::to_owned),
			text: text.to_owned(),
			attributes: Vec::new(),
			parent: None,
			children: Vec::new(),
		});
		Id(nodes.len() - 1)
	}

	fn log(&self, op: Op) {
		self.0.ops.borrow_mut().push(op)
	}

	/// Creates a detached element without logging it, to serve as container.
	pub fn container(&self, tag: &str) -> Id {
		self.add(NodeKind::Element, tag, None, "")
	}

	/// Builds `<tag>` under `parent` without logging it, to simulate pre-existing content.
	pub fn seed_element(&self, parent: Id, tag: &str, attributes: &[(&str, &str)]) -> Id {
		let id = self.add(NodeKind::Element, tag, None, "");
		self.0.nodes.borrow_mut()[id.0].attributes = attributes.iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect();
		self.attach(parent, id, None).unwrap();
		id
	}

	pub fn seed_text(&self, parent: Id, text: &str) -> Id {
		let id = self.add(NodeKind::Text, "", None, text);
		self.attach(parent, id, None).unwrap();
		id
	}

	pub fn seed_comment(&self, parent: Id, text: &str) -> Id {
		let id = self.add(NodeKind::Comment, "", None, text);
		self.attach(parent, id, None).unwrap();
		id
	}

	pub fn take_ops(&self) -> Vec<Op> {
		self.0.ops.borrow_mut().drain(..).collect()
	}

	pub fn fail_inserts(&self, fail: bool) {
		self.0.fail_inserts.set(fail)
	}

	pub fn children(&self, id: Id) -> Vec<Id> {
		self.0.nodes.borrow()[id.0].children.clone()
	}

	pub fn parent(&self, id: Id) -> Option<Id> {
		self.0.nodes.borrow()[id.0].parent
	}

	pub fn ns(&self, id: Id) -> Option<String> {
		self.0.nodes.borrow()[id.0].ns.clone()
	}

	pub fn attribute(&self, id: Id, name: &str) -> Option<String> {
		self.0.nodes.borrow()[id.0]
			.attributes
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, value)| value.clone())
	}

	/// Serializes the subtree below `id`, including `id` itself.
	pub fn render(&self, id: Id) -> String {
		let nodes = self.0.nodes.borrow();
		let mut out = String::new();
		render(&nodes, id, &mut out);
		out
	}

	/// Serializes only the children of `id`.
	pub fn render_children(&self, id: Id) -> String {
		let nodes = self.0.nodes.borrow();
		let mut out = String::new();
		for child in &nodes[id.0].children {
			render(&nodes, *child, &mut out);
		}
		out
	}

	fn detach(&self, node: Id) {
		let mut nodes = self.0.nodes.borrow_mut();
		if let Some(parent) = nodes[node.0].parent.take() {
			nodes[parent.0].children.retain(|child| *child != node);
		}
	}

	fn attach(&self, parent: Id, node: Id, before: Option<Id>) -> Result<(), Failure> {
		self.detach(node);
		let mut nodes = self.0.nodes.borrow_mut();
		let index = match before {
			Some(before) => nodes[parent.0]
				.children
				.iter()
				.position(|child| *child == before)
				.ok_or_else(|| Failure(format!("{:?} is not a child of {:?}", before, parent)))?,
			None => nodes[parent.0].children.len(),
		};
		nodes[parent.0].children.insert(index, node);
		nodes[node.0].parent = Some(parent);
		Ok(())
	}
}

fn render(nodes: &[Entry], id: Id, out: &mut String) {
	let entry = &nodes[id.0];
	match entry.kind {
		NodeKind::Element => {
			out.push('<');
			out.push_str(&entry.tag);
			for (name, value) in &entry.attributes {
				out.push_str(&format!(" {}=\"{}\"", name, value));
			}
			out.push('>');
			for child in &entry.children {
				render(nodes, *child, out);
			}
			out.push_str(&format!("</{}>", entry.tag));
		}
		NodeKind::Text => out.push_str(&entry.text),
		NodeKind::Comment => out.push_str(&format!("<!--{}-->", entry.text)),
		NodeKind::Other => out.push('?'),
	}
}

impl DomApi for Recorder {
	type Handle = Id;
	type Error = Failure;

	fn create_element(&self, tag: &str, ns: Option<&str>) -> Result<Id, Failure> {
		let id = self.add(NodeKind::Element, tag, ns, "");
		self.log(Op::Create(id));
		Ok(id)
	}

	fn create_text_node(&self, text: &str) -> Id {
		let id = self.add(NodeKind::Text, "", None, text);
		self.log(Op::Create(id));
		id
	}

	fn create_comment(&self, text: &str) -> Id {
		let id = self.add(NodeKind::Comment, "", None, text);
		self.log(Op::Create(id));
		id
	}

	fn insert_before(&self, parent: &Id, node: &Id, reference: Option<&Id>) -> Result<(), Failure> {
		if self.0.fail_inserts.get() {
			return Err(Failure("insertion refused".to_owned()));
		}
		self.attach(*parent, *node, reference.copied())?;
		self.log(Op::Insert {
			parent: *parent,
			node: *node,
			before: reference.copied(),
		});
		Ok(())
	}

	fn remove_child(&self, parent: &Id, node: &Id) -> Result<(), Failure> {
		if self.parent(*node) != Some(*parent) {
			return Err(Failure(format!("{:?} is not a child of {:?}", node, parent)));
		}
		self.detach(*node);
		self.log(Op::Remove { parent: *parent, node: *node });
		Ok(())
	}

	fn append_child(&self, parent: &Id, node: &Id) -> Result<(), Failure> {
		self.attach(*parent, *node, None)?;
		self.log(Op::Append { parent: *parent, node: *node });
		Ok(())
	}

	fn parent_node(&self, node: &Id) -> Option<Id> {
		self.parent(*node)
	}

	fn next_sibling(&self, node: &Id) -> Option<Id> {
		let parent = self.parent(*node)?;
		let siblings = self.children(parent);
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn first_child(&self, node: &Id) -> Option<Id> {
		self.children(*node).first().copied()
	}

	fn set_text_content(&self, node: &Id, text: &str) {
		self.log(Op::SetText {
			node: *node,
			text: text.to_owned(),
		});
		let kind = self.0.nodes.borrow()[node.0].kind;
		if kind == NodeKind::Element {
			for child in self.children(*node) {
				self.detach(child);
			}
			if !text.is_empty() {
				let child = self.add(NodeKind::Text, "", None, text);
				self.attach(*node, child, None).unwrap();
			}
		} else {
			self.0.nodes.borrow_mut()[node.0].text = text.to_owned();
		}
	}

	fn set_attribute(&self, element: &Id, name: &str, value: &str) -> Result<(), Failure> {
		self.log(Op::SetAttribute {
			node: *element,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		let mut nodes = self.0.nodes.borrow_mut();
		let attributes = &mut nodes[element.0].attributes;
		attributes.retain(|(n, _)| n != name);
		attributes.push((name.to_owned(), value.to_owned()));
		Ok(())
	}

	fn tag_name(&self, element: &Id) -> String {
		self.0.nodes.borrow()[element.0].tag.to_uppercase()
	}

	fn element_id(&self, element: &Id) -> Option<String> {
		self.attribute(*element, "id").filter(|id| !id.is_empty())
	}

	fn class_name(&self, element: &Id) -> Option<String> {
		self.attribute(*element, "class")
	}

	fn node_kind(&self, node: &Id) -> NodeKind {
		self.0.nodes.borrow()[node.0].kind
	}

	fn text_data(&self, node: &Id) -> Option<String> {
		let nodes = self.0.nodes.borrow();
		let entry = &nodes[node.0];
		match entry.kind {
			NodeKind::Text | NodeKind::Comment => Some(entry.text.clone()),
			NodeKind::Element | NodeKind::Other => None,
		}
	}
}

/// A keyed `<li>` with its key as text.
pub fn li(key: &str) -> twig_dom::VNode<Id> {
	twig_dom::VNode::element("li").with_key(key).with_text(key)
}

pub fn ul(keys: &[&str]) -> twig_dom::VNode<Id> {
	twig_dom::VNode::element("ul").with_children(keys.iter().map(|key| li(key)))
}

/// Handles of the children of a realized node, in order.
pub fn child_handles(node: &twig_dom::VNode<Id>) -> Vec<Id> {
	node.as_children()
		.unwrap_or_default()
		.iter()
		.map(|child| child.handle.expect("Unrealized child"))
		.collect()
}
