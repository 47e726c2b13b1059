//! The node descriptor that both trees passed to [`Patcher::patch`](`crate::Patcher::patch`) are made of.

use crate::{error::PatchError, hooks::Hooks};
use core::{any::Any, fmt};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;

/// The reserved selector of comment nodes.
pub const COMMENT: &str = "!";

/// Stable identity of a node within its sibling list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Str(String),
	Num(i64),
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Str(str) => write!(f, "{:?}", str),
			Key::Num(num) => write!(f, "{}", num),
		}
	}
}

impl From<&str> for Key {
	fn from(str: &str) -> Self {
		Self::Str(str.to_owned())
	}
}

impl From<String> for Key {
	fn from(string: String) -> Self {
		Self::Str(string)
	}
}

impl From<i64> for Key {
	fn from(num: i64) -> Self {
		Self::Num(num)
	}
}

impl From<i32> for Key {
	fn from(num: i32) -> Self {
		Self::Num(num.into())
	}
}

/// What a node holds below itself. Text and children are mutually exclusive.
#[derive(Debug, Clone)]
pub enum Content<H> {
	Empty,
	Text(String),
	Children(Vec<VNode<H>>),
}

/// One node of a declarative tree.
pub struct VNode<H> {
	pub sel: Option<String>,
	pub key: Option<Key>,
	pub data: VNodeData<H>,
	pub content: Content<H>,
	/// The realized render target node, bound exactly once during realization or patching.
	pub handle: Option<H>,
}

/// Per-node configuration: namespace, lifecycle hooks and an extension bag for aspect modules.
pub struct VNodeData<H> {
	/// Namespace the element is created in, if any.
	pub ns: Option<String>,
	pub hook: Hooks<H>,
	ext: HashMap<&'static str, Rc<dyn Any>>,
}

impl<H> Default for VNodeData<H> {
	fn default() -> Self {
		Self {
			ns: None,
			hook: Hooks::default(),
			ext: HashMap::new(),
		}
	}
}

impl<H> Clone for VNodeData<H> {
	fn clone(&self) -> Self {
		Self {
			ns: self.ns.clone(),
			hook: self.hook.clone(),
			ext: self.ext.clone(),
		}
	}
}

impl<H> fmt::Debug for VNodeData<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNodeData")
			.field("ns", &self.ns)
			.field("hook", &self.hook)
			.field("ext", &self.ext.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<H> VNodeData<H> {
	/// Retrieves the extension `name`, if it is present and of type `T`.
	#[must_use]
	pub fn ext<T: Any>(&self, name: &str) -> Option<&T> {
		self.ext.get(name)?.downcast_ref()
	}

	/// Sets the extension `name`, replacing any previous value.
	pub fn set_ext<T: Any>(&mut self, name: &'static str, value: T) {
		self.ext.insert(name, Rc::new(value));
	}
}

impl<H: Clone> Clone for VNode<H> {
	fn clone(&self) -> Self {
		Self {
			sel: self.sel.clone(),
			key: self.key.clone(),
			data: self.data.clone(),
			content: self.content.clone(),
			handle: self.handle.clone(),
		}
	}
}

impl<H: fmt::Debug> fmt::Debug for VNode<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNode")
			.field("sel", &self.sel)
			.field("key", &self.key)
			.field("data", &self.data)
			.field("content", &self.content)
			.field("handle", &self.handle)
			.finish()
	}
}

impl<H> VNode<H> {
	fn new(sel: Option<String>, content: Content<H>) -> Self {
		Self {
			sel,
			key: None,
			data: VNodeData::default(),
			content,
			handle: None,
		}
	}

	/// An element node. `sel` may carry an id and classes, as in `div#main.wide.dark`.
	#[must_use]
	pub fn element(sel: impl Into<String>) -> Self {
		Self::new(Some(sel.into()), Content::Empty)
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::new(None, Content::Text(text.into()))
	}

	#[must_use]
	pub fn comment(text: impl Into<String>) -> Self {
		Self::new(Some(COMMENT.to_owned()), Content::Text(text.into()))
	}

	/// The placeholder passed as first argument to `create` hooks.
	pub(crate) fn empty() -> Self {
		Self::new(Some(String::new()), Content::Children(Vec::new()))
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: impl IntoIterator<Item = VNode<H>>) -> Self {
		self.content = Content::Children(children.into_iter().collect());
		self
	}

	#[must_use]
	pub fn with_text(mut self, text: impl Into<String>) -> Self {
		self.content = Content::Text(text.into());
		self
	}

	#[must_use]
	pub fn with_ns(mut self, ns: impl Into<String>) -> Self {
		self.data.ns = Some(ns.into());
		self
	}

	#[must_use]
	pub fn with_hooks(mut self, hooks: Hooks<H>) -> Self {
		self.data.hook = hooks;
		self
	}

	#[must_use]
	pub fn with_ext<T: Any>(mut self, name: &'static str, value: T) -> Self {
		self.data.set_ext(name, value);
		self
	}

	/// Whether `self` and `other` represent the same logical node, which is the case iff key and selector both match.
	///
	/// Content and data are not considered.
	#[must_use]
	pub fn is_same(&self, other: &Self) -> bool {
		self.key == other.key && self.sel == other.sel
	}

	#[must_use]
	pub fn is_comment(&self) -> bool {
		self.sel.as_deref() == Some(COMMENT)
	}

	/// Plain text nodes have no selector.
	#[must_use]
	pub fn is_text_node(&self) -> bool {
		self.sel.is_none()
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match &self.content {
			Content::Text(text) => Some(text),
			Content::Empty | Content::Children(_) => None,
		}
	}

	#[must_use]
	pub fn as_children(&self) -> Option<&[VNode<H>]> {
		match &self.content {
			Content::Children(children) => Some(children),
			Content::Empty | Content::Text(_) => None,
		}
	}

	/// Checks sibling key uniqueness and nesting depth for the whole subtree.
	pub(crate) fn validate<E>(&self, depth_limit: usize) -> Result<(), PatchError<E>> {
		if depth_limit == 0 {
			return Err(PatchError::DepthLimit);
		}
		if let Content::Children(children) = &self.content {
			let mut keys = HashSet::with_capacity(children.len());
			for child in children {
				if let Some(key) = &child.key {
					if !keys.insert(key) {
						return Err(PatchError::DuplicateKey {
							key: key.clone(),
							parent: self.sel.clone(),
						});
					}
				}
				child.validate(depth_limit - 1)?;
			}
		}
		Ok(())
	}
}

/// The parts of an element selector: `tag#id.class1.class2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selector<'a> {
	pub tag: &'a str,
	pub id: Option<&'a str>,
	/// Dot-separated.
	pub classes: Option<&'a str>,
}

impl<'a> Selector<'a> {
	/// Splits at the first `#` and the first `.` after it.
	pub fn parse(sel: &'a str) -> Self {
		let hash = sel.find('#');
		let from = hash.unwrap_or(0);
		let dot = sel[from..].find('.').map(|dot| dot + from);

		let tag_end = hash.or(dot).unwrap_or_else(|| sel.len());
		Self {
			tag: &sel[..tag_end],
			id: hash.map(|hash| &sel[hash + 1..dot.unwrap_or_else(|| sel.len())]).filter(|id| !id.is_empty()),
			classes: dot.map(|dot| &sel[dot + 1..]).filter(|classes| !classes.is_empty()),
		}
	}

	/// The value of the `class` attribute this selector implies.
	pub fn class_attribute(&self) -> Option<String> {
		self.classes.map(|classes| classes.split('.').filter(|class| !class.is_empty()).collect::<Vec<_>>().join(" "))
	}

	/// Rebuilds a selector from a live element's tag, id and `class` attribute.
	pub fn compose(tag: &str, id: Option<&str>, class_name: Option<&str>) -> String {
		let mut sel = tag.to_lowercase();
		if let Some(id) = id.filter(|id| !id.is_empty()) {
			sel.push('#');
			sel.push_str(id);
		}
		for class in class_name.into_iter().flat_map(str::split_whitespace) {
			sel.push('.');
			sel.push_str(class);
		}
		sel
	}
}
