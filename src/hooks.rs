//! Lifecycle callbacks, either registered globally as [`Module`]s or attached to a single node as [`Hooks`].
//!
//! Both surfaces share the callback types below and the [`HookKind`] enumeration,
//! so a hook has the same signature whether a module or a node provides it.

use crate::{removal::RemovalToken, vnode::VNode};
use core::fmt;
use std::rc::Rc;

/// Takes no arguments. Runs at the start (`pre`) or end (`post`) of each patch pass.
pub type PassHook = Rc<dyn Fn()>;
/// Runs before realization and may modify the node.
pub type InitHook<H> = Rc<dyn Fn(&mut VNode<H>)>;
/// Receives one node: `insert` and `destroy`.
pub type NodeHook<H> = Rc<dyn Fn(&VNode<H>)>;
/// Receives two nodes: `create` (placeholder, node) and `prepatch`/`update`/`postpatch` (old, new).
pub type PairHook<H> = Rc<dyn Fn(&VNode<H>, &VNode<H>)>;
/// Receives the node being removed and one completion token, which must be fulfilled for the removal to finish.
pub type RemoveHook<H> = Rc<dyn Fn(&VNode<H>, RemovalToken)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
	Pre,
	Init,
	Create,
	Insert,
	Prepatch,
	Update,
	Postpatch,
	Remove,
	Destroy,
	Post,
}

impl HookKind {
	pub const ALL: [HookKind; 10] = [
		HookKind::Pre,
		HookKind::Init,
		HookKind::Create,
		HookKind::Insert,
		HookKind::Prepatch,
		HookKind::Update,
		HookKind::Postpatch,
		HookKind::Remove,
		HookKind::Destroy,
		HookKind::Post,
	];

	/// Whether a [`Module`] can observe this kind.
	#[must_use]
	pub fn is_module_hook(self) -> bool {
		matches!(
			self,
			HookKind::Pre | HookKind::Create | HookKind::Update | HookKind::Remove | HookKind::Destroy | HookKind::Post
		)
	}

	/// Whether a node's own [`Hooks`] can observe this kind.
	#[must_use]
	pub fn is_node_hook(self) -> bool {
		!matches!(self, HookKind::Pre | HookKind::Post)
	}

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			HookKind::Pre => "pre",
			HookKind::Init => "init",
			HookKind::Create => "create",
			HookKind::Insert => "insert",
			HookKind::Prepatch => "prepatch",
			HookKind::Update => "update",
			HookKind::Postpatch => "postpatch",
			HookKind::Remove => "remove",
			HookKind::Destroy => "destroy",
			HookKind::Post => "post",
		}
	}
}

impl fmt::Display for HookKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A cross-cutting observer of every node's lifecycle, such as an attribute or style module.
///
/// All hooks are optional. Modules of the same kind run in registration order.
pub struct Module<H> {
	pub pre: Option<PassHook>,
	pub create: Option<PairHook<H>>,
	pub update: Option<PairHook<H>>,
	pub remove: Option<RemoveHook<H>>,
	pub destroy: Option<NodeHook<H>>,
	pub post: Option<PassHook>,
}

/// Lifecycle callbacks scoped to one node.
pub struct Hooks<H> {
	pub init: Option<InitHook<H>>,
	pub create: Option<PairHook<H>>,
	pub insert: Option<NodeHook<H>>,
	pub prepatch: Option<PairHook<H>>,
	pub update: Option<PairHook<H>>,
	pub postpatch: Option<PairHook<H>>,
	pub remove: Option<RemoveHook<H>>,
	pub destroy: Option<NodeHook<H>>,
}

impl<H> Default for Module<H> {
	fn default() -> Self {
		Self {
			pre: None,
			create: None,
			update: None,
			remove: None,
			destroy: None,
			post: None,
		}
	}
}

impl<H> Clone for Module<H> {
	fn clone(&self) -> Self {
		Self {
			pre: self.pre.clone(),
			create: self.create.clone(),
			update: self.update.clone(),
			remove: self.remove.clone(),
			destroy: self.destroy.clone(),
			post: self.post.clone(),
		}
	}
}

impl<H> Module<H> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn provides(&self, kind: HookKind) -> bool {
		match kind {
			HookKind::Pre => self.pre.is_some(),
			HookKind::Create => self.create.is_some(),
			HookKind::Update => self.update.is_some(),
			HookKind::Remove => self.remove.is_some(),
			HookKind::Destroy => self.destroy.is_some(),
			HookKind::Post => self.post.is_some(),
			HookKind::Init | HookKind::Insert | HookKind::Prepatch | HookKind::Postpatch => false,
		}
	}

	#[must_use]
	pub fn on_pre(mut self, hook: impl 'static + Fn()) -> Self {
		self.pre = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_create(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.create = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_update(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.update = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_remove(mut self, hook: impl 'static + Fn(&VNode<H>, RemovalToken)) -> Self {
		self.remove = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_destroy(mut self, hook: impl 'static + Fn(&VNode<H>)) -> Self {
		self.destroy = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_post(mut self, hook: impl 'static + Fn()) -> Self {
		self.post = Some(Rc::new(hook));
		self
	}
}

impl<H> Default for Hooks<H> {
	fn default() -> Self {
		Self {
			init: None,
			create: None,
			insert: None,
			prepatch: None,
			update: None,
			postpatch: None,
			remove: None,
			destroy: None,
		}
	}
}

impl<H> Clone for Hooks<H> {
	fn clone(&self) -> Self {
		Self {
			init: self.init.clone(),
			create: self.create.clone(),
			insert: self.insert.clone(),
			prepatch: self.prepatch.clone(),
			update: self.update.clone(),
			postpatch: self.postpatch.clone(),
			remove: self.remove.clone(),
			destroy: self.destroy.clone(),
		}
	}
}

impl<H> Hooks<H> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn provides(&self, kind: HookKind) -> bool {
		match kind {
			HookKind::Init => self.init.is_some(),
			HookKind::Create => self.create.is_some(),
			HookKind::Insert => self.insert.is_some(),
			HookKind::Prepatch => self.prepatch.is_some(),
			HookKind::Update => self.update.is_some(),
			HookKind::Postpatch => self.postpatch.is_some(),
			HookKind::Remove => self.remove.is_some(),
			HookKind::Destroy => self.destroy.is_some(),
			HookKind::Pre | HookKind::Post => false,
		}
	}

	#[must_use]
	pub fn on_init(mut self, hook: impl 'static + Fn(&mut VNode<H>)) -> Self {
		self.init = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_create(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.create = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_insert(mut self, hook: impl 'static + Fn(&VNode<H>)) -> Self {
		self.insert = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_prepatch(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.prepatch = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_update(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.update = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_postpatch(mut self, hook: impl 'static + Fn(&VNode<H>, &VNode<H>)) -> Self {
		self.postpatch = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_remove(mut self, hook: impl 'static + Fn(&VNode<H>, RemovalToken)) -> Self {
		self.remove = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn on_destroy(mut self, hook: impl 'static + Fn(&VNode<H>)) -> Self {
		self.destroy = Some(Rc::new(hook));
		self
	}
}

impl<H> fmt::Debug for Module<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set()
			.entries(HookKind::ALL.iter().filter(|kind| self.provides(**kind)))
			.finish()
	}
}

impl<H> fmt::Debug for Hooks<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set()
			.entries(HookKind::ALL.iter().filter(|kind| self.provides(**kind)))
			.finish()
	}
}

/// Module callbacks bucketed by kind, in registration order.
pub(crate) struct Registry<H> {
	pub pre: Vec<PassHook>,
	pub create: Vec<PairHook<H>>,
	pub update: Vec<PairHook<H>>,
	pub remove: Vec<RemoveHook<H>>,
	pub destroy: Vec<NodeHook<H>>,
	pub post: Vec<PassHook>,
}

impl<H> Registry<H> {
	pub fn new(modules: impl IntoIterator<Item = Module<H>>) -> Self {
		let mut registry = Self {
			pre: Vec::new(),
			create: Vec::new(),
			update: Vec::new(),
			remove: Vec::new(),
			destroy: Vec::new(),
			post: Vec::new(),
		};
		for module in modules {
			registry.pre.extend(module.pre);
			registry.create.extend(module.create);
			registry.update.extend(module.update);
			registry.remove.extend(module.remove);
			registry.destroy.extend(module.destroy);
			registry.post.extend(module.post);
		}
		registry
	}

	pub fn count(&self, kind: HookKind) -> usize {
		match kind {
			HookKind::Pre => self.pre.len(),
			HookKind::Create => self.create.len(),
			HookKind::Update => self.update.len(),
			HookKind::Remove => self.remove.len(),
			HookKind::Destroy => self.destroy.len(),
			HookKind::Post => self.post.len(),
			HookKind::Init | HookKind::Insert | HookKind::Prepatch | HookKind::Postpatch => 0,
		}
	}
}

impl<H> fmt::Debug for Registry<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for kind in HookKind::ALL.iter().filter(|kind| kind.is_module_hook()) {
			map.entry(&kind.name(), &self.count(*kind));
		}
		map.finish()
	}
}
