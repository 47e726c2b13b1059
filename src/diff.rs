use crate::{
	dom_api::DomApi,
	error::PatchError,
	hooks::{HookKind, Module, Registry},
	removal::RemovalToken,
	vnode::{Content, Key, Selector, VNode},
};
use core::{cell::Cell, fmt, ops::Range};
use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, error, instrument, trace, trace_span, warn};

type PatchResult<A, T = ()> = Result<T, PatchError<<A as DomApi>::Error>>;

/// Tunables of a [`Patcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// Maximum nesting depth of a patched tree, counting the root as 1.
	pub depth_limit: usize,
	/// Whether to reject new trees with duplicate sibling keys before touching the render target.
	///
	/// Reconciliation of lists with duplicate keys is unspecified, so only turn this off for trusted input.
	pub validate: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			depth_limit: 1024,
			validate: true,
		}
	}
}

/// What a patch pass starts from.
#[derive(Debug)]
pub enum OldRoot<H> {
	/// The tree returned by the previous pass.
	Node(VNode<H>),
	/// A live render target node to take over, for example an empty container on first render.
	///
	/// Only the node itself is adopted. Existing children are left alone. See [`load_node`](`crate::load::load_node`) to adopt them too.
	Handle(H),
}

impl<H> From<VNode<H>> for OldRoot<H> {
	fn from(node: VNode<H>) -> Self {
		Self::Node(node)
	}
}

/// Reconciles node trees against a render target, running [`Module`]s and per-node hooks along the way.
///
/// # Correct Use
///
/// Each pass must be given the tree returned by the previous one (or a live handle to adopt) as old root.
/// Passes are synchronous and cannot overlap. Only deferred removals outlive the pass that started them.
pub struct Patcher<A: DomApi> {
	api: Rc<A>,
	modules: Registry<A::Handle>,
	options: Options,
	empty: VNode<A::Handle>,
	pending_removals: Rc<Cell<usize>>,
}

/// Creates a [`Patcher`] with default [`Options`].
pub fn init<A: DomApi + 'static>(modules: impl IntoIterator<Item = Module<A::Handle>>, api: A) -> Patcher<A> {
	Patcher::new(modules, api)
}

/// State of one patch pass.
#[derive(Debug, Default)]
struct Pass {
	/// Position of the current node as child indices from the new root.
	path: Vec<usize>,
	/// Paths of realized nodes with a pending `insert` hook, in realization order.
	inserted: Vec<Box<[usize]>>,
}

impl Pass {
	fn descend<T>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> T) -> T {
		self.path.push(index);
		let result = f(self);
		self.path.pop();
		result
	}
}

impl<A: DomApi + 'static> Patcher<A> {
	#[must_use]
	pub fn new(modules: impl IntoIterator<Item = Module<A::Handle>>, api: A) -> Self {
		Self::with_options(modules, api, Options::default())
	}

	#[must_use]
	#[instrument(skip(modules, api))]
	pub fn with_options(modules: impl IntoIterator<Item = Module<A::Handle>>, api: A, options: Options) -> Self {
		let modules = Registry::new(modules);
		debug!(modules = ?modules, "Registered modules.");
		Self {
			api: Rc::new(api),
			modules,
			options,
			empty: VNode::empty(),
			pending_removals: Rc::new(Cell::new(0)),
		}
	}

	#[must_use]
	pub fn api(&self) -> &A {
		&self.api
	}

	#[must_use]
	pub fn options(&self) -> Options {
		self.options
	}

	/// How many removed nodes are still attached because some `remove` observer hasn't fulfilled its token yet.
	#[must_use]
	pub fn pending_removals(&self) -> usize {
		self.pending_removals.get()
	}

	/// Transforms the render target from `old`'s shape into `new`'s and returns `new`, now realized,
	/// to be used as old root of the next pass.
	///
	/// If the roots are not the same logical node (by key and selector), `new` is realized from scratch,
	/// inserted after the old root and the old root is removed.
	///
	/// # Errors
	///
	/// Validation errors are returned before any hook runs or the render target is touched.
	/// Render target failures abort the pass midway. See [`PatchError`].
	#[instrument(skip_all, fields(new = ?new.sel))]
	pub fn patch(&mut self, old: impl Into<OldRoot<A::Handle>>, mut new: VNode<A::Handle>) -> PatchResult<A, VNode<A::Handle>> {
		if self.options.validate {
			new.validate::<A::Error>(self.options.depth_limit)?;
		}

		for pre in &self.modules.pre {
			pre()
		}

		let old = match old.into() {
			OldRoot::Node(node) => node,
			OldRoot::Handle(handle) => self.adopt(handle),
		};

		let mut pass = Pass::default();
		if old.is_same(&new) {
			self.patch_node(&old, &mut new, &mut pass)?;
		} else {
			let span = trace_span!("Replacing root", old = ?old.sel);
			let _enter = span.enter();

			let old_handle = Self::bound(&old)?.clone();
			let parent = self.api.parent_node(&old_handle);
			let handle = self.realize(&mut new, &mut pass)?;
			match parent {
				Some(parent) => {
					let next_sibling = self.api.next_sibling(&old_handle);
					self.api.insert_before(&parent, &handle, next_sibling.as_ref()).map_err(PatchError::Target)?;
					self.remove_nodes(&parent, Some(&old))?;
				}
				None => debug!("The old root has no parent. The new root is left detached."),
			}
		}

		let inserted = pass.inserted.len();
		for path in pass.inserted {
			match resolve(&new, &path) {
				Some(node) => {
					if let Some(insert) = &node.data.hook.insert {
						insert(node)
					}
				}
				None => error!(path = ?path, "Node queued for `insert` is missing from the new tree."),
			}
		}

		for post in &self.modules.post {
			post()
		}

		debug!(inserted = inserted, pending_removals = self.pending_removals.get(), "Patched.");
		Ok(new)
	}

	fn bound(node: &VNode<A::Handle>) -> PatchResult<A, &A::Handle> {
		node.handle.as_ref().ok_or(PatchError::Unrealized)
	}

	/// Synthesizes an empty descriptor with the node's current tag, id and classes.
	fn adopt(&self, handle: A::Handle) -> VNode<A::Handle> {
		let sel = Selector::compose(
			&self.api.tag_name(&handle),
			self.api.element_id(&handle).as_deref(),
			self.api.class_name(&handle).as_deref(),
		);
		trace!(sel = %sel, "Adopting live node.");
		let mut node = VNode::element(sel).with_children(Vec::new());
		node.handle = Some(handle);
		node
	}

	/// Creates render target nodes for `node` and its descendants, bottom-up, without attaching `node` itself.
	fn realize(&self, node: &mut VNode<A::Handle>, pass: &mut Pass) -> PatchResult<A, A::Handle> {
		if pass.path.len() >= self.options.depth_limit {
			return Err(PatchError::DepthLimit);
		}

		if let Some(init) = node.data.hook.init.clone() {
			init(node);
		}

		let handle = if node.is_comment() {
			if let Content::Empty = node.content {
				node.content = Content::Text(String::new());
			}
			let text = node.as_text().unwrap_or_default();
			trace!(text = ?Redacted(text), "Creating comment.");
			self.api.create_comment(text)
		} else if let Some(sel) = &node.sel {
			let selector = Selector::parse(sel);
			trace!(tag = selector.tag, ns = ?node.data.ns, "Creating element.");
			let handle = self.api.create_element(selector.tag, node.data.ns.as_deref()).map_err(PatchError::Target)?;
			if let Some(id) = selector.id {
				self.api.set_attribute(&handle, "id", id).map_err(PatchError::Target)?;
			}
			if let Some(class) = selector.class_attribute() {
				self.api.set_attribute(&handle, "class", &class).map_err(PatchError::Target)?;
			}
			node.handle = Some(handle.clone());

			for create in &self.modules.create {
				create(&self.empty, node)
			}

			match &mut node.content {
				Content::Children(children) => {
					for (index, child) in children.iter_mut().enumerate() {
						let child_handle = pass.descend(index, |pass| self.realize(child, pass))?;
						self.api.append_child(&handle, &child_handle).map_err(PatchError::Target)?;
					}
				}
				Content::Text(text) => {
					trace!(text = ?Redacted(text), "Creating element text.");
					let text_handle = self.api.create_text_node(text);
					self.api.append_child(&handle, &text_handle).map_err(PatchError::Target)?;
				}
				Content::Empty => (),
			}

			if let Some(create) = &node.data.hook.create {
				create(&self.empty, node)
			}
			if node.data.hook.insert.is_some() {
				pass.inserted.push(pass.path.clone().into_boxed_slice());
			}
			handle
		} else {
			let text = node.as_text().unwrap_or_default();
			trace!(text = ?Redacted(text), "Creating text node.");
			self.api.create_text_node(text)
		};

		node.handle = Some(handle.clone());
		Ok(handle)
	}

	/// Realizes `nodes[range]` and inserts them in order in front of `before`, or at the end of `parent`.
	fn add_nodes(&self, parent: &A::Handle, before: Option<&A::Handle>, nodes: &mut [VNode<A::Handle>], range: Range<usize>, pass: &mut Pass) -> PatchResult<A> {
		for index in range {
			let handle = pass.descend(index, |pass| self.realize(&mut nodes[index], pass))?;
			self.api.insert_before(parent, &handle, before).map_err(PatchError::Target)?;
		}
		Ok(())
	}

	/// Runs `destroy` hooks for a whole subtree, node before descendants. Text nodes are skipped.
	fn notify_destroy(&self, node: &VNode<A::Handle>) {
		if node.is_text_node() {
			return;
		}
		if let Some(destroy) = &node.data.hook.destroy {
			destroy(node)
		}
		for destroy in &self.modules.destroy {
			destroy(node)
		}
		if let Content::Children(children) = &node.content {
			for child in children {
				self.notify_destroy(child)
			}
		}
	}

	/// Removes `nodes` from `parent`.
	///
	/// Text nodes are detached immediately. Other nodes are destroyed first, then detached once all `remove` observers
	/// (each registered module plus the node's own hook, or an implicit immediate one) have fulfilled their tokens.
	fn remove_nodes<'a>(&self, parent: &A::Handle, nodes: impl IntoIterator<Item = &'a VNode<A::Handle>>) -> PatchResult<A>
	where
		A::Handle: 'a,
	{
		for node in nodes {
			let handle = Self::bound(node)?.clone();
			if node.is_text_node() {
				trace!("Removing text node.");
				self.api.remove_child(parent, &handle).map_err(PatchError::Target)?;
				continue;
			}

			let span = trace_span!("Removing", sel = ?node.sel, key = ?node.key);
			let _enter = span.enter();

			self.notify_destroy(node);

			// Failures are reported to this pass if the removal completes synchronously and logged otherwise.
			let failure: Rc<RefCell<Option<A::Error>>> = Rc::new(RefCell::new(None));
			let finish = {
				let api = Rc::clone(&self.api);
				let pending_removals = Rc::clone(&self.pending_removals);
				let failure = Rc::downgrade(&failure);
				move || {
					pending_removals.set(pending_removals.get() - 1);
					let parent = match api.parent_node(&handle) {
						Some(parent) => parent,
						None => return warn!("Removed node has no parent anymore. Ignoring."),
					};
					if let Err(error) = api.remove_child(&parent, &handle) {
						match failure.upgrade() {
							Some(failure) => *failure.borrow_mut() = Some(error),
							None => error!("Failed to remove the node: {:?}", error),
						}
					}
				}
			};

			self.pending_removals.set(self.pending_removals.get() + 1);
			let listeners = self.modules.count(HookKind::Remove) + 1;
			let mut tokens = RemovalToken::split(listeners, finish).into_iter();
			for (remove, token) in self.modules.remove.iter().zip(&mut tokens) {
				remove(node, token)
			}
			if let Some(token) = tokens.next() {
				match &node.data.hook.remove {
					Some(remove) => remove(node, token),
					None => token.done(),
				}
			}

			let failed = failure.borrow_mut().take();
			if let Some(error) = failed {
				return Err(PatchError::Target(error));
			}
		}
		Ok(())
	}

	/// Reconciles two sibling lists under `parent`.
	///
	/// Both ends of both lists are compared first, which covers unchanged lists, appends, prepends,
	/// truncations and single moves to either end without any lookup. Only when all four comparisons fail
	/// is a key index over the remaining old nodes built, once per call.
	#[instrument(skip_all, fields(old = old_ch.len(), new = new_ch.len()))]
	fn reconcile_children(&self, parent: &A::Handle, old_ch: &[VNode<A::Handle>], new_ch: &mut [VNode<A::Handle>], pass: &mut Pass) -> PatchResult<A> {
		// Old nodes already matched or removed by the keyed fallback.
		let mut consumed = vec![false; old_ch.len()];
		let mut key_index: Option<HashMap<&Key, usize>> = None;

		let (mut old_start, mut old_end) = (0, old_ch.len());
		let (mut new_start, mut new_end) = (0, new_ch.len());

		while old_start < old_end && new_start < new_end {
			if consumed[old_start] {
				old_start += 1;
				continue;
			}
			if consumed[old_end - 1] {
				old_end -= 1;
				continue;
			}

			let old_first = &old_ch[old_start];
			let old_last = &old_ch[old_end - 1];

			if old_first.is_same(&new_ch[new_start]) {
				self.patch_child(old_first, new_ch, new_start, pass)?;
				old_start += 1;
				new_start += 1;
			} else if old_last.is_same(&new_ch[new_end - 1]) {
				self.patch_child(old_last, new_ch, new_end - 1, pass)?;
				old_end -= 1;
				new_end -= 1;
			} else if old_first.is_same(&new_ch[new_end - 1]) {
				trace!(from = old_start, to = new_end - 1, "Moved right.");
				self.patch_child(old_first, new_ch, new_end - 1, pass)?;
				let next_sibling = self.api.next_sibling(Self::bound(old_last)?);
				self.api.insert_before(parent, Self::bound(old_first)?, next_sibling.as_ref()).map_err(PatchError::Target)?;
				old_start += 1;
				new_end -= 1;
			} else if old_last.is_same(&new_ch[new_start]) {
				trace!(from = old_end - 1, to = new_start, "Moved left.");
				self.patch_child(old_last, new_ch, new_start, pass)?;
				self.api.insert_before(parent, Self::bound(old_last)?, Some(Self::bound(old_first)?)).map_err(PatchError::Target)?;
				old_end -= 1;
				new_start += 1;
			} else {
				let keys = key_index.get_or_insert_with(|| key_to_index(old_ch, old_start..old_end));
				let anchor = Self::bound(old_first)?;
				let found = new_ch[new_start]
					.key
					.as_ref()
					.and_then(|key| keys.get(key).copied())
					.filter(|&index| (old_start..old_end).contains(&index) && !consumed[index]);

				match found {
					Some(index) if old_ch[index].sel == new_ch[new_start].sel => {
						trace!(from = index, to = new_start, "Moved keyed.");
						let old = &old_ch[index];
						self.patch_child(old, new_ch, new_start, pass)?;
						consumed[index] = true;
						self.api.insert_before(parent, Self::bound(old)?, Some(anchor)).map_err(PatchError::Target)?;
					}
					stale => {
						trace!(index = new_start, "Inserting new.");
						let handle = pass.descend(new_start, |pass| self.realize(&mut new_ch[new_start], pass))?;
						self.api.insert_before(parent, &handle, Some(anchor)).map_err(PatchError::Target)?;

						// Same key, different selector.
						if let Some(index) = stale {
							trace!(index = index, "Removing node whose key now names another element.");
							consumed[index] = true;
							self.remove_nodes(parent, Some(&old_ch[index]))?;
						}
					}
				}
				new_start += 1;
			}
		}

		if old_start >= old_end {
			let before = new_ch.get(new_end).and_then(|node| node.handle.clone());
			trace!(count = new_end.saturating_sub(new_start), "Inserting remaining new nodes.");
			self.add_nodes(parent, before.as_ref(), new_ch, new_start..new_end, pass)?;
		} else if new_start >= new_end {
			trace!(count = old_end - old_start, "Removing remaining old nodes.");
			let remaining = (old_start..old_end).filter(|&index| !consumed[index]).map(|index| &old_ch[index]);
			self.remove_nodes(parent, remaining)?;
		}
		Ok(())
	}

	fn patch_child(&self, old: &VNode<A::Handle>, new_ch: &mut [VNode<A::Handle>], index: usize, pass: &mut Pass) -> PatchResult<A> {
		pass.descend(index, |pass| self.patch_node(old, &mut new_ch[index], pass))
	}

	/// Updates `old`'s render target node to match `new`, which must be the same logical node.
	fn patch_node(&self, old: &VNode<A::Handle>, new: &mut VNode<A::Handle>, pass: &mut Pass) -> PatchResult<A> {
		if pass.path.len() >= self.options.depth_limit {
			return Err(PatchError::DepthLimit);
		}

		if let Some(prepatch) = &new.data.hook.prepatch {
			prepatch(old, new)
		}

		let handle = Self::bound(old)?.clone();
		new.handle = Some(handle.clone());

		if !new.is_text_node() {
			for update in &self.modules.update {
				update(old, new)
			}
			if let Some(update) = &new.data.hook.update {
				update(old, new)
			}
		}

		match (&old.content, &mut new.content) {
			(_, Content::Text(text)) => {
				if old.as_text() != Some(text.as_str()) {
					if let Content::Children(old_ch) = &old.content {
						self.remove_nodes(&handle, old_ch)?;
					}
					trace!(text = ?Redacted(text), "Setting text.");
					self.api.set_text_content(&handle, text);
				}
			}
			(Content::Children(old_ch), Content::Children(new_ch)) => self.reconcile_children(&handle, old_ch, new_ch, pass)?,
			(old_content, Content::Children(new_ch)) => {
				if let Content::Text(_) = old_content {
					self.api.set_text_content(&handle, "");
				}
				let len = new_ch.len();
				self.add_nodes(&handle, None, new_ch, 0..len, pass)?;
			}
			(Content::Children(old_ch), Content::Empty) => self.remove_nodes(&handle, old_ch)?,
			(Content::Text(_), Content::Empty) => self.api.set_text_content(&handle, ""),
			(Content::Empty, Content::Empty) => (),
		}

		if let Some(postpatch) = &new.data.hook.postpatch {
			postpatch(old, new)
		}
		Ok(())
	}
}

impl<A: DomApi> fmt::Debug for Patcher<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Patcher")
			.field("modules", &self.modules)
			.field("options", &self.options)
			.field("pending_removals", &self.pending_removals.get())
			.finish()
	}
}

fn resolve<'a, H>(root: &'a VNode<H>, path: &[usize]) -> Option<&'a VNode<H>> {
	path.iter().try_fold(root, |node, &index| node.as_children()?.get(index))
}

fn key_to_index<H>(children: &[VNode<H>], range: Range<usize>) -> HashMap<&Key, usize> {
	children[range.clone()]
		.iter()
		.zip(range)
		.filter_map(|(child, index)| Some((child.key.as_ref()?, index)))
		.collect()
}

/// Text content, logged only with the `dangerous-logging` feature.
struct Redacted<'a>(&'a str);

impl fmt::Debug for Redacted<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			fmt::Debug::fmt(self.0, f)
		} else {
			write!(f, "<{} bytes>", self.0.len())
		}
	}
}
