//! Construction of realized node trees from existing render target content, for example server-rendered HTML.

use crate::{
	dom_api::{DomApi, NodeKind},
	vnode::{Selector, VNode},
};
use core::iter;
use tracing::{instrument, trace};

/// Loads `handle` and its descendants as a realized tree that can be passed as old root to [`Patcher::patch`](`crate::Patcher::patch`).
///
/// Elements become `tag#id.class` selectors without keys. Unlike adopting a bare handle, patching against the loaded tree
/// reuses matching existing children.
///
/// Returns [`None`] for nodes that are neither elements, text nor comments.
#[instrument(skip(api))]
pub fn load_node<A: DomApi>(api: &A, handle: A::Handle) -> Option<VNode<A::Handle>> {
	let mut node = match api.node_kind(&handle) {
		NodeKind::Element => {
			let sel = Selector::compose(
				&api.tag_name(&handle),
				api.element_id(&handle).as_deref(),
				api.class_name(&handle).as_deref(),
			);
			VNode::element(sel).with_children(load_child_nodes(api, &handle))
		}
		NodeKind::Text => VNode::text(api.text_data(&handle).unwrap_or_default()),
		NodeKind::Comment => VNode::comment(api.text_data(&handle).unwrap_or_default()),
		NodeKind::Other => {
			trace!("Skipping unsupported node.");
			return None;
		}
	};
	node.handle = Some(handle);
	Some(node)
}

pub fn load_child_nodes<A: DomApi>(api: &A, parent: &A::Handle) -> Vec<VNode<A::Handle>> {
	iter::successors(api.first_child(parent), |child| api.next_sibling(child))
		.filter_map(|child| load_node(api, child))
		.collect()
}
