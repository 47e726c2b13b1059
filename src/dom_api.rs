//! The capabilities a render target must offer to be patched.

use core::fmt::Debug;

/// Coarse classification of render target nodes, used when loading existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	/// Anything else (processing instructions, document fragments…). Skipped while loading.
	Other,
}

/// A render target such as a browser document, a native widget tree or a terminal buffer.
///
/// Methods take `&self`: Deferred removals call back into the adapter after a pass has ended,
/// so implementations are shared and use interior mutability where they need it.
///
/// Failing operations abort the current pass with [`PatchError::Target`](`crate::PatchError::Target`).
pub trait DomApi {
	/// A cheaply clonable reference to one render target node.
	type Handle: Clone + Debug + 'static;
	type Error: Debug + 'static;

	/// Creates a detached element, in namespace `ns` if one is given.
	fn create_element(&self, tag: &str, ns: Option<&str>) -> Result<Self::Handle, Self::Error>;
	fn create_text_node(&self, text: &str) -> Self::Handle;
	fn create_comment(&self, text: &str) -> Self::Handle;

	/// Inserts or moves `node` into `parent`, in front of `reference` or at the end if that is [`None`].
	fn insert_before(&self, parent: &Self::Handle, node: &Self::Handle, reference: Option<&Self::Handle>) -> Result<(), Self::Error>;
	fn remove_child(&self, parent: &Self::Handle, node: &Self::Handle) -> Result<(), Self::Error>;
	fn append_child(&self, parent: &Self::Handle, node: &Self::Handle) -> Result<(), Self::Error>;

	fn parent_node(&self, node: &Self::Handle) -> Option<Self::Handle>;
	fn next_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;
	fn first_child(&self, node: &Self::Handle) -> Option<Self::Handle>;

	/// Replaces all content of `node` with `text`. An empty `text` clears it.
	fn set_text_content(&self, node: &Self::Handle, text: &str);
	fn set_attribute(&self, element: &Self::Handle, name: &str, value: &str) -> Result<(), Self::Error>;

	fn tag_name(&self, element: &Self::Handle) -> String;
	/// The element's id, if it has a non-empty one.
	fn element_id(&self, element: &Self::Handle) -> Option<String>;
	/// The element's `class` attribute, if any.
	fn class_name(&self, element: &Self::Handle) -> Option<String>;

	fn node_kind(&self, node: &Self::Handle) -> NodeKind;
	/// The character data of a text or comment node.
	fn text_data(&self, node: &Self::Handle) -> Option<String>;
}
