use crate::vnode::Key;

/// Why a patch pass was rejected or aborted.
///
/// Validation errors are reported before the render target is touched.
/// A [`PatchError::Target`] aborts the pass midway and leaves the render target partially patched,
/// so the render cycle that produced it should be considered lost.
#[derive(Debug, thiserror::Error)]
pub enum PatchError<E> {
	/// A render target operation failed.
	#[error("render target operation failed: {0:?}")]
	Target(E),

	#[error("duplicate key {key} among the children of {parent:?}")]
	DuplicateKey { key: Key, parent: Option<String> },

	/// A node that should have been realized has no handle.
	#[error("node has no render target handle; was it realized?")]
	Unrealized,

	#[error("depth limit reached")]
	DepthLimit,
}
