#![doc(html_root_url = "https://docs.rs/twig-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(all(doctest, feature = "web"))]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod diff;
pub mod dom_api;
mod error;
pub mod hooks;
pub mod load;
pub mod removal;
pub mod vnode;
#[cfg(feature = "web")]
pub mod web;

pub use diff::{init, OldRoot, Options, Patcher};
pub use dom_api::{DomApi, NodeKind};
pub use error::PatchError;
pub use hooks::{HookKind, Hooks, Module};
pub use removal::RemovalToken;
pub use vnode::{Content, Key, VNode};
