//! Deferred removal: a node leaves its render target parent only once every `remove` observer has signalled completion.

use core::{cell::Cell, fmt};
use std::{cell::RefCell, rc::Rc};

struct Countdown {
	remaining: Cell<usize>,
	finish: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// One outstanding confirmation that a node may now be removed.
///
/// Each `remove` observer receives exactly one token. Fulfil it with [`RemovalToken::done`], possibly much later
/// (for example after an exit transition). The node is detached when the last token of its removal is fulfilled.
///
/// Dropping a token without calling [`done`](`RemovalToken::done`) keeps the node attached forever.
#[must_use = "The node is only removed once every token has been fulfilled."]
pub struct RemovalToken {
	countdown: Rc<Countdown>,
}

impl RemovalToken {
	/// Creates `listeners` tokens that together gate `finish`, which runs exactly once, when the last of them is fulfilled.
	pub(crate) fn split(listeners: usize, finish: impl 'static + FnOnce()) -> Vec<Self> {
		debug_assert!(listeners > 0);
		let countdown = Rc::new(Countdown {
			remaining: Cell::new(listeners),
			finish: RefCell::new(Some(Box::new(finish))),
		});
		(0..listeners)
			.map(|_| Self {
				countdown: Rc::clone(&countdown),
			})
			.collect()
	}

	/// Signals that this observer is done with the node.
	pub fn done(self) {
		let remaining = self.countdown.remaining.get() - 1;
		self.countdown.remaining.set(remaining);
		if remaining == 0 {
			let finish = self.countdown.finish.borrow_mut().take();
			if let Some(finish) = finish {
				finish()
			}
		}
	}

	/// How many tokens of this removal, including this one, are still unfulfilled.
	#[must_use]
	pub fn remaining(&self) -> usize {
		self.countdown.remaining.get()
	}
}

impl fmt::Debug for RemovalToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RemovalToken").field("remaining", &self.remaining()).finish()
	}
}
