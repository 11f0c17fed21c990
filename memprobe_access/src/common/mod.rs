//! Common definitions used across this library.

use std::convert::TryFrom;
use std::num::NonZeroUsize;

/// Type representing an absolute address in the target's address space.
///
/// This is basically the native pointer type, and we also assume it cannot be null.
/// End-of-scan is therefore an explicit state elsewhere, never a reserved address value.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[repr(transparent)]
pub struct Address(NonZeroUsize);
impl Address {
	pub fn new(address: usize) -> Option<Self> {
		NonZeroUsize::new(address).map(Address)
	}

	pub fn new_unwrap(address: usize) -> Self {
		Self::new(address).expect("address cannot be zero because it represents a valid pointer")
	}

	pub const fn get(&self) -> usize {
		self.0.get()
	}

	pub const fn saturating_add(&self, rhs: usize) -> Address {
		// Safe because we use saturating addition on one positive and one non-negative number
		let value = unsafe { NonZeroUsize::new_unchecked(self.0.get().saturating_add(rhs)) };

		Address(value)
	}
}
impl TryFrom<usize> for Address {
	type Error = std::num::TryFromIntError;

	fn try_from(value: usize) -> Result<Self, Self::Error> {
		Ok(Address::from(NonZeroUsize::try_from(value)?))
	}
}
impl From<NonZeroUsize> for Address {
	fn from(address: NonZeroUsize) -> Self {
		Address(address)
	}
}
impl std::fmt::Display for Address {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{:x}", self.get())
	}
}
