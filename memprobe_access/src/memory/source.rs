use thiserror::Error;

use crate::{common::Address, memory::region::MemoryRegion};

#[derive(Debug, Error)]
pub enum EnumerateError {
	#[error("could not read the memory map source")]
	Io(#[from] std::io::Error),
	#[error("platform specific error: {0}")]
	Platform(Box<dyn std::error::Error + Send + Sync>)
}

#[derive(Debug, Error)]
pub enum ReadError {
	#[error("could not perform memory read")]
	Io(#[from] std::io::Error),
	#[error("read range extends past the end of its region")]
	RegionBounds
}

/// Platform strategy behind a memory context: region enumeration plus raw byte reads.
///
/// Reads are plain blocking OS calls with no synchronization against the target,
/// so the returned bytes may be observed mid-mutation (torn reads). Callers that
/// care must verify the content, not the read.
pub trait MemorySource {
	/// Enumerate the target's mapped regions, in the order the OS reports them.
	///
	/// With `heap_only` set the result is restricted to the heap pseudo-mapping.
	/// Zero regions is a legitimate result, not an error.
	fn enumerate_regions(&mut self, heap_only: bool) -> Result<Vec<MemoryRegion>, EnumerateError>;

	/// Read exactly `buffer.len()` bytes of target memory starting at `address`.
	fn read_bytes(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), ReadError>;
}
