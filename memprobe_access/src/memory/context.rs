use crate::{
	common::Address,
	memory::{
		region::MemoryRegion,
		source::{EnumerateError, MemorySource, ReadError}
	}
};

/// Read-only projection of a target's mapped address space.
///
/// Verifiers receive this view so they can run region lookups without access
/// to the reading machinery.
pub trait AddressSpace {
	/// Ordered region sequence as last enumerated.
	fn regions(&self) -> &[MemoryRegion];

	/// First region whose half-open range contains `address`.
	fn containing_region(&self, address: Address) -> Option<&MemoryRegion> {
		self.regions().iter().find(|region| region.contains(address))
	}

	/// Whether `address` falls inside any mapped region.
	///
	/// A candidate pointer field that lands inside a mapped region rarely does
	/// so by coincidence, which makes this a cheap verification building block.
	fn contains_address(&self, address: Address) -> bool {
		self.containing_region(address).is_some()
	}
}
impl AddressSpace for Vec<MemoryRegion> {
	fn regions(&self) -> &[MemoryRegion] {
		self
	}
}

struct CachedRegion {
	region: MemoryRegion,
	bytes: Vec<u8>
}

/// Owns a target's region sequence and a single-slot region read cache.
///
/// The cache holds the full contents of the most recently touched region, so
/// that contiguous scanning costs one OS-level read per region instead of one
/// per candidate window.
///
/// [`refresh`](MemoryContext::refresh) is the only mutation path for the
/// region sequence; it replaces the sequence wholesale and empties the cache.
pub struct MemoryContext<S: MemorySource> {
	source: S,
	heap_only: bool,
	regions: Vec<MemoryRegion>,
	cache: Option<CachedRegion>
}
impl<S: MemorySource> MemoryContext<S> {
	/// Creates a context bound to `source` and enumerates its regions once.
	///
	/// With `heap_only` set the region sequence is restricted to the heap
	/// pseudo-mapping. Enumeration failure here means no usable context can
	/// be produced.
	pub fn new(mut source: S, heap_only: bool) -> Result<Self, EnumerateError> {
		let regions = source.enumerate_regions(heap_only)?;

		Ok(MemoryContext {
			source,
			heap_only,
			regions,
			cache: None
		})
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	pub const fn heap_only(&self) -> bool {
		self.heap_only
	}

	/// Current region sequence, in the order the OS reported it.
	pub fn mapped_regions(&self) -> &[MemoryRegion] {
		&self.regions
	}

	/// Position of the first region containing `address`.
	///
	/// Absence is an expected outcome used to fall back to uncached direct
	/// reads, not an error.
	pub fn region_containing(&self, address: Address) -> Option<usize> {
		self.regions.iter().position(|region| region.contains(address))
	}

	/// Re-enumerates regions from the OS and empties the cache slot.
	///
	/// This invalidates any position another caller may hold into the old
	/// region sequence, so it must only run between scans.
	pub fn refresh(&mut self) -> Result<(), EnumerateError> {
		self.regions.clear();
		self.cache = None;

		self.regions = self.source.enumerate_regions(self.heap_only)?;

		Ok(())
	}

	/// Read `buffer.len()` bytes starting at `address`.
	///
	/// Addresses inside a known region are served through the region cache.
	/// Addresses outside every known region are attempted directly against
	/// the source, uncached and without bounds validation.
	pub fn read(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), ReadError> {
		match self.region_containing(address) {
			None => self.source.read_bytes(address, buffer),
			Some(index) => self.read_in_region(address, buffer, index)
		}
	}

	/// Read variant taking the caller's region position instead of searching.
	///
	/// `address` must lie inside the region at `region_index`. If the cache
	/// does not already hold a region containing `address`, the entire region
	/// is read into the cache slot first; a failed fill empties the slot and
	/// fails the read, which callers treat as "skip this region". A sub-range
	/// running past the region's end fails with
	/// [`ReadError::RegionBounds`](crate::memory::source::ReadError).
	pub fn read_in_region(
		&mut self,
		address: Address,
		buffer: &mut [u8],
		region_index: usize
	) -> Result<(), ReadError> {
		debug_assert!(self.regions[region_index].contains(address));

		if let Some(cached) = self.cache.as_ref() {
			if cached.region.contains(address) {
				return Self::copy_from_cache(cached, address, buffer)
			}
		}

		let region = self.regions[region_index].clone();
		let mut bytes = vec![0u8; region.size()];
		if let Err(err) = self.source.read_bytes(region.start(), &mut bytes) {
			// the region may have shrunk or vanished since enumeration
			self.cache = None;
			return Err(err)
		}

		let cached = self.cache.insert(CachedRegion { region, bytes });
		Self::copy_from_cache(cached, address, buffer)
	}

	fn copy_from_cache(
		cached: &CachedRegion,
		address: Address,
		buffer: &mut [u8]
	) -> Result<(), ReadError> {
		let offset = address.get() - cached.region.start().get();
		let end = offset + buffer.len();
		if end > cached.bytes.len() {
			return Err(ReadError::RegionBounds)
		}

		buffer.copy_from_slice(&cached.bytes[offset .. end]);

		Ok(())
	}
}
impl<S: MemorySource> AddressSpace for MemoryContext<S> {
	fn regions(&self) -> &[MemoryRegion] {
		&self.regions
	}
}
