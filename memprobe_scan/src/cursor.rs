use memprobe_access::prelude::{Address, MemoryContext, MemorySource};

use crate::{
	candidate::{read_candidate, FromRawBytes},
	verifier::ScanVerifier
};

/// Observable position of a scanning cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorState {
	/// Advancing through candidate windows; not externally observable for long.
	Scanning,
	/// Holding a candidate window accepted by the verifier.
	Matched,
	/// The region sequence ran out; terminal for single-pass cursors.
	Exhausted
}

/// One window accepted by the verifier.
///
/// `address` is the cursor position at verification time, which lies one
/// alignment stride past the start of the matched window - or at the next
/// region's start when the advance rolled over a region boundary. The bytes
/// are always the window that was actually read and verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
	address: Address,
	bytes: Box<[u8]>
}
impl ScanMatch {
	pub const fn address(&self) -> Address {
		self.address
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Decodes the matched window as `T`.
	///
	/// ## Panics
	/// Panics when `size_of::<T>()` differs from the scanned candidate size.
	pub fn value<T: FromRawBytes>(&self) -> T {
		read_candidate(&self.bytes)
	}
}

/// Walks a context's regions at the candidate type's alignment stride and
/// yields the windows the verifier accepts.
///
/// The cursor borrows its context exclusively, so at most one cursor can
/// drive reads (and, in continuous mode, refreshes) through a context at a
/// time; further cursors can be created sequentially once this one is
/// dropped.
///
/// Construction immediately advances once, so a fresh cursor is already
/// [`Matched`](CursorState::Matched) or [`Exhausted`](CursorState::Exhausted).
pub struct ScanCursor<'a, S: MemorySource> {
	context: &'a mut MemoryContext<S>,
	verifier: &'a dyn ScanVerifier,
	region_index: usize,
	address: usize,
	bytes: Vec<u8>,
	continuous: bool,
	state: CursorState
}
impl<'a, S: MemorySource> ScanCursor<'a, S> {
	/// Creates a single-pass cursor that terminates once the region sequence
	/// is exhausted.
	pub fn scan_once(context: &'a mut MemoryContext<S>, verifier: &'a dyn ScanVerifier) -> Self {
		Self::new(context, verifier, false)
	}

	/// Creates a continuous cursor that refreshes the context and restarts on
	/// exhaustion instead of terminating.
	///
	/// Its match sequence is logically infinite and must be bounded by the
	/// caller, e.g. with a match cap or an external interrupt.
	pub fn scan_forever(context: &'a mut MemoryContext<S>, verifier: &'a dyn ScanVerifier) -> Self {
		Self::new(context, verifier, true)
	}

	fn new(context: &'a mut MemoryContext<S>, verifier: &'a dyn ScanVerifier, continuous: bool) -> Self {
		let size = verifier.type_size();
		debug_assert!(size > 0, "candidate type must have a non-zero size");
		debug_assert!(verifier.type_align() > 0, "candidate type must have a non-zero alignment");

		let mut cursor = ScanCursor {
			context,
			verifier,
			region_index: 0,
			address: 0,
			bytes: vec![0u8; size],
			continuous,
			state: CursorState::Scanning
		};
		cursor.rewind();
		cursor.increment();

		cursor
	}

	pub const fn state(&self) -> CursorState {
		self.state
	}

	pub fn is_exhausted(&self) -> bool {
		self.state == CursorState::Exhausted
	}

	pub const fn continuous(&self) -> bool {
		self.continuous
	}

	fn rewind(&mut self) {
		self.region_index = 0;
		self.address = self
			.context
			.mapped_regions()
			.first()
			.map(|region| region.start().get())
			.unwrap_or(0);
	}

	/// Advances to the next accepted window or a terminal state.
	///
	/// The stride advance happens after a successful read but before the
	/// verifier runs, so the position handed to the verifier (and reported
	/// with a match) trails the window content by one stride; see
	/// [`ScanMatch`].
	fn increment(&mut self) {
		self.state = CursorState::Scanning;

		loop {
			while self.region_index < self.context.mapped_regions().len() {
				let address = Address::new_unwrap(self.address);

				match self.context.read_in_region(address, &mut self.bytes, self.region_index) {
					Err(_) => {
						// unreadable region, skip to the next one
						if !self.enter_next_region() {
							break
						}
					}
					Ok(()) => {
						self.address += self.verifier.type_align();

						let region_end = self.context.mapped_regions()[self.region_index].end().get();
						if self.address >= region_end {
							if !self.enter_next_region() {
								// the final window of the final region is
								// discarded without verification
								break
							}
						}

						self.verifier.before_check();

						let address = Address::new_unwrap(self.address);
						if self.verifier.verify(&*self.context, &self.bytes, address) {
							self.state = CursorState::Matched;
							return
						}
					}
				}
			}

			if !self.continuous {
				self.state = CursorState::Exhausted;
				return
			}

			// A failed refresh leaves the region sequence empty and the loop
			// keeps refreshing; a gone target therefore spins until the
			// caller stops consuming.
			let _ = self.context.refresh();
			self.rewind();
		}
	}

	/// Moves to the start of the next region. Returns `false` when no region remains.
	fn enter_next_region(&mut self) -> bool {
		self.region_index += 1;

		match self.context.mapped_regions().get(self.region_index) {
			None => false,
			Some(region) => {
				self.address = region.start().get();

				true
			}
		}
	}
}
impl<S: MemorySource> Iterator for ScanCursor<'_, S> {
	type Item = ScanMatch;

	fn next(&mut self) -> Option<Self::Item> {
		match self.state {
			CursorState::Matched => {
				let found = ScanMatch {
					address: Address::new_unwrap(self.address),
					bytes: self.bytes.clone().into_boxed_slice()
				};
				self.increment();

				Some(found)
			}
			_ => None
		}
	}
}

#[cfg(test)]
mod test {
	use std::cell::Cell;

	use memprobe_access::prelude::{
		Address, AddressSpace, EnumerateError, MemoryContext, MemoryRegion, MemorySource, ReadError
	};

	use super::{CursorState, ScanCursor};
	use crate::{
		candidate::{read_candidate, FromRawBytes},
		verifier::{value::ValueVerifier, CandidateVerifier}
	};

	fn region(label: &str, start: usize, end: usize) -> MemoryRegion {
		MemoryRegion::new(label, Address::new_unwrap(start), Address::new_unwrap(end)).unwrap()
	}

	/// Canned source over fixed byte segments, optionally swapping in a second
	/// segment set on the next re-enumeration.
	///
	/// `unreadable` ranges are enumerated as regions but every read inside
	/// them fails, standing in for regions that shrank after enumeration.
	struct SnapshotSource {
		segments: Vec<(usize, Vec<u8>)>,
		unreadable: Vec<(usize, usize)>,
		next_segments: Option<Vec<(usize, Vec<u8>)>>,
		enumerations: usize
	}
	impl SnapshotSource {
		fn new(segments: Vec<(usize, Vec<u8>)>) -> Self {
			SnapshotSource {
				segments,
				unreadable: Vec::new(),
				next_segments: None,
				enumerations: 0
			}
		}
	}
	impl MemorySource for SnapshotSource {
		fn enumerate_regions(&mut self, _heap_only: bool) -> Result<Vec<MemoryRegion>, EnumerateError> {
			if self.enumerations > 0 {
				if let Some(next) = self.next_segments.take() {
					self.segments = next;
				}
			}
			self.enumerations += 1;

			let mut ranges: Vec<(usize, usize)> = self
				.segments
				.iter()
				.map(|(start, bytes)| (*start, start + bytes.len()))
				.chain(self.unreadable.iter().map(|(start, size)| (*start, start + size)))
				.collect();
			ranges.sort_unstable();

			Ok(
				ranges
					.into_iter()
					.map(|(start, end)| region("", start, end))
					.collect()
			)
		}

		fn read_bytes(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), ReadError> {
			let segment = self.segments.iter().find(|(start, bytes)| {
				address.get() >= *start && address.get() + buffer.len() <= start + bytes.len()
			});

			match segment {
				None => Err(ReadError::Io(std::io::Error::new(
					std::io::ErrorKind::UnexpectedEof,
					"unmapped address"
				))),
				Some((start, bytes)) => {
					let offset = address.get() - start;
					buffer.copy_from_slice(&bytes[offset .. offset + buffer.len()]);

					Ok(())
				}
			}
		}
	}

	/// Never matches; counts how many times the predicate hook ran.
	struct CountingVerifier {
		checks: Cell<usize>
	}
	impl CountingVerifier {
		fn new() -> Self {
			CountingVerifier {
				checks: Cell::new(0)
			}
		}
	}
	impl CandidateVerifier for CountingVerifier {
		type Candidate = u32;

		fn before_check(&self) {
			self.checks.set(self.checks.get() + 1);
		}

		fn verify(&self, _space: &dyn AddressSpace, _candidate: &u32, _address: Address) -> bool {
			false
		}
	}

	/// Candidate of size 8 with alignment 4.
	#[repr(C)]
	#[derive(Debug, Copy, Clone, PartialEq, Eq)]
	struct TwoWords {
		lo: u32,
		hi: u32
	}
	unsafe impl FromRawBytes for TwoWords {}

	const PATTERN: [u8; 8] = [0xde, 0xad, 0xbe, 0xef, 0xca, 0xfe, 0xba, 0xbe];

	#[test]
	fn test_single_pass_terminates_after_every_position() {
		let mut context = MemoryContext::new(
			SnapshotSource::new(vec![(0x1000, vec![0u8; 16]), (0x2000, vec![0u8; 16])]),
			false
		)
		.unwrap();

		let verifier = CountingVerifier::new();
		let cursor = ScanCursor::scan_once(&mut context, &verifier);

		assert_eq!(cursor.count(), 0);

		// 4 windows per region; the first region's last window is verified at
		// the second region's start, the second region's last window rolls
		// past the end of the sequence and is discarded unverified
		assert_eq!(verifier.checks.get(), 7);
	}

	#[test]
	fn test_empty_context_is_exhausted_immediately() {
		let mut context = MemoryContext::new(SnapshotSource::new(Vec::new()), false).unwrap();

		let verifier = ValueVerifier::new(1u32);
		let mut cursor = ScanCursor::scan_once(&mut context, &verifier);

		assert_eq!(cursor.state(), CursorState::Exhausted);
		assert!(cursor.is_exhausted());
		assert_eq!(cursor.next(), None);
	}

	#[test]
	fn test_match_address_trails_window_by_one_stride() {
		let mut bytes = vec![0u8; 32];
		bytes[8 .. 16].copy_from_slice(&0x1122_3344_5566_7788_u64.to_ne_bytes());

		let mut context =
			MemoryContext::new(SnapshotSource::new(vec![(0x1000, bytes)]), false).unwrap();

		let verifier = ValueVerifier::new(0x1122_3344_5566_7788_u64);
		let mut cursor = ScanCursor::scan_forever(&mut context, &verifier);

		// construction already landed on the match
		assert_eq!(cursor.state(), CursorState::Matched);

		let found = cursor.next().unwrap();
		// the window starts at 0x1008; the reported address is one 8-byte stride later
		assert_eq!(found.address().get(), 0x1010);
		assert_eq!(found.bytes(), &0x1122_3344_5566_7788_u64.to_ne_bytes());
		assert_eq!(found.value::<u64>(), 0x1122_3344_5566_7788);
	}

	#[test]
	fn test_continuous_refreshes_and_resumes() {
		let mut source = SnapshotSource::new(vec![(0x1000, vec![0u8; 16])]);

		let mut matching = vec![0u8; 16];
		matching[.. 4].copy_from_slice(&0xfeed_f00d_u32.to_ne_bytes());
		source.next_segments = Some(vec![(0x3000, matching)]);

		let mut context = MemoryContext::new(source, false).unwrap();

		let verifier = ValueVerifier::new(0xfeed_f00d_u32);
		let mut cursor = ScanCursor::scan_forever(&mut context, &verifier);

		let found = cursor.next().unwrap();
		assert_eq!(found.value::<u32>(), 0xfeed_f00d);
		assert_eq!(found.address().get(), 0x3004);

		// the first pass found nothing and the cursor re-enumerated
		assert_eq!(context.source().enumerations, 2);
	}

	#[test]
	fn test_end_to_end_single_match() {
		let first = vec![0u8; 16];
		let mut second = vec![0u8; 32];
		second[8 .. 16].copy_from_slice(&PATTERN);

		let mut context = MemoryContext::new(
			SnapshotSource::new(vec![(0x1000, first), (0x2000, second)]),
			false
		)
		.unwrap();

		let verifier = ValueVerifier::new(read_candidate::<TwoWords>(&PATTERN));
		let matches: Vec<_> = ScanCursor::scan_once(&mut context, &verifier).collect();

		assert_eq!(matches.len(), 1);
		// window at 0x2008, reported one 4-byte stride later
		assert_eq!(matches[0].address().get(), 0x200c);
		assert_eq!(matches[0].bytes(), &PATTERN);
	}

	#[test]
	fn test_end_to_end_absent_pattern() {
		let mut context = MemoryContext::new(
			SnapshotSource::new(vec![(0x1000, vec![0u8; 16]), (0x2000, vec![0u8; 32])]),
			false
		)
		.unwrap();

		let verifier = ValueVerifier::new(read_candidate::<TwoWords>(&PATTERN));
		let mut cursor = ScanCursor::scan_once(&mut context, &verifier);

		assert_eq!(cursor.by_ref().count(), 0);
		assert_eq!(cursor.state(), CursorState::Exhausted);
	}

	#[test]
	fn test_unreadable_region_is_skipped() {
		// the middle region is enumerated but its bytes cannot be read
		let mut source = SnapshotSource::new(vec![(0x1000, vec![0u8; 16])]);
		source.unreadable.push((0x2000, 16));

		let mut matching = vec![0u8; 16];
		matching[4 .. 8].copy_from_slice(&0x0bad_cafe_u32.to_ne_bytes());
		source.segments.push((0x3000, matching));

		let mut context = MemoryContext::new(source, false).unwrap();

		let verifier = ValueVerifier::new(0x0bad_cafe_u32);
		let matches: Vec<_> = ScanCursor::scan_once(&mut context, &verifier).collect();

		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].address().get(), 0x3008);
	}
}
