use memprobe_access::prelude::{Address, AddressSpace};

use crate::{
	candidate::{read_candidate, FromRawBytes},
	layout
};

pub mod value;

/// Scan verifier is the contract through which the scanning cursor asks
/// whether a candidate window constitutes a match.
///
/// The trait is object safe and byte-oriented so that the cursor's core loop
/// stays non-generic over the candidate type; typed callers implement
/// [`CandidateVerifier`] instead and get this trait for free.
pub trait ScanVerifier {
	/// Size in bytes of the candidate windows this verifier inspects.
	fn type_size(&self) -> usize;

	/// Natural alignment of the candidate type; the cursor uses it as the scan stride.
	fn type_align(&self) -> usize;

	/// Called immediately before every predicate evaluation.
	///
	/// The default does nothing; implementations use it e.g. for throttling.
	fn before_check(&self) {}

	/// Decides whether the window constitutes a match.
	///
	/// `space` is the read-only region view of the scanned context, useful
	/// for pointer-plausibility lookups. `address` is the cursor's position
	/// at evaluation time, one stride past the start of the window.
	fn verify(&self, space: &dyn AddressSpace, bytes: &[u8], address: Address) -> bool;
}

/// Typed layer over [`ScanVerifier`].
///
/// Implementations describe the candidate type and a predicate over decoded
/// values; size, alignment and the byte-level reinterpretation are derived.
pub trait CandidateVerifier {
	type Candidate: FromRawBytes;

	/// Called immediately before every predicate evaluation.
	fn before_check(&self) {}

	/// Decides whether the decoded candidate constitutes a match.
	fn verify(&self, space: &dyn AddressSpace, candidate: &Self::Candidate, address: Address) -> bool;
}

impl<V: CandidateVerifier> ScanVerifier for V {
	fn type_size(&self) -> usize {
		std::mem::size_of::<V::Candidate>()
	}

	fn type_align(&self) -> usize {
		layout::alignment_of::<V::Candidate>()
	}

	fn before_check(&self) {
		CandidateVerifier::before_check(self)
	}

	fn verify(&self, space: &dyn AddressSpace, bytes: &[u8], address: Address) -> bool {
		let candidate = read_candidate::<V::Candidate>(bytes);

		CandidateVerifier::verify(self, space, &candidate, address)
	}
}
