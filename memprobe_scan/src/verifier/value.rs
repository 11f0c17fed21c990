use memprobe_access::prelude::{Address, AddressSpace};

use crate::candidate::FromRawBytes;

use super::CandidateVerifier;

/// Verifier matching windows equal to a concrete value.
pub struct ValueVerifier<T: FromRawBytes + PartialEq> {
	value: T
}
impl<T: FromRawBytes + PartialEq> ValueVerifier<T> {
	pub fn new(value: T) -> Self {
		ValueVerifier { value }
	}
}
impl<T: FromRawBytes + PartialEq> CandidateVerifier for ValueVerifier<T> {
	type Candidate = T;

	fn verify(&self, _space: &dyn AddressSpace, candidate: &T, _address: Address) -> bool {
		*candidate == self.value
	}
}
