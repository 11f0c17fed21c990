pub use crate::{
	candidate::{read_candidate, FromRawBytes},
	cursor::{CursorState, ScanCursor, ScanMatch},
	layout::alignment_of,
	util::format_hex,
	verifier::{
		value::ValueVerifier,
		CandidateVerifier, ScanVerifier,
	},
};
