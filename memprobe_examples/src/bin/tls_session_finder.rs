use std::collections::HashSet;

use anyhow::Context;

use memprobe_access::platform::simple::SimpleSource;
use memprobe_access::prelude::{Address, AddressSpace, MemoryContext};
use memprobe_scan::prelude::{format_hex, CandidateVerifier, FromRawBytes, ScanCursor};

/// In-memory prefix of an OpenSSL 1.0.x `SSL_SESSION`.
///
/// Only the leading fields matter for locating live sessions; whatever
/// follows `session_id` in the real structure is never read.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
struct SslSessionPrefix {
	ssl_version: i32,
	key_arg_length: u32,
	key_arg: [u8; 8],
	master_key_length: i32,
	master_key: [u8; 48],
	session_id_length: u32,
	session_id: [u8; 32]
}

// Every field tolerates arbitrary bytes, so any bit pattern is a valid value.
unsafe impl FromRawBytes for SslSessionPrefix {}

/// Accepts windows shaped like an established TLS 1.2 session with a full
/// master key and session id.
struct SslSessionVerifier;
impl CandidateVerifier for SslSessionVerifier {
	type Candidate = SslSessionPrefix;

	fn verify(
		&self,
		_space: &dyn AddressSpace,
		candidate: &SslSessionPrefix,
		_address: Address
	) -> bool {
		candidate.ssl_version == 0x0303
			&& candidate.master_key_length == 48
			&& candidate.session_id_length == 32
	}
}

fn main() -> anyhow::Result<()> {
	// simple cli parse
	let mut it = std::env::args().skip(1);
	let pid: i32 = it
		.next()
		.context("usage: tls_session_finder <pid> [--follow]")?
		.parse()
		.context("pid must be numeric")?;
	let follow = it.next().as_deref() == Some("--follow");

	let source = SimpleSource::open(pid).context("could not open process memory")?;
	let mut context =
		MemoryContext::new(source, true).context("could not enumerate memory regions")?;

	let verifier = SslSessionVerifier;
	let cursor = if follow {
		// never ends on its own; interrupt the process to stop
		ScanCursor::scan_forever(&mut context, &verifier)
	} else {
		ScanCursor::scan_once(&mut context, &verifier)
	};

	let mut seen: HashSet<[u8; 32]> = HashSet::new();
	for found in cursor {
		let session = found.value::<SslSessionPrefix>();

		if seen.insert(session.session_id) {
			println!(
				"RSA Session-ID:{} Master-Key:{}",
				format_hex(&session.session_id),
				format_hex(&session.master_key)
			);
		}
	}

	Ok(())
}
