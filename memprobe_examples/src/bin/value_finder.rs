use anyhow::Context;

use memprobe_access::platform::simple::SimpleSource;
use memprobe_access::prelude::MemoryContext;
use memprobe_scan::prelude::{format_hex, ScanCursor, ValueVerifier};

fn main() -> anyhow::Result<()> {
	// simple cli parse
	let (needle, pid) = {
		let mut it = std::env::args().skip(1);

		let needle: u32 = it
			.next()
			.map(|s| {
				let s = s.trim_start_matches("0x");
				u32::from_str_radix(s, 16)
			})
			.transpose()
			.context("needle must be a hex u32")?
			.unwrap_or(0x464c_457f); // "\x7fELF" read as a little-endian word

		let pid: i32 = it
			.next()
			.and_then(|s| s.parse().ok())
			.unwrap_or_else(|| std::process::id() as i32);

		(needle, pid)
	};
	eprintln!("needle: {:#x}", needle);
	eprintln!("pid: {}", pid);

	let source = SimpleSource::open(pid).context("could not open process memory")?;
	let mut context =
		MemoryContext::new(source, false).context("could not enumerate memory regions")?;

	let verifier = ValueVerifier::new(needle);

	// addresses are reported one stride past the start of the matched window
	let mut count = 0usize;
	for found in ScanCursor::scan_once(&mut context, &verifier) {
		println!("[0x{}] {}", found.address(), format_hex(found.bytes()));
		count += 1;
	}
	eprintln!("{} matches", count);

	Ok(())
}
