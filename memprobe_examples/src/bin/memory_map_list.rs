use anyhow::Context;

use memprobe_access::platform::simple::SimpleSource;
use memprobe_access::prelude::MemoryContext;

fn main() -> anyhow::Result<()> {
	// simple cli parse
	let pid: i32 = std::env::args()
		.nth(1)
		.and_then(|s| s.parse().ok())
		.unwrap_or_else(|| std::process::id() as i32);
	eprintln!("pid: {}", pid);

	let source = SimpleSource::open(pid).context("could not open process memory")?;
	let context = MemoryContext::new(source, false).context("could not enumerate memory regions")?;

	for region in context.mapped_regions() {
		println!("{}", region);
	}

	Ok(())
}
