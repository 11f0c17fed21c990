use std::fmt::Write;

/// Formats bytes as lowercase two-digit hex pairs with no separators.
///
/// For example `[0x12, 0x34, 0xab]` formats as `"1234ab"`. Used to display
/// matched fields; no `0x` prefix is added.
pub fn format_hex(bytes: &[u8]) -> String {
	let mut out = String::with_capacity(bytes.len() * 2);
	for byte in bytes {
		write!(out, "{:02x}", byte).expect("formatting into a String does not fail");
	}

	out
}
