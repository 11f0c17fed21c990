use thiserror::Error;

use crate::{
	common::Address,
	memory::{region::MemoryRegion, source::EnumerateError}
};

#[derive(Debug, Error)]
pub enum MapsParseError {
	#[error("mapped range has invalid format")]
	InvalidRange,
	#[error("mapped range is empty or inverted")]
	EmptyRange,
	#[error("record is missing the {0} field")]
	MissingField(&'static str),

	#[error("could not parse range bounds")]
	ParseAddress(#[from] std::num::ParseIntError)
}
impl From<MapsParseError> for EnumerateError {
	fn from(err: MapsParseError) -> Self {
		EnumerateError::Platform(Box::new(err))
	}
}

/// Parses the textual memory map listing, one record per line.
///
/// With `heap_only` set, records are consumed until exactly one heap-labeled
/// record has been collected, then parsing stops.
pub fn parse_maps(contents: &str, heap_only: bool) -> Result<Vec<MemoryRegion>, MapsParseError> {
	let mut regions = Vec::new();

	for line in contents.lines() {
		let region = parse_record(line)?;

		if heap_only {
			if region.is_heap() {
				regions.push(region);
				break
			}
		} else {
			regions.push(region);
		}
	}

	Ok(regions)
}

/// Parses one `start-end perms offset dev inode [label]` record.
///
/// The trailing label is optional; anonymous mappings yield an empty one.
fn parse_record(line: &str) -> Result<MemoryRegion, MapsParseError> {
	let mut fields = line.splitn(6, ' ');

	let range = fields.next().ok_or(MapsParseError::MissingField("range"))?;
	let (start, end) = range.split_once('-').ok_or(MapsParseError::InvalidRange)?;
	let start = usize::from_str_radix(start, 16)?;
	let end = usize::from_str_radix(end, 16)?;
	let start = Address::new(start).ok_or(MapsParseError::InvalidRange)?;
	let end = Address::new(end).ok_or(MapsParseError::InvalidRange)?;

	fields.next().ok_or(MapsParseError::MissingField("permissions"))?;
	fields.next().ok_or(MapsParseError::MissingField("offset"))?;
	fields.next().ok_or(MapsParseError::MissingField("device"))?;
	fields.next().ok_or(MapsParseError::MissingField("inode"))?;

	// the label column is padded with spaces and missing entirely for anonymous mappings
	let label = fields.next().map(str::trim).unwrap_or("");

	MemoryRegion::new(label, start, end).ok_or(MapsParseError::EmptyRange)
}
