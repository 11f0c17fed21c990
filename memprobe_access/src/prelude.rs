pub use crate::{
	common::Address,
	memory::{
		context::{AddressSpace, MemoryContext},
		region::MemoryRegion,
		source::{EnumerateError, MemorySource, ReadError}
	}
};
