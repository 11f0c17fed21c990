use std::{
	fs::{File, OpenOptions},
	io::{Read, Seek, SeekFrom}
};

use thiserror::Error;

use crate::{
	common::Address,
	memory::{
		region::MemoryRegion,
		source::{EnumerateError, MemorySource, ReadError}
	}
};

use super::maps;

#[derive(Debug, Error)]
pub enum ProcfsOpenError {
	#[error("could not open memory file")]
	MemoryIo(#[from] std::io::Error)
}

/// Procfs implementation of a memory source.
///
/// Regions come from `/proc/[pid]/maps`, re-read on every enumeration. Reads
/// go through `/proc/[pid]/mem`, positioned by seek; the file is opened once
/// at construction, which is also where insufficient privilege surfaces.
pub struct ProcfsSource {
	pid: libc::pid_t,
	mem: File
}
impl ProcfsSource {
	pub fn maps_path(pid: libc::pid_t) -> std::path::PathBuf {
		format!("/proc/{}/maps", pid).into()
	}

	pub fn mem_path(pid: libc::pid_t) -> std::path::PathBuf {
		format!("/proc/{}/mem", pid).into()
	}

	/// Opens the memory access file of the process with given `pid`.
	pub fn open(pid: libc::pid_t) -> Result<Self, ProcfsOpenError> {
		let mem = OpenOptions::new().read(true).open(Self::mem_path(pid))?;

		Ok(ProcfsSource { pid, mem })
	}

	pub const fn pid(&self) -> libc::pid_t {
		self.pid
	}
}
impl MemorySource for ProcfsSource {
	fn enumerate_regions(&mut self, heap_only: bool) -> Result<Vec<MemoryRegion>, EnumerateError> {
		let contents = std::fs::read_to_string(Self::maps_path(self.pid))?;

		Ok(maps::parse_maps(&contents, heap_only)?)
	}

	fn read_bytes(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), ReadError> {
		self.mem.seek(SeekFrom::Start(address.get() as u64))?;
		self.mem.read_exact(buffer)?;

		Ok(())
	}
}
