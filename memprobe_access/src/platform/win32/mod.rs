use std::io;

use thiserror::Error;

use winapi::{
	shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID},
	um::{
		handleapi::CloseHandle,
		memoryapi::{ReadProcessMemory, VirtualQueryEx},
		processthreadsapi::OpenProcess,
		sysinfoapi::{GetSystemInfo, SYSTEM_INFO},
		winnt::{
			HANDLE,
			MEMORY_BASIC_INFORMATION,
			MEM_FREE,
			MEM_RESERVE,
			PROCESS_QUERY_INFORMATION,
			PROCESS_VM_READ
		}
	}
};

use crate::{
	common::Address,
	memory::{
		region::MemoryRegion,
		source::{EnumerateError, MemorySource, ReadError}
	}
};

#[derive(Debug, Error)]
pub enum Win32OpenError {
	#[error("could not open process handle")]
	OpenProcess(#[source] std::io::Error)
}

/// Win32 implementation of a memory source.
///
/// Holds a read/query handle to the target, opened at construction and closed
/// on drop. Regions come from walking `VirtualQueryEx` across the application
/// address range; the query API names nothing, so regions carry empty labels
/// and a heap-only restriction matches no region at all.
pub struct Win32Source {
	pid: DWORD,
	handle: HANDLE
}
impl Win32Source {
	pub fn open(pid: DWORD) -> Result<Self, Win32OpenError> {
		let handle = unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, FALSE, pid) };
		if handle.is_null() {
			return Err(Win32OpenError::OpenProcess(io::Error::last_os_error()))
		}

		Ok(Win32Source { pid, handle })
	}

	pub const fn pid(&self) -> DWORD {
		self.pid
	}
}
impl MemorySource for Win32Source {
	fn enumerate_regions(&mut self, heap_only: bool) -> Result<Vec<MemoryRegion>, EnumerateError> {
		let mut regions = Vec::new();

		let mut system_info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
		unsafe {
			GetSystemInfo(&mut system_info);
		}

		let mut address = system_info.lpMinimumApplicationAddress as usize;
		let maximum = system_info.lpMaximumApplicationAddress as usize;

		while address < maximum {
			let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
			let written = unsafe {
				VirtualQueryEx(
					self.handle,
					address as LPCVOID,
					&mut info,
					std::mem::size_of::<MEMORY_BASIC_INFORMATION>()
				)
			};
			if written == 0 {
				break
			}

			let base = info.BaseAddress as usize;
			address = base.saturating_add(info.RegionSize);

			// skip free and reserved-but-unbacked regions
			if info.State & (MEM_FREE | MEM_RESERVE) != 0 {
				continue
			}

			let region = Address::new(base)
				.zip(Address::new(base + info.RegionSize))
				.and_then(|(start, end)| MemoryRegion::new("", start, end));
			if let Some(region) = region {
				regions.push(region);
			}
		}

		if heap_only {
			regions.retain(MemoryRegion::is_heap);
		}

		Ok(regions)
	}

	fn read_bytes(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), ReadError> {
		let mut bytes_read = 0usize;
		let result = unsafe {
			ReadProcessMemory(
				self.handle,
				address.get() as LPCVOID,
				buffer.as_mut_ptr() as LPVOID,
				buffer.len(),
				&mut bytes_read
			)
		};

		if result == 0 {
			return Err(ReadError::Io(io::Error::last_os_error()))
		}
		if bytes_read != buffer.len() {
			return Err(ReadError::Io(io::Error::new(
				io::ErrorKind::UnexpectedEof,
				"short process memory read"
			)))
		}

		Ok(())
	}
}
impl Drop for Win32Source {
	fn drop(&mut self) {
		unsafe {
			CloseHandle(self.handle);
		}
	}
}
