//! This module contains best-effort abstraction over platform specific implementations
//! in the parent module.
//!
//! For each supported platform, this module exports uniformly named types for the
//! default memory source of that platform.

#[cfg(target_os = "linux")]
mod inner {
	use super::super::procfs;

	pub type SimpleSource = procfs::ProcfsSource;
	pub type SimpleOpenError = procfs::ProcfsOpenError;
}

#[cfg(target_os = "windows")]
mod inner {
	use super::super::win32;

	pub type SimpleSource = win32::Win32Source;
	pub type SimpleOpenError = win32::Win32OpenError;
}

pub use inner::{SimpleOpenError, SimpleSource};
