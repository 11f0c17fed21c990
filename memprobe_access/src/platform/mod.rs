#[cfg(target_os = "linux")]
pub mod procfs;

#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(feature = "platform_simple")]
pub mod simple;
