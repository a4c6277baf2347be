use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

/// Maps an archive member name to the resource name used by update scripts.
///
/// Members under `data/` are plain resources; anything else lives at the archive root and gets
/// an absolute name.
pub fn archive_filename_to_resource(name: &str) -> Result<String, ResourceError>
{
	let resource = match name.strip_prefix("data/")
	{
		Some(rest) => rest.to_owned(),
		None => format!("/{name}"),
	};
	if resource.contains('\0')
	{
		return Err(ResourceError::BadPath(name.to_owned()));
	}
	Ok(resource)
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ResourceError
{
	#[error("bad path found in archive ({0:?})")]
	BadPath(String),
}

/// Whether `path` is a regular file, or will become one when opened without special flags.
pub fn will_be_regular_file(path: &Path) -> bool
{
	if is_device_namespace(path)
	{
		return false;
	}
	// creating regular files in /dev is almost never intended
	let is_in_dev = cfg!(any(target_os = "linux", target_os = "macos")) && path.starts_with("/dev/");
	match std::fs::metadata(path)
	{
		Ok(meta) => meta.is_file(),
		Err(e) => e.kind() == ErrorKind::NotFound && !is_in_dev,
	}
}

#[cfg(windows)]
fn is_device_namespace(path: &Path) -> bool
{
	path.as_os_str().to_string_lossy().starts_with(r"\\.\")
}

#[cfg(not(windows))]
fn is_device_namespace(_: &Path) -> bool
{
	false
}

pub fn file_exists(path: &Path) -> bool
{
	std::fs::metadata(path).is_ok()
}
