use core::fmt;
use std::io::{self, Stdout, Write};

use thiserror::Error;

use crate::alloc::{PageAllocator, PageBuffer};
use crate::output::{FrameType, Output, OutputMode};
use crate::timestamp;

#[cfg(test)]
mod test;

pub const DEFAULT_PROGRAM_NAME: &str = "fwup";
/// What [`Context::last_error`] reports when nothing has been recorded.
pub const NO_ERROR: &str = "none";
pub const EXIT_FAILURE: i32 = 1;

/// Everything a run reports through: output channel, last error and page allocator.
///
/// Created once at startup and handed down by reference.
pub struct Context<W: Write = Stdout>
{
	output: Output<W>,
	program_name: String,
	last_error: Option<String>,
	alloc: PageAllocator,
	creation_timestamp: Option<String>,
}

impl Context<Stdout>
{
	pub fn stdout(mode: OutputMode) -> Self
	{
		Self::new(mode, io::stdout())
	}
}

impl<W: Write> Context<W>
{
	pub fn new(mode: OutputMode, dst: W) -> Self
	{
		Self
		{
			output: Output::new(mode, dst),
			program_name: DEFAULT_PROGRAM_NAME.to_owned(),
			last_error: None,
			alloc: PageAllocator::new(),
			creation_timestamp: None,
		}
	}

	pub fn with_program_name(mut self, name: impl Into<String>) -> Self
	{
		self.program_name = name.into();
		self
	}

	pub fn with_allocator(mut self, alloc: PageAllocator) -> Self
	{
		self.alloc = alloc;
		self
	}

	pub fn mode(&self) -> OutputMode
	{
		self.output.mode()
	}

	pub fn program_name(&self) -> &str
	{
		&self.program_name
	}

	pub fn output(&self) -> &Output<W>
	{
		&self.output
	}

	pub fn output_mut(&mut self) -> &mut Output<W>
	{
		&mut self.output
	}

	pub fn allocator(&self) -> &PageAllocator
	{
		&self.alloc
	}

	fn compose(&self, args: fmt::Arguments<'_>, os_error: Option<&io::Error>) -> String
	{
		// frames already say who is talking, so only plain text gets decorated
		if self.output.mode().is_framed()
		{
			return args.to_string();
		}
		let mut text = format!("{}: {args}", self.program_name);
		if let Some(err) = os_error
		{
			text.push_str(": ");
			text.push_str(&describe_os_error(err));
		}
		text.push('\n');
		text
	}

	fn report_fatal(&mut self, status: i32, args: fmt::Arguments<'_>, os_error: Option<&io::Error>) -> Fatal
	{
		let text = self.compose(args, os_error);
		self.output.emit(FrameType::Failure, 0, text.as_bytes());
		Fatal{status, message: args.to_string()}
	}

	/// Reports an unrecoverable error. The caller must hand the result up to [`Fatal::exit`].
	pub fn fatal(&mut self, status: i32, args: fmt::Arguments<'_>) -> Fatal
	{
		self.report_fatal(status, args, None)
	}

	/// Like [`Context::fatal`], adding the description of the calling thread's last OS error.
	pub fn fatal_errno(&mut self, status: i32, args: fmt::Arguments<'_>) -> Fatal
	{
		let err = io::Error::last_os_error();
		self.report_fatal(status, args, Some(&err))
	}

	/// Like [`Context::fatal_errno`] with an OS error that was already captured.
	pub fn fatal_io(&mut self, status: i32, err: &io::Error, args: fmt::Arguments<'_>) -> Fatal
	{
		self.report_fatal(status, args, Some(err))
	}

	pub fn warning(&mut self, args: fmt::Arguments<'_>)
	{
		let text = self.compose(args, None);
		self.output.emit(FrameType::Warning, 0, text.as_bytes());
	}

	pub fn success(&mut self, args: fmt::Arguments<'_>)
	{
		let text = if self.output.mode().is_framed() {args.to_string()} else {format!("{args}\n")};
		self.output.emit(FrameType::Success, 0, text.as_bytes());
	}

	/// Publishes a completion percentage on the progress channel, passed through as the frame code.
	pub fn progress(&mut self, percent: u16)
	{
		self.output.emit(FrameType::Progress, percent, b"");
	}

	/// Replaces the recorded error message, dropping the previous one.
	pub fn set_last_error(&mut self, args: fmt::Arguments<'_>)
	{
		self.last_error = Some(args.to_string());
	}

	pub fn last_error(&self) -> &str
	{
		self.last_error.as_deref().unwrap_or(NO_ERROR)
	}

	pub fn take_last_error(&mut self) -> Option<String>
	{
		self.last_error.take()
	}

	/// Page-aligned buffer of `size` zeroed bytes; allocation failure is fatal.
	pub fn alloc_page_aligned(&mut self, size: usize) -> Result<PageBuffer, Fatal>
	{
		match self.alloc.buffer(size)
		{
			Ok(buf) => Ok(buf),
			Err(e) => match e.os_error()
			{
				Some(os) => Err(self.fatal_io(EXIT_FAILURE, os, format_args!("{e}"))),
				None => Err(self.fatal(EXIT_FAILURE, format_args!("{e}"))),
			},
		}
	}

	/// Creation timestamp of this run, identical across calls.
	pub fn creation_timestamp(&mut self) -> &str
	{
		self.creation_timestamp.get_or_insert_with(timestamp::resolve_creation_timestamp)
	}
}

/// An error that has already been reported and now only has to end the process.
///
/// Nothing may run after a fatal report: return it up to `main` (it works with `?`) and call
/// [`Fatal::exit`] there. Dropping it keeps the process going as if nothing happened.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{message}")]
#[must_use = "a reported fatal error must be handed up to Fatal::exit"]
pub struct Fatal
{
	status: i32,
	message: String,
}

impl Fatal
{
	pub fn status(&self) -> i32
	{
		self.status
	}

	pub fn message(&self) -> &str
	{
		&self.message
	}

	pub fn exit(self) -> !
	{
		std::process::exit(self.status)
	}
}

/// The platform's description of an OS error, without Rust's `(os error N)` suffix.
pub fn describe_os_error(err: &io::Error) -> String
{
	match err.raw_os_error()
	{
		Some(code) => os_error_string(code),
		None => err.to_string(),
	}
}

#[cfg(unix)]
fn os_error_string(code: i32) -> String
{
	use std::ffi::CStr;

	let mut buff = [0 as libc::c_char; 256];
	let rc = unsafe{libc::strerror_r(code, buff.as_mut_ptr(), buff.len())};
	if rc != 0
	{
		return io::Error::from_raw_os_error(code).to_string();
	}
	unsafe{CStr::from_ptr(buff.as_ptr())}.to_string_lossy().into_owned()
}

#[cfg(not(unix))]
fn os_error_string(code: i32) -> String
{
	let text = io::Error::from_raw_os_error(code).to_string();
	match text.rfind(" (os error ")
	{
		Some(pos) => text[..pos].to_owned(),
		None => text,
	}
}

/// Reports a fatal error: `fatal!(ctx, status, "format", args...)` evaluates to a [`Fatal`].
#[macro_export]
macro_rules!fatal
{
	($ctx:expr, $status:expr, $($arg:tt)+) => {$ctx.fatal($status, format_args!($($arg)+))};
}

/// Same as [`fatal!`], appending the description of the last OS error.
#[macro_export]
macro_rules!fatal_errno
{
	($ctx:expr, $status:expr, $($arg:tt)+) => {$ctx.fatal_errno($status, format_args!($($arg)+))};
}

#[macro_export]
macro_rules!warning
{
	($ctx:expr, $($arg:tt)+) => {$ctx.warning(format_args!($($arg)+))};
}

#[macro_export]
macro_rules!set_last_error
{
	($ctx:expr, $($arg:tt)+) => {$ctx.set_last_error(format_args!($($arg)+))};
}
