use std::io::{self, Stdout, Write};

use crate::macros::numeric_enum;

pub mod frame;


/// Sequence that moves the cursor back to the first column and clears the line.
pub const CLEAR_LINE: &[u8] = b"\r\x1b[K";

/// How diagnostics reach standard output. Fixed for the lifetime of a [`Output`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputMode
{
	/// Length-prefixed binary records for a supervising program.
	Framed,
	/// Plain text sharing the terminal with a progress bar that gets redrawn in place.
	PlainProgress,
	/// Plain text, nothing else on the line.
	#[default]
	PlainQuiet,
}

impl OutputMode
{
	pub fn is_framed(self) -> bool
	{
		self == Self::Framed
	}
}

numeric_enum!
{
	#[enum(pub u16)]
	#[TryFrom(u16 => UnknownFrameType: as(pub struct), derive(Display), derive(Error))]
	#[Into(u16)]
	#[Label]
	enum FrameType
	{
		Success = 0x4F4B => "OK",
		Failure = 0x4552 => "ER",
		Warning = 0x574E => "WN",
		Progress = 0x5052 => "PR",
	}
}

impl FrameType
{
	/// The two ASCII bytes identifying this channel on the wire.
	pub fn tag(self) -> [u8; 2]
	{
		u16::to_be_bytes(self as u16)
	}
}

pub struct Output<W: Write>
{
	mode: OutputMode,
	dst: W,
	scratch: Vec<u8>,
}

impl Output<Stdout>
{
	pub fn stdout(mode: OutputMode) -> Self
	{
		Self::new(mode, io::stdout())
	}
}

impl<W: Write> Output<W>
{
	pub fn new(mode: OutputMode, dst: W) -> Self
	{
		Self{mode, dst, scratch: Vec::new()}
	}

	pub fn mode(&self) -> OutputMode
	{
		self.mode
	}

	pub fn get_ref(&self) -> &W
	{
		&self.dst
	}

	pub fn get_mut(&mut self) -> &mut W
	{
		&mut self.dst
	}

	pub fn into_inner(self) -> W
	{
		self.dst
	}

	/// Sends one event to the destination and flushes it. Failures are logged, never returned.
	pub fn emit(&mut self, ty: FrameType, code: u16, text: &[u8])
	{
		if let Err(e) = self.try_emit(ty, code, text)
		{
			tracing::error!(channel = %ty, error = %e, "could not write diagnostic output");
		}
	}

	fn try_emit(&mut self, ty: FrameType, code: u16, text: &[u8]) -> io::Result<()>
	{
		match self.mode
		{
			OutputMode::Framed =>
			{
				// one write per frame so a live reader never sees a header without its payload
				self.scratch.clear();
				frame::encode(ty, code, text, &mut self.scratch).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
				self.dst.write_all(&self.scratch)?;
			},
			OutputMode::PlainProgress if !text.is_empty() =>
			{
				self.dst.write_all(CLEAR_LINE)?;
				self.dst.write_all(text)?;
			},
			_ => self.dst.write_all(text)?,
		}
		self.dst.flush()
	}
}
