use std::iter::FusedIterator;

use thiserror::Error;

use crate::output::{FrameType, UnknownFrameType};

/// Length of the fixed part of a frame (length field, type tag and code).
pub const HEADER_LEN: usize = 8;
/// Bytes counted by the length field that precede the payload (type tag and code).
const LEN_BIAS: u32 = 4;
pub const MAX_PAYLOAD_LEN: usize = (u32::MAX - LEN_BIAS) as usize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Frame<'l>
{
	pub ty: FrameType,
	pub code: u16,
	pub text: &'l [u8],
}

impl<'l> Frame<'l>
{
	pub fn new(ty: FrameType, code: u16, text: &'l [u8]) -> Self
	{
		Self{ty, code, text}
	}

	/// Total number of bytes this frame occupies on the wire.
	pub fn wire_len(&self) -> usize
	{
		HEADER_LEN + self.text.len()
	}
}

pub fn encode(ty: FrameType, code: u16, text: &[u8], dst: &mut Vec<u8>) -> Result<usize, EncodeError>
{
	if text.len() > MAX_PAYLOAD_LEN
	{
		return Err(EncodeError::Overflow{need: text.len(), have: MAX_PAYLOAD_LEN});
	}
	let len = text.len() as u32 + LEN_BIAS;
	dst.reserve(HEADER_LEN + text.len());
	dst.extend_from_slice(&u32::to_be_bytes(len));
	dst.extend_from_slice(&ty.tag());
	dst.extend_from_slice(&u16::to_be_bytes(code));
	dst.extend_from_slice(text);
	Ok(HEADER_LEN + text.len())
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EncodeError
{
	#[error("payload too large for a frame (need {need}, max {have})")]
	Overflow{need: usize, have: usize},
}

/// Parses the frame at the start of `src`, returning the number of bytes it occupies.
pub fn decode(src: &[u8]) -> Result<(usize, Frame<'_>), DecodeError>
{
	if src.len() < HEADER_LEN
	{
		return Err(DecodeError::Underflow{need: HEADER_LEN, have: src.len()});
	}
	let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
	if len < LEN_BIAS
	{
		return Err(DecodeError::Length(len));
	}
	let ty = FrameType::try_from(u16::from_be_bytes([src[4], src[5]]))?;
	let code = u16::from_be_bytes([src[6], src[7]]);
	let text_len = (len - LEN_BIAS) as usize;
	let have = src.len() - HEADER_LEN;
	if have < text_len
	{
		return Err(DecodeError::Underflow{need: HEADER_LEN.saturating_add(text_len), have: src.len()});
	}
	let frame = Frame{ty, code, text: &src[HEADER_LEN..HEADER_LEN + text_len]};
	Ok((frame.wire_len(), frame))
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError
{
	#[error("input buffer underflow (need {need}, got {have})")]
	Underflow{need: usize, have: usize},
	#[error("invalid frame length ({0}, minimum 4)")]
	Length(u32),
	#[error("unknown frame type")]
	Type(#[from] UnknownFrameType),
}

/// Walks every frame of a buffer; stops after the first error.
#[derive(Clone, Debug)]
pub struct FrameIter<'l>
{
	src: &'l [u8],
	pos: usize,
	failed: bool,
}

impl<'l> FrameIter<'l>
{
	pub fn new(src: &'l [u8]) -> Self
	{
		Self{src, pos: 0, failed: false}
	}

	/// Number of input bytes consumed by successfully decoded frames.
	pub fn position(&self) -> usize
	{
		self.pos
	}
}

impl<'l> Iterator for FrameIter<'l>
{
	type Item = Result<Frame<'l>, DecodeError>;

	fn next(&mut self) -> Option<Self::Item>
	{
		if self.failed || self.pos >= self.src.len() {return None;}
		match decode(&self.src[self.pos..])
		{
			Ok((len, frame)) =>
			{
				self.pos += len;
				Some(Ok(frame))
			},
			Err(e) =>
			{
				self.failed = true;
				Some(Err(e))
			},
		}
	}
}

impl<'l> FusedIterator for FrameIter<'l> {}
