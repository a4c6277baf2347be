use thiserror::Error;

/// Lowercase hex, two characters per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String
{
	hex::encode(bytes)
}

/// Decodes `src` into the front of `dst`, returning the number of bytes written.
///
/// Both letter cases are accepted. Nothing is guaranteed about the contents of `dst` on failure.
pub fn hex_to_bytes(src: &str, dst: &mut [u8]) -> Result<usize, HexError>
{
	if src.len() % 2 != 0
	{
		return Err(HexError::OddLength(src.len()));
	}
	let len = src.len() / 2;
	if len > dst.len()
	{
		return Err(HexError::TooLong{need: len, have: dst.len()});
	}
	match hex::decode_to_slice(src, &mut dst[..len])
	{
		Ok(()) => Ok(len),
		Err(hex::FromHexError::InvalidHexCharacter{c, index}) => Err(HexError::InvalidChar{c, index}),
		// lengths were checked above
		Err(..) => Err(HexError::OddLength(src.len())),
	}
}

/// Decodes a whole hex string into a new buffer.
pub fn hex_to_vec(src: &str) -> Result<Vec<u8>, HexError>
{
	let mut buff = vec![0u8; src.len() / 2];
	let len = hex_to_bytes(src, &mut buff)?;
	debug_assert_eq!(len, buff.len());
	Ok(buff)
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HexError
{
	#[error("hex string should have an even number of characters (got {0})")]
	OddLength(usize),
	#[error("hex string is too long ({need} bytes, room for {have})")]
	TooLong{need: usize, have: usize},
	#[error("invalid character {c:?} in hex string (position {index})")]
	InvalidChar{c: char, index: usize},
}
