use std::io::{self, ErrorKind, Read, Write};

/// Ctrl+Z, sent when all work is done.
pub const HANDSHAKE_BYTE: u8 = 0x1A;
const DRAIN_LEN: usize = 4096;

/// Signals completion to a supervising process, then waits for it to close our input.
///
/// Failing to send the signal is only logged; the drain runs regardless.
pub fn handshake<W: Write, R: Read>(out: &mut W, input: &mut R)
{
	match out.write(&[HANDSHAKE_BYTE]).and_then(|n| out.flush().map(|_| n))
	{
		Ok(1) => (),
		Ok(n) => tracing::warn!(written = n, "error sending Ctrl+Z as part of the exit handshake"),
		Err(e) => tracing::warn!(error = %e, "error sending Ctrl+Z as part of the exit handshake"),
	}
	drain(input);
}

/// Reads and discards `input` until end of stream or a non-interrupt error.
pub fn drain<R: Read>(input: &mut R)
{
	let mut throwaway = [0u8; DRAIN_LEN];
	loop
	{
		match input.read(&mut throwaway)
		{
			Ok(0) => break,
			Ok(..) => (),
			Err(e) if e.kind() == ErrorKind::Interrupted => (),
			Err(e) =>
			{
				tracing::debug!(error = %e, "stopped draining input");
				break;
			},
		}
	}
}

/// [`handshake`] over this process's standard output and input.
pub fn handshake_exit()
{
	handshake(&mut io::stdout().lock(), &mut io::stdin().lock());
}
