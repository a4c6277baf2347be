#![deny(unused_must_use)]

use super::*;
use crate::output::frame::{decode, Frame, FrameIter};

fn plain() -> Context<Vec<u8>>
{
	Context::new(OutputMode::PlainQuiet, Vec::new())
}

fn framed() -> Context<Vec<u8>>
{
	Context::new(OutputMode::Framed, Vec::new())
}

fn written<W: Write + AsRef<[u8]>>(ctx: &Context<W>) -> &[u8]
{
	ctx.output().get_ref().as_ref()
}

#[test]
fn plain_warning()
{
	let mut ctx = plain();
	crate::warning!(ctx, "disk full");
	assert_eq!(written(&ctx), b"fwup: disk full\n");
}

#[test]
fn plain_warning_progress()
{
	let mut ctx = Context::new(OutputMode::PlainProgress, Vec::new());
	crate::warning!(ctx, "{} of {} blocks", 3, 4);
	assert_eq!(written(&ctx), b"\r\x1b[Kfwup: 3 of 4 blocks\n");
}

#[test]
fn framed_warning()
{
	let mut ctx = framed();
	crate::warning!(ctx, "disk full");
	assert_eq!(written(&ctx), b"\x00\x00\x00\x0DWN\x00\x00disk full");
}

#[test]
fn program_name()
{
	let mut ctx = plain().with_program_name("fwtool");
	assert_eq!(ctx.program_name(), "fwtool");
	crate::warning!(ctx, "hello");
	assert_eq!(written(&ctx), b"fwtool: hello\n");
}

#[test]
fn plain_fatal()
{
	let mut ctx = plain();
	let fatal = crate::fatal!(ctx, 3, "bad {}", "config");
	assert_eq!(fatal.status(), 3);
	assert_eq!(fatal.message(), "bad config");
	assert_eq!(fatal.to_string(), "bad config");
	assert_eq!(written(&ctx), b"fwup: bad config\n");
}

#[test]
fn framed_fatal_has_no_decoration()
{
	let mut ctx = framed();
	let err = io::Error::from(io::ErrorKind::NotFound);
	let fatal = ctx.fatal_io(2, &err, format_args!("open {}", "x.fw"));
	assert_eq!(fatal.status(), 2);
	let (len, frame) = decode(written(&ctx)).unwrap();
	assert_eq!(len, written(&ctx).len());
	assert_eq!(frame, Frame::new(FrameType::Failure, 0, b"open x.fw"));
}

#[cfg(unix)]
#[test]
fn plain_fatal_io()
{
	let mut ctx = plain();
	let err = io::Error::from_raw_os_error(libc::ENOENT);
	let fatal = ctx.fatal_io(7, &err, format_args!("open {}", "missing.fw"));
	assert_eq!(fatal.status(), 7);
	assert_eq!(written(&ctx), b"fwup: open missing.fw: No such file or directory\n");
}

#[cfg(target_os = "linux")]
#[test]
fn plain_fatal_errno()
{
	let mut ctx = plain();
	unsafe{*libc::__errno_location() = libc::ENOENT;}
	let fatal = crate::fatal_errno!(ctx, 9, "stat {}", "/nope");
	assert_eq!(fatal.status(), 9);
	assert!(written(&ctx).ends_with(b": No such file or directory\n"));
	assert!(written(&ctx).starts_with(b"fwup: stat /nope: "));
}

#[test]
fn custom_io_error_text()
{
	let err = io::Error::new(io::ErrorKind::Other, "device went away");
	assert_eq!(describe_os_error(&err), "device went away");
	let mut ctx = plain();
	let fatal = ctx.fatal_io(1, &err, format_args!("write"));
	assert_eq!(fatal.message(), "write");
	assert_eq!(written(&ctx), b"fwup: write: device went away\n");
}

fn flash(ctx: &mut Context<Vec<u8>>, image: &[u8]) -> Result<usize, Fatal>
{
	if image.is_empty()
	{
		return Err(crate::fatal!(ctx, 4, "empty image"));
	}
	crate::warning!(ctx, "writing {} bytes", image.len());
	Ok(image.len())
}

#[test]
fn fatal_ends_the_caller()
{
	let mut ctx = plain();
	let fatal = flash(&mut ctx, b"").unwrap_err();
	assert_eq!(fatal.status(), 4);
	assert_eq!(written(&ctx), b"fwup: empty image\n");

	let mut ctx = plain();
	assert_eq!(flash(&mut ctx, b"fw"), Ok(2));
	assert_eq!(written(&ctx), b"fwup: writing 2 bytes\n");
}

#[test]
fn last_error_slot()
{
	let mut ctx = plain();
	assert_eq!(ctx.last_error(), NO_ERROR);
	assert_eq!(ctx.last_error(), "none");
	crate::set_last_error!(ctx, "x={}", 5);
	assert_eq!(ctx.last_error(), "x=5");
	crate::set_last_error!(ctx, "y={}", 6);
	assert_eq!(ctx.last_error(), "y=6");
	assert_eq!(ctx.take_last_error().as_deref(), Some("y=6"));
	assert_eq!(ctx.last_error(), "none");
	// reporting never touches the slot
	assert!(written(&ctx).is_empty());
}

#[test]
fn success_and_progress()
{
	let mut ctx = framed();
	ctx.progress(42);
	ctx.progress(250);
	ctx.success(format_args!("done"));
	let buff = written(&ctx);
	let frames = FrameIter::new(buff).collect::<Result<Vec<_>, _>>().unwrap();
	assert_eq!(frames, vec![
		Frame::new(FrameType::Progress, 42, b""),
		Frame::new(FrameType::Progress, 250, b""),
		Frame::new(FrameType::Success, 0, b"done"),
	]);

	let mut ctx = plain();
	ctx.progress(10);
	ctx.success(format_args!("done"));
	assert_eq!(written(&ctx), b"done\n");
}

#[test]
fn alloc_through_context()
{
	let mut ctx = plain();
	let mut buf = ctx.alloc_page_aligned(10000).unwrap();
	assert_eq!(buf.as_ptr() as usize % ctx.allocator().page_size(), 0);
	buf[9999] = 1;
	assert!(written(&ctx).is_empty());
}

#[test]
fn alloc_failure_is_fatal()
{
	use crate::alloc::Strategy;

	let alloc = PageAllocator::new().with_strategy(Strategy::Offset).unwrap();
	let mut ctx = plain().with_allocator(alloc);
	let fatal = ctx.alloc_page_aligned(usize::MAX).unwrap_err();
	assert_eq!(fatal.status(), EXIT_FAILURE);
	let text = String::from_utf8(written(&ctx).to_vec()).unwrap();
	assert!(text.starts_with("fwup: allocation size overflow"), "{text}");
}
