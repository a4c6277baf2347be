use std::io::{Read, Write};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use fwout::output::frame::{Frame, FrameIter};
use fwout::FrameType;

fn fwout() -> Command
{
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_fwout"));
	cmd.env_remove("NOW");
	cmd
}

fn run(args: &[&str]) -> Output
{
	fwout().args(args).output().expect("run fwout")
}

fn frames(out: &[u8]) -> Vec<Frame<'_>>
{
	FrameIter::new(out).collect::<Result<Vec<_>, _>>().expect("valid frames")
}

#[test]
fn plain_warning()
{
	let out = run(&["warn", "disk full"]);
	assert!(out.status.success());
	assert_eq!(out.stdout, b"fwup: disk full\n");
}

#[test]
fn plain_warning_with_progress_bar()
{
	let out = run(&["--progress", "normal", "warn", "disk full"]);
	assert_eq!(out.stdout, b"\r\x1b[Kfwup: disk full\n");
}

#[test]
fn framed_warning()
{
	let out = run(&["--framing", "warn", "disk full"]);
	assert!(out.status.success());
	assert_eq!(out.stdout, b"\x00\x00\x00\x0DWN\x00\x00disk full");
}

#[test]
fn fatal_exit_status()
{
	let out = run(&["fail", "--status", "42", "cannot continue"]);
	assert_eq!(out.status.code(), Some(42));
	assert_eq!(out.stdout, b"fwup: cannot continue\n");

	let out = run(&["--framing", "fail", "cannot continue"]);
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(frames(&out.stdout), vec![Frame::new(FrameType::Failure, 0, b"cannot continue")]);
}

#[cfg(unix)]
#[test]
fn fatal_with_os_error()
{
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.fw");
	let out = fwout().args(["fail-open", "--status", "5"]).arg(&missing).arg("open firmware").output().unwrap();
	assert_eq!(out.status.code(), Some(5));
	assert!(out.stdout.starts_with(b"fwup: open firmware: "));
	assert!(out.stdout.ends_with(b": No such file or directory\n"), "{:?}", String::from_utf8_lossy(&out.stdout));

	std::fs::write(&missing, b"fw").unwrap();
	let out = fwout().args(["fail-open"]).arg(&missing).arg("open firmware").output().unwrap();
	assert!(out.status.success());
}

#[test]
fn progress_and_success_frames()
{
	let out = run(&["--framing", "progress", "73"]);
	assert_eq!(frames(&out.stdout), vec![Frame::new(FrameType::Progress, 73, b"")]);
	let out = run(&["progress", "73"]);
	assert!(out.stdout.is_empty());
	let out = run(&["--framing", "success", "all done"]);
	assert_eq!(frames(&out.stdout), vec![Frame::new(FrameType::Success, 0, b"all done")]);
}

#[test]
fn hex_commands()
{
	assert_eq!(run(&["hex-encode", "fw"]).stdout, b"6677\n");
	assert_eq!(run(&["hex-decode", "6677"]).stdout, b"fw\n");
	let out = run(&["hex-decode", "667"]);
	assert_eq!(out.status.code(), Some(1));
	assert!(out.stdout.starts_with(b"fwup: hex-decode: hex string should have an even number"));
	let out = run(&["hex-decode", "--max", "1", "6677"]);
	assert_eq!(out.status.code(), Some(1));
}

#[test]
fn pretty_units()
{
	assert_eq!(run(&["pretty", "1500000"]).stdout, b"1.50 MB\n");
	assert_eq!(run(&["pretty", "--units", "KiB", "2048"]).stdout, b"2.00 KiB\n");
	assert_eq!(run(&["pretty", "--units", "furlongs", "1"]).status.code(), Some(1));
}

#[test]
fn resource_names()
{
	assert_eq!(run(&["resource", "data/rootfs.img"]).stdout, b"rootfs.img\n");
	assert_eq!(run(&["resource", "meta.conf"]).stdout, b"/meta.conf\n");
	assert_eq!(run(&["resource", "data/"]).stdout, b"\n");
}

#[test]
fn timestamp_from_env()
{
	let out = fwout().env("NOW", "2020-01-02T03:04:05Z").arg("timestamp").output().unwrap();
	assert_eq!(out.stdout, b"2020-01-02T03:04:05Z\n");
	let out = fwout().env("NOW", "2020-01-02T03:04:05Zbuild7").arg("timestamp").output().unwrap();
	assert_eq!(out.stdout, b"2020-01-02T03:04:05Zbuild7\n");
	// unparsable values are ignored in favour of the clock
	let out = fwout().env("NOW", "yesterday").arg("timestamp").output().unwrap();
	let text = String::from_utf8(out.stdout).unwrap();
	assert!(fwout::timestamp::parse_timestamp(text.trim_end()).is_ok(), "{text:?}");
}

#[test]
fn aligned_allocation()
{
	let out = run(&["alloc", "100000"]);
	assert!(out.status.success());
	let text = String::from_utf8(out.stdout).unwrap();
	assert!(text.starts_with("100000 bytes, page size "), "{text}");
	assert!(text.ends_with("aligned true\n"), "{text}");
}

#[test]
fn exit_handshake()
{
	let mut child = fwout()
		.args(["--exit-handshake", "success", "written"])
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.spawn()
		.unwrap();
	let mut stdin = child.stdin.take().unwrap();
	let mut stdout = child.stdout.take().unwrap();
	let mut buff = Vec::new();
	let mut byte = [0u8; 1];
	loop
	{
		stdout.read_exact(&mut byte).unwrap();
		if byte[0] == 0x1A {break;}
		buff.push(byte[0]);
	}
	assert_eq!(buff, b"written\n");
	// still waiting on us
	stdin.write_all(b"ignored").unwrap();
	assert!(child.try_wait().unwrap().is_none());
	drop(stdin);

	let start = Instant::now();
	let status = loop
	{
		if let Some(status) = child.try_wait().unwrap() {break status;}
		assert!(start.elapsed() < Duration::from_secs(10), "handshake did not finish");
		std::thread::sleep(Duration::from_millis(10));
	};
	assert!(status.success());
}
