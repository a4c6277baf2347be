use std::fs::File;
use std::io::Stdout;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use fwout::{fatal, warning};
use fwout::handshake::handshake_exit;
use fwout::hexstr::{bytes_to_hex, hex_to_bytes};
use fwout::pretty::{format_pretty, format_pretty_auto, Units};
use fwout::report::EXIT_FAILURE;
use fwout::resource::archive_filename_to_resource;
use fwout::{Context, Fatal, OutputMode};

#[derive(Parser)]
#[command(name = "fwout", version, about = "Diagnostic output and helpers for firmware update scripts")]
struct Cli
{
	/// Frame all output for a supervising program
	#[arg(long)]
	framing: bool,

	/// How plain text shares the terminal with a progress bar
	#[arg(long, value_enum, default_value_t = ProgressMode::Quiet)]
	progress: ProgressMode,

	/// Send Ctrl+Z after a successful run and wait for stdin to close
	#[arg(long)]
	exit_handshake: bool,

	/// More logging on stderr (repeatable)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ProgressMode
{
	/// A progress bar is redrawn on the current line
	Normal,
	/// Nothing else is written to the terminal
	Quiet,
}

#[derive(Subcommand)]
enum Command
{
	/// Report a warning and carry on
	Warn
	{
		message: String,
	},
	/// Report a fatal error and exit
	Fail
	{
		#[arg(long, default_value_t = EXIT_FAILURE)]
		status: i32,
		message: String,
	},
	/// Open a file, reporting a fatal error with the OS reason if that fails
	FailOpen
	{
		#[arg(long, default_value_t = EXIT_FAILURE)]
		status: i32,
		path: PathBuf,
		message: String,
	},
	/// Report success
	Success
	{
		message: String,
	},
	/// Report a completion percentage
	Progress
	{
		percent: u16,
	},
	/// Print the hex encoding of a string
	HexEncode
	{
		text: String,
	},
	/// Decode a hex string into at most `max` bytes
	HexDecode
	{
		hex: String,
		#[arg(long)]
		max: Option<usize>,
	},
	/// Print a byte count in human-readable form
	Pretty
	{
		amount: u64,
		/// bytes, KiB, MiB, GiB, TiB, KB, MB, GB or TB (picked automatically if absent)
		#[arg(long)]
		units: Option<String>,
	},
	/// Print the creation timestamp of this run
	Timestamp,
	/// Print the resource name of an archive member
	Resource
	{
		name: String,
	},
	/// Allocate a page-aligned buffer
	Alloc
	{
		size: usize,
	},
	/// Perform the exit handshake
	Handshake,
}

fn run(ctx: &mut Context<Stdout>, command: Command) -> Result<(), Fatal>
{
	match command
	{
		Command::Warn{message} => warning!(ctx, "{message}"),
		Command::Fail{status, message} => return Err(fatal!(ctx, status, "{message}")),
		Command::FailOpen{status, path, message} =>
		{
			let file = match File::open(&path)
			{
				Ok(file) => file,
				Err(e) => return Err(ctx.fatal_io(status, &e, format_args!("{message}"))),
			};
			drop(file);
			ctx.success(format_args!("opened {}", path.display()));
		},
		Command::Success{message} => ctx.success(format_args!("{message}")),
		Command::Progress{percent} => ctx.progress(percent),
		Command::HexEncode{text} => ctx.success(format_args!("{}", bytes_to_hex(text.as_bytes()))),
		Command::HexDecode{hex, max} =>
		{
			let mut buff = vec![0u8; max.unwrap_or(hex.len() / 2)];
			match hex_to_bytes(&hex, &mut buff)
			{
				Ok(len) => ctx.success(format_args!("{}", String::from_utf8_lossy(&buff[..len]))),
				Err(e) => return Err(fatal!(ctx, EXIT_FAILURE, "hex-decode: {e}")),
			}
		},
		Command::Pretty{amount, units} =>
		{
			let text = match units
			{
				None => format_pretty_auto(amount),
				Some(label) => match Units::from_label(&label)
				{
					Some(units) => format_pretty(amount, units),
					None => return Err(fatal!(ctx, EXIT_FAILURE, "unknown units {label:?}")),
				},
			};
			ctx.success(format_args!("{text}"));
		},
		Command::Timestamp =>
		{
			let now = ctx.creation_timestamp().to_owned();
			ctx.success(format_args!("{now}"));
		},
		Command::Resource{name} => match archive_filename_to_resource(&name)
		{
			Ok(resource) => ctx.success(format_args!("{resource}")),
			Err(e) => return Err(fatal!(ctx, EXIT_FAILURE, "{e}")),
		},
		Command::Alloc{size} =>
		{
			let buff = ctx.alloc_page_aligned(size)?;
			let aligned = buff.as_ptr() as usize % buff.page_size() == 0;
			ctx.success(format_args!("{} bytes, page size {}, aligned {aligned}", buff.len(), buff.page_size()));
		},
		Command::Handshake => handshake_exit(),
	}
	Ok(())
}

fn init_logging(verbose: u8)
{
	let level = match verbose
	{
		0 => LevelFilter::WARN,
		1 => LevelFilter::INFO,
		2 => LevelFilter::DEBUG,
		_ => LevelFilter::TRACE,
	};
	// stdout carries the protocol, so logs go to stderr
	tracing_subscriber::fmt().with_writer(std::io::stderr).without_time().with_max_level(level).init();
}

pub fn main()
{
	let cli = Cli::parse();
	init_logging(cli.verbose);
	let mode = match (cli.framing, cli.progress)
	{
		(true, _) => OutputMode::Framed,
		(false, ProgressMode::Normal) => OutputMode::PlainProgress,
		(false, ProgressMode::Quiet) => OutputMode::PlainQuiet,
	};
	let mut ctx = Context::stdout(mode);
	match run(&mut ctx, cli.command)
	{
		Ok(()) =>
		{
			if cli.exit_handshake {handshake_exit();}
		},
		Err(fatal) => fatal.exit(),
	}
}
