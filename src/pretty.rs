use crate::macros::numeric_enum;

numeric_enum!
{
	#[enum(pub u64)]
	#[TryFrom(u64 => UnknownUnits: as(pub struct), derive(Display), derive(Error))]
	#[Into(u64)]
	#[Label]
	enum Units
	{
		Bytes = 1 => "bytes",
		KiB = 1024,
		MiB = 1048576,
		GiB = 1073741824,
		TiB = 1099511627776,
		KB = 1000,
		MB = 1000000,
		GB = 1000000000,
		TB = 1000000000000,
	}
}

impl Units
{
	pub fn factor(self) -> u64
	{
		self as u64
	}

	/// Parses a unit label as printed by [`Units::label`].
	pub fn from_label(label: &str) -> Option<Self>
	{
		const ALL: [Units; 9] = [
			Units::Bytes, Units::KiB, Units::MiB, Units::GiB, Units::TiB,
			Units::KB, Units::MB, Units::GB, Units::TB,
		];
		ALL.into_iter().find(|u| u.label() == label)
	}
}

/// The largest decimal unit not exceeding `amount`.
pub fn natural_units(amount: u64) -> Units
{
	match amount
	{
		a if a >= Units::TB.factor() => Units::TB,
		a if a >= Units::GB.factor() => Units::GB,
		a if a >= Units::MB.factor() => Units::MB,
		a if a >= Units::KB.factor() => Units::KB,
		_ => Units::Bytes,
	}
}

pub fn format_pretty(amount: u64, units: Units) -> String
{
	format!("{:.2} {}", amount as f64 / units.factor() as f64, units.label())
}

pub fn format_pretty_auto(amount: u64) -> String
{
	format_pretty(amount, natural_units(amount))
}
