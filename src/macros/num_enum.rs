macro_rules!numeric_enum
{
	{
		$(#[$ext:ident $(($($ext_args:tt)*))?])*
		enum $tname:ident {$($var_name:ident $(= $var_val:literal)? $(=> $var_label:literal)?),* $(,)?}
	} =>
	{
		// recursive so every extension sees the full variant list (rust won't zip `$ext` with `$var_name`)
		$crate::macros::numeric_enum!(@impl/ext $tname {$($var_name $(= $var_val)? $(=> $var_label)?),*} $({$ext($($($ext_args)*)?)})*);
	};
	(@impl/ext $tname:ident {$($var:tt)*}) => {};
	{
		@impl/ext $tname:ident {$($var:tt)*}
		{$ext0:ident($($ext0_args:tt)*)} $($more_ext:tt)*
	} =>
	{
		$crate::macros::numeric_enum!(@impl/ext/$ext0 $tname {$($var)*} ($($ext0_args)*));
		$crate::macros::numeric_enum!(@impl/ext $tname {$($var)*} $($more_ext)*);
	};
	{
		@impl/ext/enum $tname:ident {$($var_name:ident $(= $var_val:literal)? $(=> $var_label:literal)?),*}
		($vis:vis $numeric:ty $(, derive($derives:ident))*)
	} =>
	{
		#[repr($numeric)]
		#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd $(, $derives)*)]
		$vis enum $tname
		{
			$($var_name $(= $var_val)?,)+
		}
	};
	{
		@impl/ext/TryFrom $tname:ident {$($var_name:ident $(= $var_val:literal)? $(=> $var_label:literal)?),*}
		($numeric:ty => $error:ident $(: $($feat:ident($($feat_args:tt)*)),+)?)
	} =>
	{
		$crate::macros::numeric_enum!(@impl/ext/TryFrom/feat $tname $numeric => $error $($({$feat($($feat_args)*)})+)?);

		impl TryFrom<$numeric> for $tname
		{
			type Error = $error;

			#[allow(non_upper_case_globals)]
			fn try_from(value: $numeric) -> Result<Self, $error>
			{
				$(const $var_name: $numeric = $tname::$var_name as $numeric;)+
				match value
				{
					$($var_name => Ok(Self::$var_name),)+
					_ => Err($error(value)),
				}
			}
		}
	};
	(@impl/ext/TryFrom/feat $tname:ident $numeric:ty => $error:ident) => {};
	{
		@impl/ext/TryFrom/feat $tname:ident $numeric:ty => $error:ident
		{$feat0:ident($($feat0_args:tt)*)} $($more_feat:tt)*
	} =>
	{
		$crate::macros::numeric_enum!(@impl/ext/TryFrom/feat/$feat0 $tname $numeric => $error ($($feat0_args)*));
		$crate::macros::numeric_enum!(@impl/ext/TryFrom/feat $tname $numeric => $error $($more_feat)*);
	};
	(@impl/ext/TryFrom/feat/as $tname:ident $numeric:ty => $error:ident ($vis:vis struct)) =>
	{
		#[derive(Copy, Clone, Debug, Eq, PartialEq)]
		$vis struct $error($vis $numeric);
	};
	(@impl/ext/TryFrom/feat/derive $tname:ident $numeric:ty => $error:ident (Display)) =>
	{
		impl core::fmt::Display for $error
		{
			fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
			{
				write!(f, "no variant of {} for value {:#x}", stringify!($tname), self.0)
			}
		}
	};
	(@impl/ext/TryFrom/feat/derive $tname:ident $numeric:ty => $error:ident (Error)) =>
	{
		impl std::error::Error for $error {}
	};
	{
		@impl/ext/Into $tname:ident {$($var:tt)*}
		($numeric:ty)
	} =>
	{
		impl From<$tname> for $numeric
		{
			fn from(value: $tname) -> $numeric
			{
				value as $numeric
			}
		}
	};
	{
		@impl/ext/Label $tname:ident {$($var_name:ident $(= $var_val:literal)? $(=> $var_label:literal)?),*}
		()
	} =>
	{
		impl $tname
		{
			/// Short human-readable name of this variant.
			pub const fn label(self) -> &'static str
			{
				match self
				{
					$(Self::$var_name => $crate::macros::numeric_enum!(@label $var_name $($var_label)?),)+
				}
			}
		}

		impl core::fmt::Display for $tname
		{
			fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
			{
				f.write_str(self.label())
			}
		}
	};
	(@label $var_name:ident) => {stringify!($var_name)};
	(@label $var_name:ident $var_label:literal) => {$var_label};
}
pub(crate) use numeric_enum;
