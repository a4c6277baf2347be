mod num_enum;

pub(crate) use num_enum::numeric_enum;
