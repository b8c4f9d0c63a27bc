mod env;

pub use env::{ConfigError, parse, parse_prefixed};
