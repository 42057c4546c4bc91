mod helpers;
mod money;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Cents, MoneyConversionError};
pub use secret::Secret;
