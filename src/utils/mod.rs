pub mod encryption;
pub mod errors;
pub mod money;
pub mod table;
pub mod time;

pub use encryption::{CryptoError, SecretKey};
pub use errors::vendor_error_message;
pub use money::{format_minor_units, parse_minor_units};
pub use table::Table;
pub use time::{parse_paypal_datetime, to_paypal_iso};
