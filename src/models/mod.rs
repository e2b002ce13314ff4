//! Domain models shared by the services and the CLI

pub mod invoice;
pub mod recurring;
pub mod token;
pub mod transaction;
pub mod window;

pub use invoice::{Invoice, InvoiceStatus};
pub use recurring::{DayBucket, RecurringPattern, SKIPPED_STATUSES};
pub use token::{AccessToken, TokenKind};
pub use transaction::{Amount, TransactionRecord, TransactionRow};
pub use window::{TimeWindow, MAX_WINDOW_DAYS};
