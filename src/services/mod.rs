pub mod invoice_service;
pub mod recurring_service;
pub mod token_service;
pub mod transaction_service;

pub use invoice_service::{
    list_invoices, list_unpaid_or_sent, pay_link_for_latest_unpaid, resolve_pay_link,
};
pub use recurring_service::{detect_recurring, read_rows_csv, RecurringConfig};
pub use token_service::{TokenMode, TokenProvider};
pub use transaction_service::{export_csv, fetch_transactions, TransactionStream};
