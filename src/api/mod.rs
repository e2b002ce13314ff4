//! Vendor API clients

pub mod paypal;
