//! Invoice models

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::api::paypal::models::InvoiceResource;
use crate::utils::parse_paypal_datetime;
use crate::utils::time::parse_date;

/// Invoice lifecycle state as reported by the invoicing API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    Draft,
    Unpaid,
    Sent,
    Scheduled,
    Paid,
    MarkedAsPaid,
    PartiallyPaid,
    Cancelled,
    Refunded,
    PartiallyRefunded,
    MarkedAsRefunded,
    PaymentPending,
    Other(String),
}

impl InvoiceStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Self::Draft,
            "UNPAID" => Self::Unpaid,
            "SENT" => Self::Sent,
            "SCHEDULED" => Self::Scheduled,
            "PAID" => Self::Paid,
            "MARKED_AS_PAID" => Self::MarkedAsPaid,
            "PARTIALLY_PAID" => Self::PartiallyPaid,
            "CANCELLED" => Self::Cancelled,
            "REFUNDED" => Self::Refunded,
            "PARTIALLY_REFUNDED" => Self::PartiallyRefunded,
            "MARKED_AS_REFUNDED" => Self::MarkedAsRefunded,
            "PAYMENT_PENDING" => Self::PaymentPending,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "DRAFT",
            Self::Unpaid => "UNPAID",
            Self::Sent => "SENT",
            Self::Scheduled => "SCHEDULED",
            Self::Paid => "PAID",
            Self::MarkedAsPaid => "MARKED_AS_PAID",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
            Self::MarkedAsRefunded => "MARKED_AS_REFUNDED",
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::Other(s) => s,
        }
    }

    /// A payer can still be sent to a payment link
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Unpaid | Self::Sent)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    pub status: InvoiceStatus,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub create_time: Option<DateTime<Utc>>,
    pub payer_view_url: Option<String>,
}

impl From<InvoiceResource> for Invoice {
    fn from(resource: InvoiceResource) -> Self {
        let detail = resource.detail.unwrap_or_default();
        let metadata = detail.metadata.unwrap_or_default();

        let status = detail
            .status
            .or(resource.status)
            .map(|s| InvoiceStatus::parse(&s))
            .unwrap_or_else(|| InvoiceStatus::Other(String::new()));

        Self {
            id: resource.id.unwrap_or_default(),
            status,
            invoice_number: detail.invoice_number,
            invoice_date: detail.invoice_date.as_deref().and_then(parse_date),
            create_time: metadata.create_time.as_deref().and_then(parse_paypal_datetime),
            payer_view_url: metadata.recipient_view_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

impl Invoice {
    /// Invoice date, or the creation timestamp when the invoice has no date
    pub fn recency_key(&self) -> Option<DateTime<Utc>> {
        self.invoice_date
            .map(crate::utils::time::start_of_day)
            .or(self.create_time)
    }

    /// Most recent first; invoices with no date at all go last
    pub fn cmp_latest_first(a: &Self, b: &Self) -> Ordering {
        match (a.recency_key(), b.recency_key()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(json: serde_json::Value) -> InvoiceResource {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(InvoiceStatus::parse("UNPAID"), InvoiceStatus::Unpaid);
        assert_eq!(InvoiceStatus::parse("marked_as_paid"), InvoiceStatus::MarkedAsPaid);
        assert_eq!(
            InvoiceStatus::parse("SOMETHING_NEW"),
            InvoiceStatus::Other("SOMETHING_NEW".into())
        );
        assert!(InvoiceStatus::Sent.is_payable());
        assert!(InvoiceStatus::Unpaid.is_payable());
        assert!(!InvoiceStatus::Paid.is_payable());
        assert!(!InvoiceStatus::Draft.is_payable());
    }

    #[test]
    fn test_from_resource() {
        let invoice = Invoice::from(resource(serde_json::json!({
            "id": "INV2-ABCD",
            "status": "SENT",
            "detail": {
                "invoice_number": "0042",
                "invoice_date": "2024-04-02",
                "metadata": {
                    "create_time": "2024-04-01T09:00:00Z",
                    "recipient_view_url": "https://www.sandbox.paypal.com/invoice/p/#ABCD"
                }
            }
        })));

        assert_eq!(invoice.id, "INV2-ABCD");
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.invoice_number.as_deref(), Some("0042"));
        assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2024, 4, 2));
        assert!(invoice.payer_view_url.is_some());
    }

    #[test]
    fn test_blank_url_is_absent() {
        let invoice = Invoice::from(resource(serde_json::json!({
            "id": "INV2-X",
            "detail": {"status": "UNPAID", "metadata": {"recipient_view_url": "  "}}
        })));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(invoice.payer_view_url.is_none());
    }

    #[test]
    fn test_latest_first_ordering() {
        let dated = Invoice::from(resource(serde_json::json!({
            "id": "A", "detail": {"invoice_date": "2024-03-01"}
        })));
        let created_only = Invoice::from(resource(serde_json::json!({
            "id": "B", "detail": {"metadata": {"create_time": "2024-03-05T00:00:00Z"}}
        })));
        let undated = Invoice::from(resource(serde_json::json!({"id": "C"})));

        let mut invoices = vec![undated, dated, created_only];
        invoices.sort_by(Invoice::cmp_latest_first);

        let ids: Vec<&str> = invoices.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }
}
