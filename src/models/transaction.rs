//! Transaction models

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::api::paypal::models::TransactionDetail;
use crate::utils::{parse_minor_units, parse_paypal_datetime};

/// Monetary amount as PayPal reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// Decimal string, e.g. "-50.00"
    pub value: String,
    pub currency: String,
}

impl Amount {
    pub fn minor_units(&self) -> Option<i64> {
        parse_minor_units(&self.value)
    }
}

/// One transaction from the reporting API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: String,
    pub initiation_time: Option<DateTime<Utc>>,
    /// PayPal event status code: S, P, D or V
    pub status: String,
    pub amount: Option<Amount>,
    pub payer_email: Option<String>,
}

impl From<TransactionDetail> for TransactionRecord {
    fn from(detail: TransactionDetail) -> Self {
        let info = detail.transaction_info.unwrap_or_default();
        let payer = detail.payer_info.unwrap_or_default();

        Self {
            id: info.transaction_id.unwrap_or_default(),
            initiation_time: info
                .transaction_initiation_date
                .as_deref()
                .and_then(parse_paypal_datetime),
            status: info.transaction_status.unwrap_or_default(),
            amount: info.transaction_amount.map(|m| Amount {
                value: m.value,
                currency: m.currency_code,
            }),
            payer_email: payer.email_address,
        }
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dash = "-".to_string();
        write!(
            f,
            "ID: {} | Time: {} | Status: {} | Amount: {} {} | Payer: {}",
            or_dash(&self.id),
            self.initiation_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| dash.clone()),
            or_dash(&self.status),
            self.amount.as_ref().map(|a| &a.value).unwrap_or(&dash),
            self.amount.as_ref().map(|a| &a.currency).unwrap_or(&dash),
            self.payer_email.as_ref().unwrap_or(&dash),
        )
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Flat row of the CSV export: `id,time,status,amount,currency,payer_email`
///
/// Also the input shape of the recurring-payment detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub time: String,
    pub status: String,
    pub amount: String,
    pub currency: String,
    pub payer_email: String,
}

impl From<&TransactionRecord> for TransactionRow {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            id: record.id.clone(),
            time: record
                .initiation_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            status: record.status.clone(),
            amount: record.amount.as_ref().map(|a| a.value.clone()).unwrap_or_default(),
            currency: record.amount.as_ref().map(|a| a.currency.clone()).unwrap_or_default(),
            payer_email: record.payer_email.clone().unwrap_or_default(),
        }
    }
}

impl TransactionRow {
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        parse_paypal_datetime(&self.time)
    }

    pub fn amount_minor(&self) -> Option<i64> {
        parse_minor_units(&self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_detail() -> TransactionDetail {
        serde_json::from_value(serde_json::json!({
            "transaction_info": {
                "transaction_id": "5TY05013RG002845M",
                "transaction_initiation_date": "2024-01-05T10:11:12+0000",
                "transaction_status": "S",
                "transaction_amount": {"currency_code": "USD", "value": "-50.00"}
            },
            "payer_info": {"email_address": "billing@gym.example"}
        }))
        .unwrap()
    }

    #[test]
    fn test_record_from_detail() {
        let record = TransactionRecord::from(sample_detail());
        assert_eq!(record.id, "5TY05013RG002845M");
        assert_eq!(
            record.initiation_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 11, 12).unwrap())
        );
        assert_eq!(record.amount.as_ref().and_then(Amount::minor_units), Some(-5000));
        assert_eq!(record.payer_email.as_deref(), Some("billing@gym.example"));
    }

    #[test]
    fn test_missing_sections_become_empty() {
        let record = TransactionRecord::from(TransactionDetail::default());
        assert_eq!(record.id, "");
        assert!(record.amount.is_none());
        assert_eq!(
            record.to_string(),
            "ID: - | Time: - | Status: - | Amount: - - | Payer: -"
        );
    }

    #[test]
    fn test_row_conversion() {
        let row = TransactionRow::from(&TransactionRecord::from(sample_detail()));
        assert_eq!(row.time, "2024-01-05T10:11:12Z");
        assert_eq!(row.amount, "-50.00");
        assert_eq!(row.currency, "USD");
        assert_eq!(row.parsed_time().map(|t| t.timestamp()), Some(1704449472));
    }
}
