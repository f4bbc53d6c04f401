//! Status and method codes persisted as text columns.

use serde::{Deserialize, Serialize};

/// Payment method of an account or invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Eft,
    OnlineBanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Eft => "EFT",
            PaymentMethod::OnlineBanking => "ONLINE_BANKING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EFT" => Some(PaymentMethod::Eft),
            "ONLINE_BANKING" => Some(PaymentMethod::OnlineBanking),
            _ => None,
        }
    }
}

/// Back-office system that settles a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentSystem {
    Paybc,
    Cgi,
}

impl PaymentSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentSystem::Paybc => "PAYBC",
            PaymentSystem::Cgi => "CGI",
        }
    }
}

/// Invoice lifecycle: CREATED -> PARTIAL -> PAID, or CREATED -> DELETED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Created,
    Partial,
    Paid,
    Deleted,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Created => "CREATED",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Deleted => "DELETED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "PARTIAL" => InvoiceStatus::Partial,
            "PAID" => InvoiceStatus::Paid,
            "DELETED" => InvoiceStatus::Deleted,
            _ => InvoiceStatus::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceReferenceStatus {
    Active,
    Completed,
    Cancelled,
}

impl InvoiceReferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceReferenceStatus::Active => "ACTIVE",
            InvoiceReferenceStatus::Completed => "COMPLETED",
            InvoiceReferenceStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "CREATED",
            PaymentStatus::Completed => "COMPLETED",
        }
    }
}

/// Operation recorded in the short-name history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Insert,
    Update,
}

impl HistoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryOperation::Insert => "INSERT",
            HistoryOperation::Update => "UPDATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_round_trips_through_text() {
        for method in [PaymentMethod::Eft, PaymentMethod::OnlineBanking] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("CASH"), None);
    }

    #[test]
    fn unknown_invoice_status_falls_back_to_created() {
        assert_eq!(InvoiceStatus::from_string("PAID"), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_string("bogus"), InvoiceStatus::Created);
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::OnlineBanking).unwrap();
        assert_eq!(json, "\"ONLINE_BANKING\"");
        let status: InvoiceStatus = serde_json::from_str("\"PARTIAL\"").unwrap();
        assert_eq!(status, InvoiceStatus::Partial);
    }
}
