//! Allocation of EFT credit across outstanding invoices.
//!
//! The planner is pure: it takes credit balances and invoice balances and
//! returns what to write. Invoices are settled lowest id first, and each
//! invoice is funded from the oldest credit rows first. Persisting the plan is
//! the job of [`crate::services::Database`].

use crate::models::{InvoiceReferenceStatus, InvoiceStatus};
use rust_decimal::Decimal;

/// Unconsumed part of one credit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditBalance {
    pub credit_id: i64,
    pub remaining: Decimal,
}

/// Invoice that may still receive credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingInvoice {
    pub invoice_id: i64,
    pub total: Decimal,
    pub paid: Decimal,
}

/// Credit applied to a single invoice in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceApplication {
    pub invoice_id: i64,
    pub total: Decimal,
    pub applied: Decimal,
    /// Paid amount after this application.
    pub paid: Decimal,
}

impl InvoiceApplication {
    pub fn is_fully_paid(&self) -> bool {
        self.paid >= self.total
    }

    pub fn status(&self) -> InvoiceStatus {
        if self.is_fully_paid() {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        }
    }

    pub fn reference_status(&self) -> InvoiceReferenceStatus {
        if self.is_fully_paid() {
            InvoiceReferenceStatus::Completed
        } else {
            InvoiceReferenceStatus::Active
        }
    }
}

/// Portion of one credit consumed by one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditDraw {
    pub credit_id: i64,
    pub invoice_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditApplicationPlan {
    pub invoices: Vec<InvoiceApplication>,
    pub draws: Vec<CreditDraw>,
    /// New balances of the credit rows that were drawn from.
    pub credits: Vec<CreditBalance>,
}

impl CreditApplicationPlan {
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    pub fn total_applied(&self) -> Decimal {
        self.invoices.iter().map(|i| i.applied).sum()
    }
}

/// Spread available credit over invoices.
///
/// Each invoice receives `min(remaining credit, total - paid)`. Credits and
/// invoices are processed in ascending id order regardless of input order.
/// Non-positive balances are ignored on both sides.
pub fn plan_credit_application(
    credits: &[CreditBalance],
    invoices: &[OutstandingInvoice],
) -> CreditApplicationPlan {
    let mut balances: Vec<CreditBalance> = credits
        .iter()
        .copied()
        .filter(|c| c.remaining > Decimal::ZERO)
        .collect();
    balances.sort_by_key(|c| c.credit_id);

    let mut ordered: Vec<OutstandingInvoice> = invoices.to_vec();
    ordered.sort_by_key(|i| i.invoice_id);

    let mut plan = CreditApplicationPlan::default();
    let mut available: Decimal = balances.iter().map(|c| c.remaining).sum();
    let mut cursor = 0;

    for invoice in ordered {
        if available <= Decimal::ZERO {
            break;
        }

        let outstanding = invoice.total - invoice.paid;
        if outstanding <= Decimal::ZERO {
            continue;
        }

        let applied = available.min(outstanding);
        let mut to_draw = applied;

        while to_draw > Decimal::ZERO && cursor < balances.len() {
            let credit = &mut balances[cursor];
            let take = credit.remaining.min(to_draw);
            credit.remaining -= take;
            to_draw -= take;

            plan.draws.push(CreditDraw {
                credit_id: credit.credit_id,
                invoice_id: invoice.invoice_id,
                amount: take,
            });

            if credit.remaining == Decimal::ZERO {
                cursor += 1;
            }
        }

        available -= applied;
        plan.invoices.push(InvoiceApplication {
            invoice_id: invoice.invoice_id,
            total: invoice.total,
            applied,
            paid: invoice.paid + applied,
        });
    }

    plan.credits = balances
        .into_iter()
        .filter(|c| plan.draws.iter().any(|d| d.credit_id == c.credit_id))
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credit(credit_id: i64, remaining: Decimal) -> CreditBalance {
        CreditBalance {
            credit_id,
            remaining,
        }
    }

    fn invoice(invoice_id: i64, total: Decimal, paid: Decimal) -> OutstandingInvoice {
        OutstandingInvoice {
            invoice_id,
            total,
            paid,
        }
    }

    #[test]
    fn two_credits_pay_first_invoice_and_part_of_second() {
        let plan = plan_credit_application(
            &[credit(1, dec!(50)), credit(2, dec!(150))],
            &[invoice(10, dec!(50), dec!(0)), invoice(11, dec!(200), dec!(0))],
        );

        assert_eq!(plan.invoices.len(), 2);

        let first = plan.invoices[0];
        assert_eq!(first.invoice_id, 10);
        assert_eq!(first.applied, dec!(50));
        assert_eq!(first.paid, dec!(50));
        assert_eq!(first.status(), InvoiceStatus::Paid);
        assert_eq!(first.reference_status(), InvoiceReferenceStatus::Completed);

        let second = plan.invoices[1];
        assert_eq!(second.invoice_id, 11);
        assert_eq!(second.applied, dec!(150));
        assert_eq!(second.paid, dec!(150));
        assert_eq!(second.status(), InvoiceStatus::Partial);
        assert_eq!(second.reference_status(), InvoiceReferenceStatus::Active);

        assert_eq!(plan.credits, vec![credit(1, dec!(0)), credit(2, dec!(0))]);
        assert_eq!(plan.total_applied(), dec!(200));
    }

    #[test]
    fn draws_come_from_oldest_credit_first() {
        let plan = plan_credit_application(
            &[credit(7, dec!(30)), credit(3, dec!(20))],
            &[invoice(1, dec!(40), dec!(0))],
        );

        assert_eq!(
            plan.draws,
            vec![
                CreditDraw {
                    credit_id: 3,
                    invoice_id: 1,
                    amount: dec!(20)
                },
                CreditDraw {
                    credit_id: 7,
                    invoice_id: 1,
                    amount: dec!(20)
                },
            ]
        );
        assert_eq!(plan.credits, vec![credit(3, dec!(0)), credit(7, dec!(10))]);
    }

    #[test]
    fn invoices_are_settled_lowest_id_first() {
        let plan = plan_credit_application(
            &[credit(1, dec!(25))],
            &[invoice(9, dec!(100), dec!(0)), invoice(4, dec!(100), dec!(0))],
        );

        assert_eq!(plan.invoices.len(), 1);
        assert_eq!(plan.invoices[0].invoice_id, 4);
        assert_eq!(plan.invoices[0].applied, dec!(25));
    }

    #[test]
    fn never_exceeds_outstanding_balance() {
        let plan = plan_credit_application(
            &[credit(1, dec!(500))],
            &[invoice(1, dec!(80), dec!(30))],
        );

        assert_eq!(plan.invoices[0].applied, dec!(50));
        assert_eq!(plan.invoices[0].paid, dec!(80));
        assert_eq!(plan.credits, vec![credit(1, dec!(450))]);
    }

    #[test]
    fn applied_equals_sum_of_draws_per_invoice() {
        let plan = plan_credit_application(
            &[credit(1, dec!(10.25)), credit(2, dec!(5.50)), credit(3, dec!(99))],
            &[
                invoice(1, dec!(12), dec!(0)),
                invoice(2, dec!(3.75), dec!(1)),
                invoice(3, dec!(1000), dec!(0)),
            ],
        );

        for application in &plan.invoices {
            let drawn: Decimal = plan
                .draws
                .iter()
                .filter(|d| d.invoice_id == application.invoice_id)
                .map(|d| d.amount)
                .sum();
            assert_eq!(drawn, application.applied);
            assert!(application.paid <= application.total);
        }

        let consumed: Decimal = plan.draws.iter().map(|d| d.amount).sum();
        assert_eq!(consumed, plan.total_applied());
        assert_eq!(plan.total_applied(), dec!(114.75));
    }

    #[test]
    fn settled_and_zero_balances_are_skipped() {
        let plan = plan_credit_application(
            &[credit(1, dec!(0)), credit(2, dec!(10))],
            &[invoice(1, dec!(20), dec!(20)), invoice(2, dec!(5), dec!(0))],
        );

        assert_eq!(plan.invoices.len(), 1);
        assert_eq!(plan.invoices[0].invoice_id, 2);
        assert_eq!(plan.credits, vec![credit(2, dec!(5))]);
    }

    #[test]
    fn no_credit_means_empty_plan() {
        let plan = plan_credit_application(&[], &[invoice(1, dec!(20), dec!(0))]);
        assert!(plan.is_empty());
        assert!(plan.draws.is_empty());
        assert!(plan.credits.is_empty());
    }
}
