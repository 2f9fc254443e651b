//! Balance recalculation.
//!
//! Balances are derived from the complete expense set of a group and never
//! patched incrementally, so recomputing the same set twice always yields the
//! same sheet. This is what makes redelivered recalculation requests harmless.

use crate::core::models::{balance::BalanceSheet, expense::Expense};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Absolute tolerance for the zero-sum invariant. Shares are computed with
/// 28 significant digits, so real drift is far below this.
pub const ZERO_SUM_TOLERANCE: Decimal = dec!(0.000001);

/// Computes the net balance of every member that appears in `expenses`.
///
/// The payer is credited the full amount and every participant, the payer
/// included when listed, is debited an equal share. Members that never appear
/// get no entry.
pub fn recalculate<'a, I>(expenses: I) -> BalanceSheet
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut balances = BalanceSheet::new();

    for expense in expenses {
        // empty splits are rejected when the expense is recorded
        let Some(share) = expense
            .amount
            .checked_div(Decimal::from(expense.split_between.len()))
        else {
            continue;
        };

        *balances.entry(expense.paid_by.clone()).or_insert(Decimal::ZERO) += expense.amount;
        for member in &expense.split_between {
            *balances.entry(member.clone()).or_insert(Decimal::ZERO) -= share;
        }
    }

    balances
}

/// Sum of all entries. Zero for any sheet produced by [`recalculate`], up to
/// [`ZERO_SUM_TOLERANCE`].
pub fn imbalance(balances: &BalanceSheet) -> Decimal {
    balances.values().copied().sum()
}

pub fn is_balanced(balances: &BalanceSheet) -> bool {
    imbalance(balances).abs() <= ZERO_SUM_TOLERANCE
}
