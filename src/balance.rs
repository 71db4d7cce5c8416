use std::collections::HashMap;

use crate::schemas::{Cents, Expense, Member, MemberId, Settlement};

/// Positive: the member is owed money. Negative: the member owes money.
pub type NetBalances = HashMap<MemberId, Cents>;

fn adjust(balance: &mut NetBalances, member_id: &str, amount: Cents) {
    balance
        .entry(member_id.to_string())
        .and_modify(|v| *v += amount)
        .or_insert(amount);
}

/// Folds every share and settlement of a group into one net position per member.
///
/// Every known member starts at zero. A payer's own share is skipped, since it
/// is not owed to anyone. Ids that appear in rows but not in `members` are
/// kept as extra entries rather than rejected.
pub fn compute_net_balances(
    members: &[Member],
    expenses: &[Expense],
    settlements: &[Settlement],
) -> NetBalances {
    let mut balance: NetBalances = members.iter().map(|member| (member.id.clone(), 0)).collect();

    for expense in expenses {
        for share in &expense.shares {
            if share.member_id == expense.payer_member_id {
                continue;
            }
            adjust(&mut balance, &share.member_id, -share.share_cents);
            adjust(&mut balance, &expense.payer_member_id, share.share_cents);
        }
    }

    for settlement in settlements {
        adjust(&mut balance, &settlement.from_member_id, settlement.amount_cents);
        adjust(&mut balance, &settlement.to_member_id, -settlement.amount_cents);
    }

    balance
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn members() -> Vec<Member> {
        vec![member("A", "Anna"), member("B", "Bruno"), member("C", "Carla")]
    }

    #[test]
    fn payer_own_share_is_excluded() {
        let expenses = vec![expense("A", &[("A", 333), ("B", 333), ("C", 333)])];
        let balance = compute_net_balances(&members(), &expenses, &[]);
        assert_eq!(balance["A"], 666);
        assert_eq!(balance["B"], -333);
        assert_eq!(balance["C"], -333);
    }

    #[test]
    fn members_without_activity_start_at_zero() {
        let balance = compute_net_balances(&members(), &[], &[]);
        assert_eq!(balance.len(), 3);
        assert!(balance.values().all(|v| *v == 0));
    }

    #[test]
    fn settlement_reduces_outstanding_debt() {
        let expenses = vec![expense("A", &[("A", 500), ("B", 500)])];
        let settlements = vec![settlement("B", "A", 200)];
        let balance = compute_net_balances(&members(), &expenses, &settlements);
        assert_eq!(balance["A"], 300);
        assert_eq!(balance["B"], -300);
        assert_eq!(balance["C"], 0);
    }

    #[test]
    fn balances_always_sum_to_zero() {
        let expenses = vec![
            expense("A", &[("A", 120), ("B", 80), ("C", 45)]),
            expense("C", &[("B", 1000)]),
            expense("B", &[("A", 7), ("B", 7), ("C", 6)]),
        ];
        let settlements = vec![settlement("B", "C", 400), settlement("A", "B", 13)];
        let balance = compute_net_balances(&members(), &expenses, &settlements);
        assert_eq!(balance.values().sum::<Cents>(), 0);
    }

    #[test]
    fn processing_order_does_not_matter() {
        let mut expenses = vec![
            expense("A", &[("B", 80), ("C", 45)]),
            expense("C", &[("A", 10), ("B", 90)]),
        ];
        let mut settlements = vec![settlement("B", "C", 40), settlement("C", "A", 5)];
        let forward = compute_net_balances(&members(), &expenses, &settlements);
        expenses.reverse();
        settlements.reverse();
        let backward = compute_net_balances(&members(), &expenses, &settlements);
        assert_eq!(forward, backward);
    }

    #[test]
    fn many_expenses_at_the_amount_cap_stay_exact() {
        let cap = crate::requests::MAX_AMOUNT_CENTS;
        let expenses: Vec<Expense> = (0..1_000)
            .map(|i| match i % 3 {
                0 => expense("A", &[("B", cap)]),
                1 => expense("A", &[("C", cap)]),
                _ => expense("B", &[("C", cap)]),
            })
            .collect();
        let balance = compute_net_balances(&members(), &expenses, &[]);
        assert_eq!(balance["A"], 667 * cap);
        assert_eq!(balance["C"], -666 * cap);
        assert_eq!(balance.values().sum::<Cents>(), 0);
    }

    #[test]
    fn unknown_members_are_tolerated() {
        let expenses = vec![expense("A", &[("gone", 250)])];
        let balance = compute_net_balances(&members(), &expenses, &[]);
        assert_eq!(balance["gone"], -250);
        assert_eq!(balance["A"], 250);
        assert_eq!(balance.values().sum::<Cents>(), 0);
    }
}
