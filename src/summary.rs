use std::collections::HashMap;

use serde::Serialize;

use crate::balance::{compute_net_balances, NetBalances};
use crate::exchange::{get_exchanges, Exchange};
use crate::schemas::{Cents, Expense, Group, Member, Settlement, Weight};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub is_group_admin: bool,
    pub is_program_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareView {
    pub member_id: String,
    pub member_name: String,
    pub weight: Weight,
    pub share_cents: Cents,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: String,
    pub title: String,
    pub amount_cents: Cents,
    pub payer_member_id: String,
    pub payer_name: String,
    pub created_at: String,
    pub shares: Vec<ShareView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group: GroupView,
    pub members: Vec<MemberView>,
    pub expenses: Vec<ExpenseView>,
    pub balances: NetBalances,
    pub transactions: Vec<Exchange>,
}

const UNKNOWN_MEMBER: &str = "-";

/// Builds everything the group page shows from the group's raw rows.
pub fn build_summary(
    group: &Group,
    members: &[Member],
    expenses: &[Expense],
    settlements: &[Settlement],
) -> GroupSummary {
    let balances = compute_net_balances(members, expenses, settlements);
    let transactions = get_exchanges(&balances, members);

    let names: HashMap<&str, &str> = members
        .iter()
        .map(|member| (member.id.as_str(), member.name.as_str()))
        .collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(UNKNOWN_MEMBER).to_string();

    let mut expenses: Vec<&Expense> = expenses.iter().collect();
    expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    GroupSummary {
        group: GroupView {
            id: group.id.clone(),
            name: group.name.clone(),
        },
        members: members
            .iter()
            .map(|member| MemberView {
                id: member.id.clone(),
                name: member.name.clone(),
                is_group_admin: member.is_group_admin,
                is_program_admin: member.is_program_admin,
            })
            .collect(),
        expenses: expenses
            .into_iter()
            .map(|expense| ExpenseView {
                id: expense.id.clone(),
                title: expense.title.clone(),
                amount_cents: expense.amount_cents,
                payer_member_id: expense.payer_member_id.clone(),
                payer_name: name_of(&expense.payer_member_id),
                created_at: expense.created_at.to_rfc3339(),
                shares: expense
                    .shares
                    .iter()
                    .map(|share| ShareView {
                        member_id: share.member_id.clone(),
                        member_name: name_of(&share.member_id),
                        weight: share.weight,
                        share_cents: share.share_cents,
                    })
                    .collect(),
            })
            .collect(),
        balances,
        transactions,
    }
}
