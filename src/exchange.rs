use std::collections::HashMap;

use serde::Serialize;

use crate::balance::NetBalances;
use crate::schemas::{Cents, Member, MemberId};

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: MemberId,
    remaining: Cents,
}

/// A payment that moves `amount_cents` from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub from_id: MemberId,
    pub to_id: MemberId,
    pub amount_cents: Cents,
    pub from_name: String,
    pub to_name: String,
}

/// Turns net balances into payments that bring every member back to zero.
///
/// Debtors and creditors are each sorted by id, then matched greedily with two
/// cursors. This yields at most `debtors + creditors - 1` payments, which is
/// not always the fewest possible: finding the true minimum is a subset-sum
/// problem and is not attempted here.
pub fn get_exchanges(balance: &NetBalances, members: &[Member]) -> Vec<Exchange> {
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for (id, amount) in balance {
        let person = PersonalBalance {
            id: id.clone(),
            remaining: amount.abs(),
        };
        if *amount < 0 {
            payers.push(person);
        } else if *amount > 0 {
            receivers.push(person);
        }
    }

    payers.sort_by(|a, b| a.id.cmp(&b.id));
    receivers.sort_by(|a, b| a.id.cmp(&b.id));

    let names: HashMap<&str, &str> = members
        .iter()
        .map(|member| (member.id.as_str(), member.name.as_str()))
        .collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    let mut exchanges = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < payers.len() && j < receivers.len() {
        let payer = &mut payers[i];
        let receiver = &mut receivers[j];
        let pay = payer.remaining.min(receiver.remaining);
        if pay > 0 {
            exchanges.push(Exchange {
                from_id: payer.id.clone(),
                to_id: receiver.id.clone(),
                amount_cents: pay,
                from_name: name_of(&payer.id),
                to_name: name_of(&receiver.id),
            });
        }
        payer.remaining -= pay;
        receiver.remaining -= pay;
        if payer.remaining == 0 {
            i += 1;
        }
        if receiver.remaining == 0 {
            j += 1;
        }
    }

    exchanges
}
