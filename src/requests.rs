//! Request bodies and their normalization. Everything here runs before any
//! write, so a rejected request never leaves partial state behind.

use serde::Deserialize;
use serde_json::Number;

use crate::error::ApiError;
use crate::schemas::{Cents, Member, MemberId, Share, Weight};
use crate::shares::compute_shares;

pub const MAX_WEIGHT: Weight = 100;
const PAYER_DEFAULT_WEIGHT: Weight = 100;

/// Trims a required free-text field such as a name or PIN.
pub fn required_field(value: &str, what: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ApiError::InvalidInput(format!("Missing {}", what)))
    } else {
        Ok(value.to_string())
    }
}

/// Largest accepted amount. Group balances are sums of many amounts and must
/// stay far from `Cents::MAX`.
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000;

fn integer_cents(amount: &Number) -> Result<Cents, ApiError> {
    let cents = amount.as_i64().ok_or_else(|| {
        ApiError::InvalidInput("Amount must be a whole number of cents".to_string())
    })?;
    if cents.unsigned_abs() > MAX_AMOUNT_CENTS as u64 {
        return Err(ApiError::InvalidInput("Amount is too large".to_string()));
    }
    Ok(cents)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub group_name: String,
    pub member_name: String,
    pub pin: String,
    #[serde(default)]
    pub admin_code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub member_name: String,
    pub pin: String,
    #[serde(default)]
    pub admin_code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub admin_code: String,
}

#[derive(Deserialize, Debug)]
pub struct RenameMemberRequest {
    pub name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub role: String,
    #[serde(default)]
    pub admin_code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminCodeRequest {
    #[serde(default)]
    pub admin_code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInput {
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub title: String,
    pub amount_cents: Number,
    pub payer_member_id: String,
    #[serde(default)]
    pub participants: Vec<ParticipantInput>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub from_member_id: String,
    pub to_member_id: String,
    pub amount_cents: Number,
}

#[derive(Debug, PartialEq)]
pub struct ValidExpense {
    pub title: String,
    pub amount_cents: Cents,
    pub payer_member_id: MemberId,
    pub shares: Vec<Share>,
}

#[derive(Debug, PartialEq)]
pub struct ValidSettlement {
    pub from_member_id: MemberId,
    pub to_member_id: MemberId,
    pub amount_cents: Cents,
}

fn ensure_members<'a>(
    members: &[Member],
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ApiError> {
    for id in ids {
        if !members.iter().any(|member| member.id == id) {
            return Err(ApiError::InvalidInput(format!("Unknown member {}", id)));
        }
    }
    Ok(())
}

impl ValidExpense {
    /// Rejects payers or participants that are not members of the group.
    pub fn check_members(&self, members: &[Member]) -> Result<(), ApiError> {
        let participants = self.shares.iter().map(|share| share.member_id.as_str());
        let payer = std::iter::once(self.payer_member_id.as_str());
        ensure_members(members, payer.chain(participants))
    }
}

impl ValidSettlement {
    pub fn check_members(&self, members: &[Member]) -> Result<(), ApiError> {
        ensure_members(members, [self.from_member_id.as_str(), self.to_member_id.as_str()])
    }
}

fn whole_weight(weight: f64) -> Option<Weight> {
    if weight.fract() == 0.0 && (0.0..=f64::from(MAX_WEIGHT)).contains(&weight) {
        Some(weight as Weight)
    } else {
        None
    }
}

/// Collects usable participants in first-seen order. Blank ids and weights
/// outside `0..=MAX_WEIGHT` are dropped; a repeated id keeps its first
/// position and takes the last weight given.
pub fn normalize_weights(participants: &[ParticipantInput]) -> Vec<(MemberId, Weight)> {
    let mut weights: Vec<(MemberId, Weight)> = Vec::new();
    for participant in participants {
        let member_id = participant.member_id.trim();
        if member_id.is_empty() {
            continue;
        }
        let Some(weight) = whole_weight(participant.weight.unwrap_or(0.0)) else {
            continue;
        };
        match weights.iter_mut().find(|(id, _)| id == member_id) {
            Some(entry) => entry.1 = weight,
            None => weights.push((member_id.to_string(), weight)),
        }
    }
    weights
}

impl ExpenseRequest {
    /// Validates the body and allocates its shares.
    pub fn validate(&self) -> Result<ValidExpense, ApiError> {
        let title = required_field(&self.title, "title")?;
        let payer_member_id = required_field(&self.payer_member_id, "payer")?;
        let amount_cents = integer_cents(&self.amount_cents)?;

        let mut weights = normalize_weights(&self.participants);
        if weights.is_empty() {
            return Err(ApiError::InvalidInput("Invalid participants".to_string()));
        }
        // A payer left out or given no weight takes the default weight.
        match weights.iter_mut().find(|(id, _)| *id == payer_member_id) {
            Some(entry) if entry.1 == 0 => entry.1 = PAYER_DEFAULT_WEIGHT,
            Some(_) => {}
            None => weights.push((payer_member_id.clone(), PAYER_DEFAULT_WEIGHT)),
        }

        let shares = compute_shares(amount_cents, &weights)?
            .into_iter()
            .zip(&weights)
            .map(|((member_id, share_cents), (_, weight))| Share {
                member_id,
                weight: *weight,
                share_cents,
            })
            .collect();

        Ok(ValidExpense {
            title,
            amount_cents,
            payer_member_id,
            shares,
        })
    }
}

impl SettlementRequest {
    pub fn validate(&self) -> Result<ValidSettlement, ApiError> {
        let from_member_id = required_field(&self.from_member_id, "payer")?;
        let to_member_id = required_field(&self.to_member_id, "recipient")?;
        let amount_cents = integer_cents(&self.amount_cents)?;
        if amount_cents <= 0 || from_member_id == to_member_id {
            return Err(ApiError::InvalidInput("Invalid payment".to_string()));
        }
        Ok(ValidSettlement {
            from_member_id,
            to_member_id,
            amount_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::fixtures::member;
    use serde_json::json;

    fn expense(body: serde_json::Value) -> ExpenseRequest {
        serde_json::from_value(body).unwrap()
    }

    fn split(valid: &ValidExpense) -> Vec<(&str, Weight, Cents)> {
        valid
            .shares
            .iter()
            .map(|s| (s.member_id.as_str(), s.weight, s.share_cents))
            .collect()
    }

    #[test]
    fn allocates_shares_for_a_valid_expense() {
        let valid = expense(json!({
            "title": "  Pizza ",
            "amountCents": 999,
            "payerMemberId": "A",
            "participants": [
                {"memberId": "A", "weight": 100},
                {"memberId": "B", "weight": 100},
                {"memberId": "C", "weight": 100}
            ]
        }))
        .validate()
        .unwrap();
        assert_eq!(valid.title, "Pizza");
        assert_eq!(split(&valid), vec![("A", 100, 333), ("B", 100, 333), ("C", 100, 333)]);
    }

    #[test]
    fn missing_payer_is_added_at_full_weight() {
        let valid = expense(json!({
            "title": "Taxi",
            "amountCents": 300,
            "payerMemberId": "P",
            "participants": [{"memberId": "B", "weight": 50}]
        }))
        .validate()
        .unwrap();
        assert_eq!(split(&valid), vec![("B", 50, 100), ("P", 100, 200)]);
    }

    #[test]
    fn skips_blank_ids_and_out_of_range_weights() {
        let participants: Vec<ParticipantInput> = serde_json::from_value(json!([
            {"memberId": " ", "weight": 50},
            {"memberId": "A", "weight": 150},
            {"memberId": "B", "weight": -1},
            {"memberId": "C", "weight": 12.5},
            {"memberId": " D ", "weight": 70},
            {"memberId": "E"},
            {"memberId": "D", "weight": 80}
        ]))
        .unwrap();
        assert_eq!(
            normalize_weights(&participants),
            vec![("D".to_string(), 80), ("E".to_string(), 0)]
        );
    }

    #[test]
    fn rejects_fractional_amounts_before_allocating() {
        let err = expense(json!({
            "title": "Coffee",
            "amountCents": 10.5,
            "payerMemberId": "A",
            "participants": [{"memberId": "A", "weight": 100}]
        }))
        .validate()
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn rejects_expense_without_participants() {
        let none = expense(json!({
            "title": "Coffee",
            "amountCents": 10,
            "payerMemberId": "A",
            "participants": []
        }));
        assert!(matches!(none.validate(), Err(ApiError::InvalidInput(_))));

        let blank = expense(json!({
            "title": "Coffee",
            "amountCents": 10,
            "payerMemberId": "A",
            "participants": [{"memberId": "  ", "weight": 100}]
        }));
        assert!(matches!(blank.validate(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn payer_with_zero_weight_takes_full_weight() {
        let valid = expense(json!({
            "title": "Groceries",
            "amountCents": 1000,
            "payerMemberId": "A",
            "participants": [
                {"memberId": "A", "weight": 0},
                {"memberId": "B", "weight": 100}
            ]
        }))
        .validate()
        .unwrap();
        assert_eq!(split(&valid), vec![("A", 100, 500), ("B", 100, 500)]);

        let only_payer = expense(json!({
            "title": "Groceries",
            "amountCents": 10,
            "payerMemberId": "A",
            "participants": [{"memberId": "A", "weight": 0}]
        }))
        .validate()
        .unwrap();
        assert_eq!(split(&only_payer), vec![("A", 100, 10)]);
    }

    #[test]
    fn amounts_are_capped() {
        let body = |amount: Cents| {
            json!({
                "title": "Flat",
                "amountCents": amount,
                "payerMemberId": "A",
                "participants": [{"memberId": "A", "weight": 100}]
            })
        };
        let at_cap = expense(body(MAX_AMOUNT_CENTS)).validate().unwrap();
        assert_eq!(at_cap.amount_cents, MAX_AMOUNT_CENTS);
        assert!(matches!(
            expense(body(MAX_AMOUNT_CENTS + 1)).validate(),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            expense(body(Cents::MAX)).validate(),
            Err(ApiError::InvalidInput(_))
        ));

        let settlement: SettlementRequest = serde_json::from_value(json!({
            "fromMemberId": "A",
            "toMemberId": "B",
            "amountCents": MAX_AMOUNT_CENTS + 1
        }))
        .unwrap();
        assert!(matches!(settlement.validate(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn expense_participants_must_belong_to_the_group() {
        let valid = expense(json!({
            "title": "Boat",
            "amountCents": 100,
            "payerMemberId": "A",
            "participants": [{"memberId": "B", "weight": 100}]
        }))
        .validate()
        .unwrap();
        let members = vec![member("A", "Anna"), member("B", "Bruno")];
        assert!(valid.check_members(&members).is_ok());
        assert!(matches!(
            valid.check_members(&members[..1]),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn settlement_needs_positive_amount_and_two_members() {
        let ok: SettlementRequest = serde_json::from_value(json!({
            "fromMemberId": "A",
            "toMemberId": "B",
            "amountCents": 250
        }))
        .unwrap();
        assert_eq!(ok.validate().unwrap().amount_cents, 250);

        for body in [
            json!({"fromMemberId": "A", "toMemberId": "A", "amountCents": 250}),
            json!({"fromMemberId": "A", "toMemberId": "B", "amountCents": 0}),
            json!({"fromMemberId": "A", "toMemberId": "B", "amountCents": 2.5}),
            json!({"fromMemberId": "", "toMemberId": "B", "amountCents": 5}),
        ] {
            let request: SettlementRequest = serde_json::from_value(body).unwrap();
            assert!(matches!(request.validate(), Err(ApiError::InvalidInput(_))));
        }
    }
}
