use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MemberId = String;
pub type GroupId = String;
pub type ExpenseId = String;

/// Amount in minor currency units (cents).
pub type Cents = i64;

/// Relative participant weight. Weights of an expense need not sum to anything.
pub type Weight = u32;

pub fn new_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: GroupId,
    pub name: String,
    pub pin_hash: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A group participant. The two flags are independent: a member may hold both.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: MemberId,
    pub group_id: GroupId,
    pub name: String,
    pub is_group_admin: bool,
    pub is_program_admin: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(group_id: &str, name: String, is_group_admin: bool, is_program_admin: bool) -> Self {
        Member {
            id: new_id(),
            group_id: group_id.to_string(),
            name,
            is_group_admin,
            is_program_admin,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Share {
    pub member_id: MemberId,
    pub weight: Weight,
    pub share_cents: Cents,
}

/// An expense owns its shares; their `share_cents` always sum to `amount_cents`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub title: String,
    pub amount_cents: Cents,
    pub payer_member_id: MemberId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub shares: Vec<Share>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settlement {
    #[serde(rename = "_id")]
    pub id: String,
    pub group_id: GroupId,
    pub from_member_id: MemberId,
    pub to_member_id: MemberId,
    pub amount_cents: Cents,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
