use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;
use crate::schemas::Member;

type HmacSha256 = Hmac<Sha256>;

fn pin_mac(secret: &str, group_id: &str, pin: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC takes any key size");
    mac.update(group_id.as_bytes());
    mac.update(b":");
    mac.update(pin.as_bytes());
    mac
}

/// Hex-encoded HMAC of the PIN, salted with the group id.
pub fn hash_pin(secret: &str, group_id: &str, pin: &str) -> String {
    hex::encode(pin_mac(secret, group_id, pin).finalize().into_bytes())
}

pub fn verify_pin(secret: &str, group_id: &str, pin: &str, pin_hash: &str) -> bool {
    match hex::decode(pin_hash) {
        Ok(expected) => pin_mac(secret, group_id, pin).verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

/// A configured code only matches a non-empty, identical submission.
pub fn code_matches(expected: Option<&str>, submitted: &str) -> bool {
    match expected {
        Some(expected) => !expected.is_empty() && !submitted.is_empty() && expected == submitted,
        None => false,
    }
}

pub fn require_code(expected: Option<&str>, submitted: &str) -> Result<(), ApiError> {
    if code_matches(expected, submitted) {
        Ok(())
    } else {
        tracing::warn!("rejected admin code");
        Err(ApiError::Forbidden("Invalid admin code".to_string()))
    }
}

/// Role requested for a member. Members store two independent flags; a role
/// is only a command describing how to set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Admin,
    CoAdmin,
}

impl Role {
    pub fn parse(raw: &str) -> Result<Role, ApiError> {
        match raw.trim().to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "coadmin" => Ok(Role::CoAdmin),
            _ => Err(ApiError::InvalidInput("Invalid role".to_string())),
        }
    }

    pub fn is_elevated(self) -> bool {
        !matches!(self, Role::Member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub is_group_admin: bool,
    pub is_program_admin: bool,
}

/// What a role change writes. `clear_other_group_admins` keeps the group down
/// to a single group-admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    pub flags: Flags,
    pub clear_other_group_admins: bool,
}

/// Decides the flags of `member_id` after it is given `role`.
pub fn plan_role_change(
    members: &[Member],
    member_id: &str,
    role: Role,
) -> Result<RoleChange, ApiError> {
    if !members.iter().any(|member| member.id == member_id) {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }
    let other_admins = members
        .iter()
        .filter(|member| member.is_group_admin && member.id != member_id)
        .count();
    if role != Role::Admin && other_admins == 0 {
        return Err(ApiError::InvalidInput(
            "The group must keep at least one administrator".to_string(),
        ));
    }
    let flags = match role {
        Role::Admin => Flags {
            is_group_admin: true,
            is_program_admin: members
                .iter()
                .any(|member| member.id == member_id && member.is_program_admin),
        },
        Role::CoAdmin => Flags {
            is_group_admin: false,
            is_program_admin: true,
        },
        Role::Member => Flags {
            is_group_admin: false,
            is_program_admin: false,
        },
    };
    Ok(RoleChange {
        flags,
        clear_other_group_admins: role == Role::Admin,
    })
}

/// A group-admin has to hand the role over before being removed.
pub fn check_member_removal(members: &[Member], member_id: &str) -> Result<(), ApiError> {
    let member = members
        .iter()
        .find(|member| member.id == member_id)
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;
    if member.is_group_admin {
        return Err(ApiError::Conflict(
            "Transfer the group administrator role before deleting this member".to_string(),
        ));
    }
    Ok(())
}

/// Flags for a member added directly by an administrator.
pub fn flags_for_new_member(role: Role, admin_code_ok: bool) -> Result<Flags, ApiError> {
    if role.is_elevated() && !admin_code_ok {
        return Err(ApiError::Forbidden("Invalid admin code".to_string()));
    }
    Ok(Flags {
        is_group_admin: role == Role::Admin,
        is_program_admin: role == Role::CoAdmin,
    })
}
