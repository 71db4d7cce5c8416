use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::auth::{self, Role};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::requests::{
    required_field, AddMemberRequest, AdminCodeRequest, CreateGroupRequest, ExpenseRequest,
    JoinGroupRequest, RenameMemberRequest, RoleRequest, SettlementRequest,
};
use crate::schemas::{new_id, Expense, Group, Member, Settlement};
use crate::store::Store;
use crate::summary::build_summary;

pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
}

impl AppState {
    fn program_admin_code(&self) -> Option<&str> {
        self.config.program_admin_code.as_deref()
    }

    fn admin_reset_code(&self) -> Option<&str> {
        self.config.admin_reset_code.as_deref()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MembershipJson {
    group_id: String,
    member_id: String,
    member_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedJson {
    success: bool,
    id: String,
}

#[derive(Serialize)]
struct SuccessJson {
    success: bool,
}

fn success() -> HttpResponse {
    HttpResponse::Ok().json(SuccessJson { success: true })
}

fn created(id: String) -> HttpResponse {
    HttpResponse::Ok().json(CreatedJson { success: true, id })
}

async fn require_group(store: &Store, group_id: &str) -> ApiResult<Group> {
    store
        .find_group(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

#[post("/groups")]
async fn create_group(
    state: web::Data<AppState>,
    json: web::Json<CreateGroupRequest>,
) -> ApiResult<HttpResponse> {
    let group_name = required_field(&json.group_name, "group name")?;
    let member_name = required_field(&json.member_name, "member name")?;
    let pin = required_field(&json.pin, "PIN")?;

    let id = new_id();
    let group = Group {
        pin_hash: auth::hash_pin(&state.config.pin_secret, &id, &pin),
        id,
        name: group_name,
        created_at: Utc::now(),
    };
    let is_program_admin = auth::code_matches(state.program_admin_code(), json.admin_code.trim());
    let member = Member::new(&group.id, member_name, true, is_program_admin);

    state.store.insert_group(&group).await?;
    state.store.insert_member(&member).await?;
    tracing::info!(group_id = %group.id, member_id = %member.id, "group created");

    Ok(HttpResponse::Ok().json(MembershipJson {
        group_id: group.id,
        member_id: member.id,
        member_name: member.name,
    }))
}

#[post("/groups/{id}/join")]
async fn join_group(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<JoinGroupRequest>,
) -> ApiResult<HttpResponse> {
    let member_name = required_field(&json.member_name, "member name")?;
    let pin = required_field(&json.pin, "PIN")?;
    let group = require_group(&state.store, &id).await?;

    if !auth::verify_pin(&state.config.pin_secret, &group.id, &pin, &group.pin_hash) {
        tracing::warn!(group_id = %group.id, "rejected PIN");
        return Err(ApiError::InvalidPin);
    }

    let is_program_admin = auth::code_matches(state.program_admin_code(), json.admin_code.trim());
    let member = Member::new(&group.id, member_name, false, is_program_admin);
    state.store.insert_member(&member).await?;
    tracing::info!(group_id = %group.id, member_id = %member.id, "member joined");

    Ok(HttpResponse::Ok().json(MembershipJson {
        group_id: group.id,
        member_id: member.id,
        member_name: member.name,
    }))
}

#[get("/groups/{id}/summary")]
async fn get_summary(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    let group = require_group(&state.store, &id).await?;
    let (members, expenses, settlements) = tokio::try_join!(
        state.store.members_of(&group.id),
        state.store.expenses_of(&group.id),
        state.store.settlements_of(&group.id),
    )?;
    Ok(HttpResponse::Ok().json(build_summary(&group, &members, &expenses, &settlements)))
}

#[post("/groups/{id}/members")]
async fn add_member(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<AddMemberRequest>,
) -> ApiResult<HttpResponse> {
    let name = required_field(&json.name, "name")?;
    let role = Role::parse(json.role.as_deref().unwrap_or("member"))?;
    let code_ok = auth::code_matches(state.program_admin_code(), json.admin_code.trim());
    let flags = auth::flags_for_new_member(role, code_ok)?;
    let group = require_group(&state.store, &id).await?;

    if flags.is_group_admin {
        state.store.clear_group_admins(&group.id).await?;
    }
    let member = Member::new(&group.id, name, flags.is_group_admin, flags.is_program_admin);
    state.store.insert_member(&member).await?;
    tracing::info!(group_id = %group.id, member_id = %member.id, ?role, "member added");

    Ok(created(member.id))
}

#[put("/groups/{id}/members/{member_id}")]
async fn rename_member(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    json: web::Json<RenameMemberRequest>,
) -> ApiResult<HttpResponse> {
    let (group_id, member_id) = path.into_inner();
    let name = required_field(&json.name, "name")?;
    if !state.store.rename_member(&group_id, &member_id, &name).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }
    Ok(success())
}

#[put("/groups/{id}/members/{member_id}/role")]
async fn change_role(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    json: web::Json<RoleRequest>,
) -> ApiResult<HttpResponse> {
    let (group_id, member_id) = path.into_inner();
    let role = Role::parse(&json.role)?;
    auth::require_code(state.program_admin_code(), json.admin_code.trim())?;

    let members = state.store.members_of(&group_id).await?;
    let change = auth::plan_role_change(&members, &member_id, role)?;
    if change.clear_other_group_admins {
        state.store.clear_group_admins(&group_id).await?;
    }
    state
        .store
        .set_member_flags(
            &group_id,
            &member_id,
            change.flags.is_group_admin,
            change.flags.is_program_admin,
        )
        .await?;
    tracing::info!(%group_id, %member_id, ?role, "member role changed");
    Ok(success())
}

#[delete("/groups/{id}/members/{member_id}")]
async fn delete_member(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (group_id, member_id) = path.into_inner();
    auth::check_member_removal(&state.store.members_of(&group_id).await?, &member_id)?;
    if state.store.member_has_dependencies(&group_id, &member_id).await? {
        return Err(ApiError::Conflict(
            "Cannot delete a member with recorded expenses or payments".to_string(),
        ));
    }
    if !state.store.delete_member(&group_id, &member_id).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }
    tracing::info!(%group_id, %member_id, "member deleted");
    Ok(success())
}

#[post("/groups/{id}/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<ExpenseRequest>,
) -> ApiResult<HttpResponse> {
    let valid = json.validate()?;
    let group = require_group(&state.store, &id).await?;
    valid.check_members(&state.store.members_of(&group.id).await?)?;

    let expense = Expense {
        id: new_id(),
        group_id: group.id,
        title: valid.title,
        amount_cents: valid.amount_cents,
        payer_member_id: valid.payer_member_id,
        created_at: Utc::now(),
        shares: valid.shares,
    };
    state.store.insert_expense(&expense).await?;
    tracing::info!(
        group_id = %expense.group_id,
        expense_id = %expense.id,
        amount_cents = expense.amount_cents,
        "expense recorded"
    );
    Ok(created(expense.id))
}

#[put("/groups/{id}/expenses/{expense_id}")]
async fn update_expense(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    json: web::Json<ExpenseRequest>,
) -> ApiResult<HttpResponse> {
    let (group_id, expense_id) = path.into_inner();
    let valid = json.validate()?;
    let existing = state
        .store
        .find_expense(&group_id, &expense_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Expense not found".to_string()))?;
    valid.check_members(&state.store.members_of(&group_id).await?)?;

    let expense = Expense {
        title: valid.title,
        amount_cents: valid.amount_cents,
        payer_member_id: valid.payer_member_id,
        shares: valid.shares,
        ..existing
    };
    state.store.replace_expense(&expense).await?;
    tracing::info!(%group_id, %expense_id, amount_cents = expense.amount_cents, "expense updated");
    Ok(success())
}

#[delete("/groups/{id}/expenses/{expense_id}")]
async fn delete_expense(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (group_id, expense_id) = path.into_inner();
    if !state.store.delete_expense(&group_id, &expense_id).await? {
        return Err(ApiError::NotFound("Expense not found".to_string()));
    }
    tracing::info!(%group_id, %expense_id, "expense deleted");
    Ok(success())
}

#[post("/groups/{id}/settlements")]
async fn add_settlement(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<SettlementRequest>,
) -> ApiResult<HttpResponse> {
    let valid = json.validate()?;
    let group = require_group(&state.store, &id).await?;
    valid.check_members(&state.store.members_of(&group.id).await?)?;

    let settlement = Settlement {
        id: new_id(),
        group_id: group.id,
        from_member_id: valid.from_member_id,
        to_member_id: valid.to_member_id,
        amount_cents: valid.amount_cents,
        created_at: Utc::now(),
    };
    state.store.insert_settlement(&settlement).await?;
    tracing::info!(
        group_id = %settlement.group_id,
        from = %settlement.from_member_id,
        to = %settlement.to_member_id,
        amount_cents = settlement.amount_cents,
        "settlement recorded"
    );
    Ok(created(settlement.id))
}

#[post("/admin/verify")]
async fn verify_admin(
    state: web::Data<AppState>,
    json: web::Json<AdminCodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = required_field(&json.admin_code, "admin code")?;
    auth::require_code(state.program_admin_code(), &code)?;
    Ok(success())
}

#[post("/groups/{id}/reset")]
async fn reset_group(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<AdminCodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = required_field(&json.admin_code, "admin code")?;
    auth::require_code(state.admin_reset_code(), &code)?;
    let group = require_group(&state.store, &id).await?;
    state.store.clear_ledger(&group.id).await?;
    tracing::warn!(group_id = %group.id, "group ledger reset");
    Ok(success())
}

#[delete("/groups/{id}")]
async fn delete_group(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<AdminCodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = required_field(&json.admin_code, "admin code")?;
    auth::require_code(state.admin_reset_code(), &code)?;
    if !state.store.delete_group(&id).await? {
        return Err(ApiError::NotFound("Group not found".to_string()));
    }
    tracing::warn!(group_id = %id, "group deleted");
    Ok(success())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_group)
        .service(join_group)
        .service(get_summary)
        .service(add_member)
        .service(rename_member)
        .service(change_role)
        .service(delete_member)
        .service(add_expense)
        .service(update_expense)
        .service(delete_expense)
        .service(add_settlement)
        .service(verify_admin)
        .service(reset_group)
        .service(delete_group);
}
