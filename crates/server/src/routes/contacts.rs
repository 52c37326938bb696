use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use models::contact;
use service::contacts::service as contacts;
use service::contacts::{ContactCreate, ContactSearch, ContactUpdate};
use service::pagination::Pagination;

use crate::errors::JsonApiError;
use crate::extract::CurrentUser;
use crate::state::ServerState;

const NOT_FOUND: &str = "Contact not found.";

#[derive(Debug, Deserialize)]
pub struct BirthdayQuery {
    pub days: Option<i64>,
}

#[utoipa::path(post, path = "/api/v1/contacts", tag = "contacts", request_body = crate::openapi::ContactCreateDoc, responses((status = 201, description = "Created", body = crate::openapi::ContactDoc), (status = 409, description = "Duplicate e-mail or phone"), (status = 422, description = "Validation Error")), security(("bearer" = [])))]
pub async fn create_contact(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Json(input): Json<ContactCreate>,
) -> Result<(StatusCode, Json<contact::Model>), JsonApiError> {
    let created = contacts::create_contact(&state.db, me.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/v1/contacts", tag = "contacts", params(("skip" = Option<u64>, Query, description = "Rows to skip"), ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")), responses((status = 200, description = "Contacts", body = [crate::openapi::ContactDoc])), security(("bearer" = [])))]
pub async fn list_contacts(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<contact::Model>>, JsonApiError> {
    Ok(Json(contacts::list_contacts(&state.db, me.id, page).await?))
}

#[utoipa::path(get, path = "/api/v1/contacts/search", tag = "contacts", params(("first_name" = Option<String>, Query, description = "Substring of the first name"), ("last_name" = Option<String>, Query, description = "Substring of the last name"), ("email" = Option<String>, Query, description = "Substring of the e-mail"), ("phone_number" = Option<String>, Query, description = "Substring of the phone number")), responses((status = 200, description = "Matches", body = [crate::openapi::ContactDoc]), (status = 404, description = "No matches")), security(("bearer" = [])))]
pub async fn search_contacts(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Query(query): Query<ContactSearch>,
) -> Result<Json<Vec<contact::Model>>, JsonApiError> {
    let found = contacts::search_contacts(&state.db, me.id, &query).await?;
    if found.is_empty() {
        return Err(JsonApiError::not_found("No contacts found for the given criteria."));
    }
    Ok(Json(found))
}

#[utoipa::path(get, path = "/api/v1/contacts/upcoming_birthdays", tag = "contacts", params(("days" = Option<i64>, Query, description = "Window in days, default 7")), responses((status = 200, description = "Contacts with a birthday in the window", body = [crate::openapi::ContactDoc])), security(("bearer" = [])))]
pub async fn upcoming_birthdays(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Query(q): Query<BirthdayQuery>,
) -> Result<Json<Vec<contact::Model>>, JsonApiError> {
    let days = q.days.unwrap_or(contacts::DEFAULT_BIRTHDAY_WINDOW);
    let today = Utc::now().date_naive();
    Ok(Json(contacts::upcoming_birthdays(&state.db, me.id, today, days).await?))
}

#[utoipa::path(get, path = "/api/v1/contacts/{contact_id}", tag = "contacts", params(("contact_id" = Uuid, Path, description = "Contact id")), responses((status = 200, description = "Contact", body = crate::openapi::ContactDoc), (status = 404, description = "Contact not found.")), security(("bearer" = [])))]
pub async fn get_contact(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> Result<Json<contact::Model>, JsonApiError> {
    contacts::get_contact(&state.db, me.id, contact_id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found(NOT_FOUND))
}

#[utoipa::path(patch, path = "/api/v1/contacts/{contact_id}", tag = "contacts", params(("contact_id" = Uuid, Path, description = "Contact id")), request_body = crate::openapi::ContactUpdateDoc, responses((status = 200, description = "Updated", body = crate::openapi::ContactDoc), (status = 404, description = "Contact not found.")), security(("bearer" = [])))]
pub async fn update_contact(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Path(contact_id): Path<Uuid>,
    Json(patch): Json<ContactUpdate>,
) -> Result<Json<contact::Model>, JsonApiError> {
    contacts::update_contact(&state.db, me.id, contact_id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found(NOT_FOUND))
}

#[utoipa::path(delete, path = "/api/v1/contacts/{contact_id}", tag = "contacts", params(("contact_id" = Uuid, Path, description = "Contact id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Contact not found.")), security(("bearer" = [])))]
pub async fn delete_contact(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    match contacts::delete_contact(&state.db, me.id, contact_id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(JsonApiError::not_found(NOT_FOUND)),
    }
}
