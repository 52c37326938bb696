use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::contact;

use super::birthdays;
use super::domain::{ContactCreate, ContactSearch, ContactUpdate};
use crate::{errors::ServiceError, pagination::Pagination};

pub const DEFAULT_BIRTHDAY_WINDOW: i64 = 7;
pub const MAX_BIRTHDAY_WINDOW: i64 = 366;

fn owned(user_id: Uuid) -> sea_orm::Select<contact::Entity> {
    contact::Entity::find().filter(contact::Column::UserId.eq(user_id))
}

/// Create a contact for `user_id`. Duplicate email or phone for the same owner is a conflict.
#[instrument(skip(db, input), fields(%user_id))]
pub async fn create_contact(db: &DatabaseConnection, user_id: Uuid, input: ContactCreate) -> Result<contact::Model, ServiceError> {
    let created = contact::create(db, user_id, input.into()).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::Conflict(_) => ServiceError::Conflict("Contact with this email or phone number already exists".into()),
        other => other,
    })?;
    info!(contact_id = %created.id, "contact_created");
    Ok(created)
}

/// Page through the owner's contacts in creation order.
pub async fn list_contacts(db: &DatabaseConnection, user_id: Uuid, page: Pagination) -> Result<Vec<contact::Model>, ServiceError> {
    let (skip, limit) = page.normalize();
    let rows = owned(user_id)
        .order_by_asc(contact::Column::CreatedAt)
        .order_by_asc(contact::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get_contact(db: &DatabaseConnection, user_id: Uuid, id: Uuid) -> Result<Option<contact::Model>, ServiceError> {
    let found = owned(user_id).filter(contact::Column::Id.eq(id)).one(db).await?;
    Ok(found)
}

/// Apply the provided fields. `None` when the contact does not exist for this owner.
#[instrument(skip(db, patch), fields(%user_id, contact_id = %id))]
pub async fn update_contact(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
    patch: ContactUpdate,
) -> Result<Option<contact::Model>, ServiceError> {
    let Some(existing) = get_contact(db, user_id, id).await? else { return Ok(None) };

    let merged = contact::NewContact {
        first_name: patch.first_name.unwrap_or_else(|| existing.first_name.clone()),
        last_name: patch.last_name.unwrap_or_else(|| existing.last_name.clone()),
        email: patch.email.unwrap_or_else(|| existing.email.clone()),
        phone_number: patch.phone_number.unwrap_or_else(|| existing.phone_number.clone()),
        birthday: patch.birthday.unwrap_or(existing.birthday),
        other_info: patch.other_info.unwrap_or_else(|| existing.other_info.clone()),
    };
    contact::validate(&merged)?;

    let mut am: contact::ActiveModel = existing.into();
    am.first_name = Set(merged.first_name.trim().to_string());
    am.last_name = Set(merged.last_name.trim().to_string());
    am.email = Set(merged.email.trim().to_lowercase());
    am.phone_number = Set(merged.phone_number.trim().to_string());
    am.birthday = Set(merged.birthday);
    am.other_info = Set(merged.other_info);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::Conflict(_) => ServiceError::Conflict("Contact with this email or phone number already exists".into()),
        other => other,
    })?;
    debug!("contact_updated");
    Ok(Some(updated))
}

/// Delete and return the removed row, or `None` if absent.
pub async fn delete_contact(db: &DatabaseConnection, user_id: Uuid, id: Uuid) -> Result<Option<contact::Model>, ServiceError> {
    let Some(existing) = get_contact(db, user_id, id).await? else { return Ok(None) };
    contact::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(contact_id = %existing.id, %user_id, "contact_deleted");
    Ok(Some(existing))
}

/// `%needle%` with LIKE metacharacters escaped by a backslash.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Fold the needle the way the backend's `LOWER()` folds the column.
/// SQLite only folds ASCII, so non-ASCII letters must match case exactly there.
fn fold_case(backend: DbBackend, s: &str) -> String {
    match backend {
        DbBackend::Sqlite => s.to_ascii_lowercase(),
        _ => s.to_lowercase(),
    }
}

/// Case-insensitive substring search; no filters yields no rows.
pub async fn search_contacts(db: &DatabaseConnection, user_id: Uuid, query: &ContactSearch) -> Result<Vec<contact::Model>, ServiceError> {
    let filters = query.filters();
    if filters.is_empty() {
        return Ok(Vec::new());
    }
    let backend = db.get_database_backend();
    let mut cond = Condition::all();
    for (field, needle) in filters {
        let column = match field {
            "first_name" => contact::Column::FirstName,
            "last_name" => contact::Column::LastName,
            "email" => contact::Column::Email,
            _ => contact::Column::PhoneNumber,
        };
        let pattern = LikeExpr::new(like_pattern(&fold_case(backend, &needle))).escape('\\');
        cond = cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern));
    }
    let rows = owned(user_id)
        .filter(cond)
        .order_by_asc(contact::Column::LastName)
        .order_by_asc(contact::Column::FirstName)
        .all(db)
        .await?;
    Ok(rows)
}

/// Contacts whose next birthday is within `days` of `today`, soonest first.
pub async fn upcoming_birthdays(
    db: &DatabaseConnection,
    user_id: Uuid,
    today: NaiveDate,
    days: i64,
) -> Result<Vec<contact::Model>, ServiceError> {
    let days = days.clamp(0, MAX_BIRTHDAY_WINDOW);
    let mut rows: Vec<(i64, contact::Model)> = owned(user_id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|c| birthdays::days_until(c.birthday, today).filter(|n| *n <= days).map(|n| (n, c)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.last_name.cmp(&b.1.last_name)));
    Ok(rows.into_iter().map(|(_, c)| c).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::user::{self, NewUser, Role};

    async fn owner(db: &DatabaseConnection, name: &str) -> user::Model {
        user::create(db, NewUser { username: name.into(), email: format!("{name}@example.com"), avatar: None, confirmed: true, role: Role::User })
            .await
            .unwrap()
    }

    fn input(first: &str, last: &str, email: &str, phone: &str, birthday: NaiveDate) -> ContactCreate {
        ContactCreate {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone_number: phone.into(),
            birthday,
            other_info: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn contact_crud_is_owner_scoped() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        let bob = owner(&t.db, "bobby").await;

        let c = create_contact(&t.db, alice.id, input("Ada", "Lovelace", "ada@example.com", "555-0100", d(1815, 12, 10))).await?;
        assert!(get_contact(&t.db, alice.id, c.id).await?.is_some());
        assert!(get_contact(&t.db, bob.id, c.id).await?.is_none());

        let patch = ContactUpdate { phone_number: Some("555-0199".into()), other_info: Some(Some("mathematician".into())), ..Default::default() };
        let updated = update_contact(&t.db, alice.id, c.id, patch).await?.unwrap();
        assert_eq!(updated.phone_number, "555-0199");
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.other_info.as_deref(), Some("mathematician"));
        assert!(update_contact(&t.db, bob.id, c.id, ContactUpdate::default()).await?.is_none());

        let kept = update_contact(&t.db, alice.id, c.id, ContactUpdate { last_name: Some("King".into()), ..Default::default() }).await?.unwrap();
        assert_eq!(kept.other_info.as_deref(), Some("mathematician"));
        let cleared = update_contact(&t.db, alice.id, c.id, ContactUpdate { other_info: Some(None), ..Default::default() }).await?.unwrap();
        assert_eq!(cleared.other_info, None);

        let bad = ContactUpdate { email: Some("nope".into()), ..Default::default() };
        assert!(matches!(update_contact(&t.db, alice.id, c.id, bad).await, Err(ServiceError::Validation(_))));

        assert!(delete_contact(&t.db, bob.id, c.id).await?.is_none());
        assert_eq!(delete_contact(&t.db, alice.id, c.id).await?.map(|m| m.id), Some(c.id));
        assert!(get_contact(&t.db, alice.id, c.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_contact_is_conflict() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        create_contact(&t.db, alice.id, input("A", "B", "dup@example.com", "11111", d(1990, 1, 1))).await?;
        let err = create_contact(&t.db, alice.id, input("C", "D", "dup@example.com", "22222", d(1990, 1, 1))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let other = create_contact(&t.db, alice.id, input("E", "F", "e@example.com", "33333", d(1990, 1, 1))).await?;
        let patch = ContactUpdate { phone_number: Some("11111".into()), ..Default::default() };
        assert!(matches!(update_contact(&t.db, alice.id, other.id, patch).await, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_paginates_in_creation_order() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        let bob = owner(&t.db, "bobby").await;
        for i in 0..5 {
            create_contact(&t.db, alice.id, input(&format!("N{i}"), "L", &format!("c{i}@example.com"), &format!("5550{i}00"), d(1990, 1, 1))).await?;
        }
        create_contact(&t.db, bob.id, input("X", "Y", "x@example.com", "99999", d(1990, 1, 1))).await?;

        let all = list_contacts(&t.db, alice.id, Pagination::default()).await?;
        assert_eq!(all.len(), 5);
        let page = list_contacts(&t.db, alice.id, Pagination { skip: 2, limit: 2 }).await?;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, all[2].id);
        assert_eq!(list_contacts(&t.db, bob.id, Pagination::default()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_combined() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        let bob = owner(&t.db, "bobby").await;
        create_contact(&t.db, alice.id, input("John", "Smith", "john@work.com", "10001", d(1990, 1, 1))).await?;
        create_contact(&t.db, alice.id, input("Johanna", "Doe", "jo@home.org", "10002", d(1990, 1, 1))).await?;
        create_contact(&t.db, bob.id, input("John", "Other", "john@else.com", "10003", d(1990, 1, 1))).await?;

        let q = ContactSearch { first_name: Some("JOH".into()), ..Default::default() };
        assert_eq!(search_contacts(&t.db, alice.id, &q).await?.len(), 2);

        let q = ContactSearch { first_name: Some("joh".into()), email: Some("WORK".into()), ..Default::default() };
        let hits = search_contacts(&t.db, alice.id, &q).await?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].last_name, "Smith");

        assert!(search_contacts(&t.db, alice.id, &ContactSearch::default()).await?.is_empty());
        let q = ContactSearch { last_name: Some("zzz".into()), ..Default::default() };
        assert!(search_contacts(&t.db, alice.id, &q).await?.is_empty());
        Ok(())
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("a_b%c\\d"), "%a\\_b\\%c\\\\d%");
        assert_eq!(fold_case(DbBackend::Sqlite, "ÖZIL"), "Özil");
        assert_eq!(fold_case(DbBackend::Postgres, "ÖZIL"), "özil");
    }

    #[tokio::test]
    async fn search_matches_wildcards_literally() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        create_contact(&t.db, alice.id, input("John", "Smith", "john@work.com", "10001", d(1990, 1, 1))).await?;
        create_contact(&t.db, alice.id, input("Jane", "Doe", "jane@work.com", "10002", d(1990, 1, 1))).await?;
        create_contact(&t.db, alice.id, input("Mary_Ann", "100%", "mary@work.com", "10003", d(1990, 1, 1))).await?;

        let first = |n: &str| ContactSearch { first_name: Some(n.into()), ..Default::default() };
        let names = |rows: Vec<contact::Model>| rows.into_iter().map(|c| c.first_name).collect::<Vec<_>>();

        assert_eq!(names(search_contacts(&t.db, alice.id, &first("_")).await?), vec!["Mary_Ann"]);
        assert!(search_contacts(&t.db, alice.id, &first("%")).await?.is_empty());
        assert!(search_contacts(&t.db, alice.id, &first("J_n")).await?.is_empty());
        assert!(search_contacts(&t.db, alice.id, &first("\\")).await?.is_empty());

        let q = ContactSearch { last_name: Some("0%".into()), ..Default::default() };
        assert_eq!(names(search_contacts(&t.db, alice.id, &q).await?), vec!["Mary_Ann"]);
        Ok(())
    }

    #[tokio::test]
    async fn search_folds_case_like_the_backend() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        create_contact(&t.db, alice.id, input("Mesut", "Özil", "mesut@example.com", "10010", d(1988, 10, 15))).await?;

        let last = |n: &str| ContactSearch { last_name: Some(n.into()), ..Default::default() };
        assert_eq!(search_contacts(&t.db, alice.id, &last("ÖZ")).await?.len(), 1);
        assert_eq!(search_contacts(&t.db, alice.id, &last("zIL")).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn birthdays_within_window() -> Result<(), anyhow::Error> {
        let t = get_db().await?;
        let alice = owner(&t.db, "alice").await;
        let today = d(2025, 12, 28);
        create_contact(&t.db, alice.id, input("New", "Year", "ny@example.com", "20001", d(1990, 1, 2))).await?;
        create_contact(&t.db, alice.id, input("To", "Day", "td@example.com", "20002", d(1985, 12, 28))).await?;
        create_contact(&t.db, alice.id, input("Far", "Away", "fa@example.com", "20003", d(1985, 1, 20))).await?;
        create_contact(&t.db, alice.id, input("Just", "Passed", "jp@example.com", "20004", d(1985, 12, 27))).await?;

        let hits = upcoming_birthdays(&t.db, alice.id, today, DEFAULT_BIRTHDAY_WINDOW).await?;
        let names: Vec<_> = hits.iter().map(|c| c.last_name.as_str()).collect();
        assert_eq!(names, vec!["Day", "Year"]);

        let wide = upcoming_birthdays(&t.db, alice.id, today, 30).await?;
        assert_eq!(wide.len(), 3);
        Ok(())
    }
}
