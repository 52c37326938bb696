use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Contact,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Contact => Entity::has_many(crate::contact::Entity).into(),
        }
    }
}

impl Related<crate::contact::Entity> for Entity {
    fn to() -> RelationDef { Relation::Contact.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Access level stored in `users.role`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "moderator" => Some(Role::Moderator),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl Model {
    /// Unknown values in the column degrade to the least privileged role.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }
}

/// Fields accepted when creating an account.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub role: Role,
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    if email.len() > 50 {
        return Err(ModelError::Validation("email must be at most 50 characters".into()));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::Validation("invalid email".into()));
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    let len = username.trim().chars().count();
    if !(3..=50).contains(&len) {
        return Err(ModelError::Validation("username must be 3 to 50 characters".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, input: NewUser) -> Result<Model, ModelError> {
    validate_username(&input.username)?;
    validate_email(&input.email)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(input.username.trim().to_string()),
        email: Set(input.email.trim().to_lowercase()),
        avatar: Set(input.avatar),
        confirmed: Set(input.confirmed),
        role: Set(input.role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    let found = Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?;
    Ok(found)
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, ModelError> {
    let found = Entity::find()
        .filter(Column::Username.eq(username.trim()))
        .one(db)
        .await?;
    Ok(found)
}

async fn load(db: &DatabaseConnection, id: Uuid) -> Result<Model, ModelError> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound("user".into()))
}

/// Mark the account owning `email` as confirmed. Returns `None` for unknown emails.
pub async fn set_confirmed(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    let Some(found) = find_by_email(db, email).await? else { return Ok(None) };
    if found.confirmed {
        return Ok(Some(found));
    }
    let mut am: ActiveModel = found.into();
    am.confirmed = Set(true);
    am.updated_at = Set(Utc::now().into());
    Ok(Some(am.update(db).await?))
}

pub async fn set_avatar(db: &DatabaseConnection, id: Uuid, url: &str) -> Result<Model, ModelError> {
    let mut am: ActiveModel = load(db, id).await?.into();
    am.avatar = Set(Some(url.to_string()));
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn set_role(db: &DatabaseConnection, id: Uuid, role: Role) -> Result<Model, ModelError> {
    let mut am: ActiveModel = load(db, id).await?.into();
    am.role = Set(role.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}
