use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: Date,
    pub other_info: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_OTHER_INFO_LEN: usize = 250;

#[derive(Clone, Debug)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
    pub other_info: Option<String>,
}

pub fn validate_name(field: &str, value: &str) -> Result<(), ModelError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(ModelError::Validation(format!("{field} must be 1 to {MAX_NAME_LEN} characters")));
    }
    Ok(())
}

/// Digits plus the usual separators; 5 to 20 characters overall.
pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let phone = phone.trim();
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')');
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if phone.len() > MAX_PHONE_LEN || digits < 5 || !phone.chars().all(allowed) {
        return Err(ModelError::Validation("invalid phone number".into()));
    }
    Ok(())
}

pub fn validate_other_info(info: Option<&str>) -> Result<(), ModelError> {
    if info.map(|s| s.chars().count() > MAX_OTHER_INFO_LEN).unwrap_or(false) {
        return Err(ModelError::Validation(format!("other_info must be at most {MAX_OTHER_INFO_LEN} characters")));
    }
    Ok(())
}

pub fn validate(input: &NewContact) -> Result<(), ModelError> {
    validate_name("first_name", &input.first_name)?;
    validate_name("last_name", &input.last_name)?;
    user::validate_email(&input.email)?;
    validate_phone(&input.phone_number)?;
    validate_other_info(input.other_info.as_deref())
}

pub async fn create(db: &DatabaseConnection, user_id: Uuid, input: NewContact) -> Result<Model, ModelError> {
    validate(&input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        email: Set(input.email.trim().to_lowercase()),
        phone_number: Set(input.phone_number.trim().to_string()),
        birthday: Set(input.birthday),
        other_info: Set(input.other_info),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
