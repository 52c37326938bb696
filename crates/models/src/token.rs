use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter};
use uuid::Uuid;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

pub const REFRESH: &str = "refresh";

/// Opaque server-side token (refresh tokens).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

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

impl ActiveModelBehavior for ActiveModel {}

/// Insert a fresh token. The user's expired tokens of the same type are purged first.
pub async fn issue(db: &DatabaseConnection, user_id: Uuid, token_type: &str, ttl: Duration) -> Result<Model, ModelError> {
    let now = Utc::now();
    let cutoff: DateTimeWithTimeZone = now.into();
    Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TokenType.eq(token_type))
        .filter(Column::ExpiresAt.lt(cutoff))
        .exec(db)
        .await?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        token: Set(Uuid::new_v4().simple().to_string()),
        token_type: Set(token_type.to_string()),
        expires_at: Set((now + ttl).into()),
        created_at: Set(now.into()),
    };
    Ok(am.insert(db).await?)
}

/// Delete the token and return it when it exists, matches `token_type` and is unexpired.
/// Expired tokens are removed as well but reported as `None`.
pub async fn consume(db: &DatabaseConnection, token: &str, token_type: &str) -> Result<Option<Model>, ModelError> {
    let Some(found) = Entity::find()
        .filter(Column::Token.eq(token))
        .filter(Column::TokenType.eq(token_type))
        .one(db)
        .await? else { return Ok(None) };
    let res = Entity::delete_by_id(found.id).exec(db).await?;
    // 并发刷新时只有删除成功的一方可以使用该令牌
    if res.rows_affected == 0 || found.expires_at < Utc::now() {
        return Ok(None);
    }
    Ok(Some(found))
}

pub async fn revoke_all(db: &DatabaseConnection, user_id: Uuid, token_type: &str) -> Result<u64, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TokenType.eq(token_type))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
