use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use tracing::{info, instrument};
use uuid::Uuid;

use models::user::{self, Role};
use crate::{errors::ServiceError, pagination::Pagination};
use crate::storage::{StorageRoot, AVATARS_DIR};

/// Public URL prefix under which avatar files are served.
pub const AVATAR_URL_PREFIX: &str = "/static/avatars";

const AVATAR_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// List users, oldest first.
pub async fn list_users(db: &DatabaseConnection, page: Pagination) -> Result<Vec<user::Model>, ServiceError> {
    let (skip, limit) = page.normalize();
    let users = user::Entity::find()
        .order_by_asc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok(users)
}

/// Get a user by id.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

/// Change a user's role.
#[instrument(skip(db))]
pub async fn set_role(db: &DatabaseConnection, id: Uuid, role: Role) -> Result<user::Model, ServiceError> {
    let updated = user::set_role(db, id, role).await?;
    info!(user_id = %id, role = role.as_str(), "role_changed");
    Ok(updated)
}

pub fn avatar_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    AVATAR_TYPES.iter().find(|(mime, _)| *mime == essence).map(|(_, ext)| *ext)
}

/// Store an uploaded avatar under the storage root and return its public URL.
/// Any previous avatar of the same user with another extension is removed.
pub async fn save_avatar(
    storage: &StorageRoot,
    user_id: Uuid,
    content_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<String, ServiceError> {
    let ext = avatar_extension(content_type)
        .ok_or_else(|| ServiceError::Validation(format!("unsupported avatar type: {content_type}")))?;
    if bytes.is_empty() {
        return Err(ServiceError::Validation("avatar file is empty".into()));
    }
    if bytes.len() > max_bytes {
        return Err(ServiceError::Validation(format!("avatar exceeds {max_bytes} bytes")));
    }

    let file_name = format!("{user_id}.{ext}");
    storage.write(&format!("{AVATARS_DIR}/{file_name}"), bytes).await?;
    for (_, other) in AVATAR_TYPES.iter().filter(|(_, e)| *e != ext) {
        storage.remove(&format!("{AVATARS_DIR}/{user_id}.{other}")).await?;
    }
    Ok(format!("{AVATAR_URL_PREFIX}/{file_name}"))
}

pub async fn update_avatar(db: &DatabaseConnection, id: Uuid, url: &str) -> Result<user::Model, ServiceError> {
    Ok(user::set_avatar(db, id, url).await?)
}
