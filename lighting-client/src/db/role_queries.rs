use sqlx::PgPool;

use crate::error::StoreError;

/// Role names granted to a user, e.g. `["admin"]`.
pub async fn roles_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<String>, StoreError> {
    let roles = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(roles)
}
