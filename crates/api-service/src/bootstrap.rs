//! 启动初始化
//!
//! 首次启动时写入默认分类与管理员账号，重复执行不会产生副作用

use chrono::Utc;
use pods_orders::{DEFAULT_CATEGORIES, User, UserId, UserRole};
use pods_shared::config::AuthConfig;
use tracing::{info, instrument};

use crate::auth::hash_password;
use crate::error::Result;
use crate::state::AppState;

/// 初始化默认数据
#[instrument(skip_all)]
pub async fn seed_defaults(state: &AppState, auth: &AuthConfig) -> Result<()> {
    let names: Vec<String> = DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect();
    let seeded = state.repos.categories.seed_if_empty(&names).await?;
    if seeded > 0 {
        info!(count = seeded, "默认分类已写入");
    }

    if state.repos.users.admin_exists().await? {
        return Ok(());
    }

    let admin = User {
        id: UserId::new(state.id_gen.generate("user")),
        name: auth.admin_name.clone(),
        email: auth.admin_email.clone(),
        password_hash: hash_password(&auth.admin_password)?,
        role: UserRole::Admin,
        created_at: Utc::now(),
    };
    state.repos.users.insert(&admin).await?;
    info!(email = %admin.email, "管理员账号已创建");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pods_orders::{MemoryStore, Repositories};
    use pods_shared::config::AppConfig;

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let config = AppConfig::default();
        let state = AppState::new(Repositories::memory(MemoryStore::new()), &config);

        seed_defaults(&state, &config.auth).await.unwrap();
        seed_defaults(&state, &config.auth).await.unwrap();

        let users = state.repos.users.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, UserRole::Admin);
        assert_eq!(users[0].email, config.auth.admin_email);

        let categories = state.catalog.category_names().await.unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(categories[0], DEFAULT_CATEGORIES[0]);
    }
}
