use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::profile_service::ensure_profile;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// 注册新用户，同时创建空的积分档案
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let username = normalize_username(&request.username);
        validate_username(&username)?;
        validate_password(&request.password)?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(AppError::ValidationError(
                "Username is already taken".to_string(),
            ));
        }

        let user = self.create_user(&username, &request.password, false).await?;
        log::info!("Registered user {} ({})", user.id, user.username);

        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let username = normalize_username(&request.username);
        let user = self
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(&request.refresh_token)?;
        let user_id = claims.user_id()?;

        // 用户可能已被删除或权限已变更，重新读取
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(user)
    }

    /// 确保配置中的管理员账号存在并具有管理员权限
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<UserResponse> {
        let username = normalize_username(username);
        validate_username(&username)?;

        if let Some(existing) = self.find_by_username(&username).await? {
            if existing.is_admin {
                return Ok(existing.into());
            }
            let mut am = existing.into_active_model();
            am.is_admin = Set(true);
            am.updated_at = Set(Utc::now());
            let updated = am.update(&self.pool).await?;
            log::info!("Promoted user {} to admin", updated.username);
            return Ok(updated.into());
        }

        validate_password(password)?;
        let user = self.create_user(&username, password, true).await?;
        log::info!("Created admin user {}", user.username);
        Ok(user.into())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.pool)
            .await?)
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> AppResult<users::Model> {
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let user = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            is_admin: Set(is_admin),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        ensure_profile(&txn, user.id).await?;
        txn.commit().await?;

        Ok(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.username, user.is_admin)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(user.id, &user.username, user.is_admin)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
}
