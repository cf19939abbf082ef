use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::user::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_access_token(user_id: Uuid, role: Role, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        exp: (now + Duration::seconds(config.jwt_ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create access token: {}", e)))
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/edubridge_test".into(),
        database_max_connections: 1,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:5173".into(),
        cors_extra_origins: vec![],
        jwt_secret: "test-secret-do-not-use".into(),
        jwt_ttl_secs: 3600,
        auth_rate_limit_max: 5,
        auth_rate_limit_window_secs: 60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_keeps_role() {
        let config = test_config();
        let id = Uuid::new_v4();
        let token = create_access_token(id, Role::Teacher, &config).unwrap();
        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, id);
        assert_eq!(data.claims.role, Role::Teacher);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let config = test_config();
        let token = create_access_token(Uuid::new_v4(), Role::Student, &config).unwrap();
        let other = Config {
            jwt_secret: "another-secret".into(),
            ..test_config()
        };
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = Config {
            jwt_ttl_secs: -3600,
            ..test_config()
        };
        let token = create_access_token(Uuid::new_v4(), Role::Admin, &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }
}
