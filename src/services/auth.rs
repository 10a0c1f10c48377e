use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::User;

/// Distinguishes short-lived access tokens from refresh tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub username: String,
    pub role: i16,
    pub kind: TokenKind,
    pub jti: Uuid,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

impl Claims {
    pub fn expires_at(&self) -> AppResult<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|e| AppError::Internal(format!("Invalid token expiry: {}", e)))
    }
}

/// Access + refresh token issued on login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService;

impl AuthService {
    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let result = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        Ok(result)
    }

    /// Generate a signed JWT of the given kind for a user
    pub fn generate_token(user: &User, kind: TokenKind, config: &Config) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let lifetime = match kind {
            TokenKind::Access => Duration::hours(config.jwt_expiration_hours),
            TokenKind::Refresh => Duration::hours(config.jwt_refresh_expiration_hours),
        };

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.code(),
            kind,
            jti: Uuid::new_v4(),
            exp: (now + lifetime).unix_timestamp(),
            iat: now.unix_timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(token)
    }

    /// Generate the access/refresh pair returned by login and register
    pub fn generate_token_pair(user: &User, config: &Config) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: Self::generate_token(user, TokenKind::Access, config)?,
            refresh_token: Self::generate_token(user, TokenKind::Refresh, config)?,
        })
    }

    /// Verify and decode a JWT token of any kind
    pub fn verify_token(token: &str, config: &Config) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Verify a token and require it to be an access token
    pub fn verify_access_token(token: &str, config: &Config) -> AppResult<Claims> {
        let claims = Self::verify_token(token, config)?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verify a token and require it to be a refresh token
    pub fn verify_refresh_token(token: &str, config: &Config) -> AppResult<Claims> {
        let claims = Self::verify_token(token, config)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            database_max_connections: 1,
            jwt_secret: "unit-test-secret-that-is-long-enough".to_string(),
            jwt_expiration_hours: 1,
            jwt_refresh_expiration_hours: 24,
            host: "127.0.0.1".to_string(),
            port: 0,
            bootstrap_admin: None,
        }
    }

    fn user(role: Role) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = AuthService::hash_password("correct horse").unwrap();
        assert!(AuthService::verify_password("correct horse", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_access_token_carries_role() {
        let config = config();
        let admin = user(Role::Admin);

        let token = AuthService::generate_token(&admin, TokenKind::Access, &config).unwrap();
        let claims = AuthService::verify_access_token(&token, &config).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(Role::from_code(claims.role), Role::Admin);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let config = config();
        let pair = AuthService::generate_token_pair(&user(Role::User), &config).unwrap();

        assert!(AuthService::verify_refresh_token(&pair.refresh_token, &config).is_ok());
        assert!(matches!(
            AuthService::verify_access_token(&pair.refresh_token, &config),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            AuthService::verify_refresh_token(&pair.access_token, &config),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = config();
        let token = AuthService::generate_token(&user(Role::User), TokenKind::Access, &config).unwrap();

        let other = Config {
            jwt_secret: "a-completely-different-secret-value".to_string(),
            ..config
        };
        assert!(matches!(
            AuthService::verify_token(&token, &other),
            Err(AppError::InvalidToken)
        ));
    }
}
