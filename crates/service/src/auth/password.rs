use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;

use super::errors::AuthError;

pub const ALGORITHM: &str = "argon2";
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

pub fn hash(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

pub fn verify(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash("s3cret!").unwrap();
        assert!(h.starts_with("$argon2"));
        assert!(verify("s3cret!", &h).unwrap());
        assert!(!verify("wrong", &h).unwrap());
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash("same-pass").unwrap(), hash("same-pass").unwrap());
    }

    #[test]
    fn rejects_short_and_garbage() {
        assert!(validate("12345").is_err());
        assert!(validate("123456").is_ok());
        assert!(verify("x", "not-a-phc-string").is_err());
    }
}
