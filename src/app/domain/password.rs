use argon2::{
    password_hash::SaltString,
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand_core::OsRng;
use validator::ValidationError;

/// Password domain type. Once constructed via `new`, guaranteed to meet
/// strength requirements.
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    /// Wrap plaintext for verification against a stored hash (login path).
    /// Skips strength checks: accounts created under older rules must still
    /// be able to log in.
    pub fn for_verification(plaintext: String) -> Self {
        Self(plaintext)
    }

    /// Create a new Password, enforcing strength requirements (signup path).
    pub fn new(password: String) -> Result<Self, ValidationError> {
        if password.len() < 8 {
            let mut error = ValidationError::new("password_too_short");
            error.message = Some("Password must be at least 8 characters".into());
            return Err(error);
        }
        if password.len() > 128 {
            let mut error = ValidationError::new("password_too_long");
            error.message = Some("Password must be at most 128 characters".into());
            return Err(error);
        }

        let has_upper = password.chars().any(|c| c.is_uppercase());
        let has_lower = password.chars().any(|c| c.is_lowercase());
        let has_digit = password.chars().any(|c| c.is_numeric());
        if !(has_upper && has_lower && has_digit) {
            let mut error = ValidationError::new("weak_password");
            error.message = Some("Password must contain uppercase, lowercase, and digit".into());
            return Err(error);
        }

        Ok(Self(password))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Argon2 password hash, stored as its PHC string.
#[derive(Debug, Clone)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hash a password with Argon2id and a random salt.
    pub fn from_password(password: &Password) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(Self(hash.to_string()))
    }

    /// Verify a password against this hash.
    pub fn verify(&self, password: &Password) -> Result<(), argon2::password_hash::Error> {
        let parsed = PasswordHash::new(&self.0)?;
        Argon2::default().verify_password(password.as_bytes(), &parsed)
    }

    /// Rehydrate from a stored hash string.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_password() {
        assert!(Password::new("Password1".to_string()).is_ok());
    }

    #[test]
    fn rejects_short_long_and_weak() {
        assert!(Password::new("Sh0rt".to_string()).is_err());
        assert!(Password::new("A1".to_string() + &"a".repeat(130)).is_err());
        assert!(Password::new("password1".to_string()).is_err());
        assert!(Password::new("PASSWORD1".to_string()).is_err());
        assert!(Password::new("Passwords".to_string()).is_err());
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let password = Password::new("TestPassword123".to_string()).unwrap();
        let hash = HashedPassword::from_password(&password).unwrap();
        assert!(hash.verify(&password).is_ok());

        let wrong = Password::new("WrongPassword456".to_string()).unwrap();
        assert!(hash.verify(&wrong).is_err());
    }

    #[test]
    fn for_verification_accepts_legacy_weak_passwords() {
        let weak = Password::for_verification("password".to_string());
        let hash = HashedPassword::from_password(&weak).unwrap();
        assert!(hash.verify(&weak).is_ok());
    }
}
