use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode};
use tracing::warn;

use cloudchat_shared::constants::MIN_PASSWORD_LEN;
use cloudchat_shared::UserId;

use crate::database::Database;
use crate::error::{AuthError, Result, StoreError};
use crate::models::Account;

impl Database {
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO accounts (uid, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.uid.as_str(),
                    account.email,
                    account.password_hash,
                    account.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Auth(AuthError::EmailAlreadyInUse)
                }
                other => StoreError::Sqlite(other),
            })?;
        Ok(())
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Account> {
        let row = self
            .conn()
            .query_row(
                "SELECT uid, email, password_hash, created_at
                 FROM accounts WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        let (uid, email, password_hash, created_str) = row;
        let created_at = DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc);

        Ok(Account {
            uid: UserId::new(uid)?,
            email,
            password_hash,
            created_at,
        })
    }

    #[cfg(test)]
    pub(crate) fn count_accounts(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

/// Lower-case and trim an email address, rejecting anything without a
/// non-empty local part and domain.
pub fn normalize_email(email: &str) -> std::result::Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@').ok_or(AuthError::InvalidEmail)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
    {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

pub fn check_password_strength(password: &str) -> std::result::Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

/// Build a new account with a fresh uid and an Argon2id password hash.
pub fn new_account(email: String, password: &str) -> Result<Account> {
    let uid = UserId::new(uuid::Uuid::new_v4().simple().to_string())?;

    Ok(Account {
        uid,
        email,
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    })
}

/// Hash `password` with a random salt, returning the PHC string.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against the account's stored PHC string.
pub fn verify_password(account: &Account, password: &str) -> bool {
    let parsed = match PasswordHash::new(&account.password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(uid = %account.uid, error = %e, "Stored password hash is unreadable");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_fetch_account() {
        let db = Database::open_in_memory().unwrap();
        let account = new_account("a@example.com".into(), "secret1").unwrap();
        db.insert_account(&account).unwrap();

        let fetched = db.get_account_by_email("a@example.com").unwrap();
        assert_eq!(fetched.uid, account.uid);
        assert_eq!(fetched.password_hash, account.password_hash);
        assert!(verify_password(&fetched, "secret1"));
        assert!(!verify_password(&fetched, "secret2"));
        assert_eq!(db.count_accounts().unwrap(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_account(&new_account("a@example.com".into(), "secret1").unwrap())
            .unwrap();
        let err = db
            .insert_account(&new_account("a@example.com".into(), "other12").unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::Auth(AuthError::EmailAlreadyInUse)));
    }

    #[test]
    fn unknown_email_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_account_by_email("nobody@example.com"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert_eq!(normalize_email("alice"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("@example.com"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("alice@"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("a b@c.d"), Err(AuthError::InvalidEmail));
    }

    #[test]
    fn short_passwords_are_weak() {
        assert_eq!(
            check_password_strength("12345"),
            Err(AuthError::WeakPassword(MIN_PASSWORD_LEN))
        );
        assert!(check_password_strength("123456").is_ok());
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let a = new_account("a@example.com".into(), "secret1").unwrap();
        let b = new_account("b@example.com".into(), "secret1").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
        assert!(verify_password(&a, "secret1"));
        assert!(verify_password(&b, "secret1"));
    }

    #[test]
    fn verify_password_against_stored_phc_string() {
        let db = Database::open_in_memory().unwrap();
        db.insert_account(&new_account("a@example.com".into(), "hunter22").unwrap())
            .unwrap();

        let stored = db.get_account_by_email("a@example.com").unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(!stored.password_hash.contains("hunter22"));
        assert!(verify_password(&stored, "hunter22"));
        assert!(!verify_password(&stored, "hunter23"));
        assert!(!verify_password(&stored, ""));
    }

    #[test]
    fn unreadable_stored_hash_never_verifies() {
        let mut account = new_account("a@example.com".into(), "secret1").unwrap();
        account.password_hash = "not-a-phc-string".into();
        assert!(!verify_password(&account, "secret1"));
    }
}
