use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Country, CountryId, DocumentType, DocumentTypeId, UserId};
use thiserror::Error;

/// A registration insert hit one of the uniqueness constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DuplicateRegistration {
    #[error("email is already registered")]
    Email,
    #[error("username is already registered")]
    Username,
    #[error("document is already registered")]
    Document,
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Everything a registration writes, already validated and hashed.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub last_name: String,
    pub is_militar: bool,
    pub document_type_id: DocumentTypeId,
    pub document_number: String,
    pub place_expedition: String,
    pub date_expedition: NaiveDate,
    pub country_id: CountryId,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub cel_phone: String,
    pub emergency_name: String,
    pub emergency_phone: String,
}

#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub last_name: String,
    pub is_militar: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredUserDocument {
    pub user_id: UserId,
    pub document_type_id: DocumentTypeId,
    pub document_number: String,
    pub place_expedition: String,
    pub date_expedition: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct StoredContactInfo {
    pub user_id: UserId,
    pub country_id: CountryId,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub cel_phone: String,
    pub emergency_name: String,
    pub emergency_phone: String,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(%database_url, "storage ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_country(&self, country_code: &str, country_name: &str) -> Result<CountryId> {
        let rec = sqlx::query(
            "INSERT INTO countries (country_code, country_name) VALUES (?, ?) RETURNING id",
        )
        .bind(country_code)
        .bind(country_name)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert country '{country_code}'"))?;
        Ok(CountryId(rec.get::<i64, _>(0)))
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        let rows = sqlx::query("SELECT id, country_code, country_name FROM countries ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(country_from_row).collect())
    }

    pub async fn country_by_id(&self, country_id: CountryId) -> Result<Option<Country>> {
        let row = sqlx::query("SELECT id, country_code, country_name FROM countries WHERE id = ?")
            .bind(country_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(country_from_row))
    }

    pub async fn country_code_exists(&self, country_code: &str) -> Result<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM countries WHERE country_code = ?)")
                .bind(country_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists != 0)
    }

    pub async fn create_document_type(&self, name: &str) -> Result<DocumentTypeId> {
        let rec = sqlx::query("INSERT INTO document_types (name_type_document) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert document type '{name}'"))?;
        Ok(DocumentTypeId(rec.get::<i64, _>(0)))
    }

    pub async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        let rows = sqlx::query("SELECT id, name_type_document FROM document_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(document_type_from_row).collect())
    }

    pub async fn document_type_by_id(
        &self,
        document_type_id: DocumentTypeId,
    ) -> Result<Option<DocumentType>> {
        let row = sqlx::query("SELECT id, name_type_document FROM document_types WHERE id = ?")
            .bind(document_type_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(document_type_from_row))
    }

    pub async fn document_type_name_exists(&self, name: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM document_types WHERE name_type_document = ?)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists != 0)
    }

    pub async fn document_exists(
        &self,
        document_type_id: DocumentTypeId,
        document_number: &str,
    ) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_documents
             WHERE document_type_id = ? AND document_number = ?)",
        )
        .bind(document_type_id.0)
        .bind(document_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    /// Inserts the user, its identity document and its contact info atomically.
    pub async fn register_user(&self, registration: &NewRegistration) -> Result<UserId> {
        let mut tx = self.pool.begin().await?;

        let rec = sqlx::query(
            "INSERT INTO users (email, username, password_hash, name, last_name, is_militar, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&registration.email)
        .bind(&registration.username)
        .bind(&registration.password_hash)
        .bind(&registration.name)
        .bind(&registration.last_name)
        .bind(registration.is_militar)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| registration_insert_error(err, "failed to insert user"))?;
        let user_id = UserId(rec.get::<i64, _>(0));

        sqlx::query(
            "INSERT INTO user_documents
             (user_id, document_type_id, document_number, place_expedition, date_expedition)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id.0)
        .bind(registration.document_type_id.0)
        .bind(&registration.document_number)
        .bind(&registration.place_expedition)
        .bind(registration.date_expedition)
        .execute(&mut *tx)
        .await
        .map_err(|err| registration_insert_error(err, "failed to insert user document"))?;

        sqlx::query(
            "INSERT INTO contact_info
             (user_id, country_id, address, city, phone, cel_phone, emergency_name, emergency_phone)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.0)
        .bind(registration.country_id.0)
        .bind(&registration.address)
        .bind(&registration.city)
        .bind(&registration.phone)
        .bind(&registration.cel_phone)
        .bind(&registration.emergency_name)
        .bind(&registration.emergency_phone)
        .execute(&mut *tx)
        .await
        .context("failed to insert contact info")?;

        tx.commit().await?;
        Ok(user_id)
    }

    pub async fn load_user(&self, user_id: UserId) -> Result<Option<StoredUser>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, name, last_name,
                    is_militar, is_active, email_verified, created_at
             FROM users WHERE id = ?",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(StoredUser {
                user_id: UserId(r.try_get("id")?),
                email: r.try_get("email")?,
                username: r.try_get("username")?,
                password_hash: r.try_get("password_hash")?,
                name: r.try_get("name")?,
                last_name: r.try_get("last_name")?,
                is_militar: r.try_get("is_militar")?,
                is_active: r.try_get("is_active")?,
                email_verified: r.try_get("email_verified")?,
                created_at: r.try_get("created_at")?,
            })
        })
        .transpose()
    }

    pub async fn load_user_document(&self, user_id: UserId) -> Result<Option<StoredUserDocument>> {
        let row = sqlx::query(
            "SELECT user_id, document_type_id, document_number, place_expedition, date_expedition
             FROM user_documents WHERE user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(StoredUserDocument {
                user_id: UserId(r.try_get("user_id")?),
                document_type_id: DocumentTypeId(r.try_get("document_type_id")?),
                document_number: r.try_get("document_number")?,
                place_expedition: r.try_get("place_expedition")?,
                date_expedition: r.try_get("date_expedition")?,
            })
        })
        .transpose()
    }

    pub async fn load_contact_info(&self, user_id: UserId) -> Result<Option<StoredContactInfo>> {
        let row = sqlx::query(
            "SELECT user_id, country_id, address, city, phone, cel_phone, emergency_name, emergency_phone
             FROM contact_info WHERE user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(StoredContactInfo {
                user_id: UserId(r.try_get("user_id")?),
                country_id: CountryId(r.try_get("country_id")?),
                address: r.try_get("address")?,
                city: r.try_get("city")?,
                phone: r.try_get("phone")?,
                cel_phone: r.try_get("cel_phone")?,
                emergency_name: r.try_get("emergency_name")?,
                emergency_phone: r.try_get("emergency_phone")?,
            })
        })
        .transpose()
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn country_from_row(row: sqlx::sqlite::SqliteRow) -> Country {
    Country {
        id: CountryId(row.get::<i64, _>(0)),
        country_code: row.get::<String, _>(1),
        country_name: row.get::<String, _>(2),
    }
}

fn document_type_from_row(row: sqlx::sqlite::SqliteRow) -> DocumentType {
    DocumentType {
        id: DocumentTypeId(row.get::<i64, _>(0)),
        name_type_document: row.get::<String, _>(1),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

/// Maps UNIQUE violations on registration tables to [`DuplicateRegistration`].
fn registration_insert_error(err: sqlx::Error, context: &'static str) -> anyhow::Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let message = db.message();
            let duplicate = if message.contains("users.email") {
                Some(DuplicateRegistration::Email)
            } else if message.contains("users.username") {
                Some(DuplicateRegistration::Username)
            } else if message.contains("user_documents.") {
                Some(DuplicateRegistration::Document)
            } else {
                None
            };
            if let Some(duplicate) = duplicate {
                return duplicate.into();
            }
        }
    }
    anyhow::Error::new(err).context(context)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
