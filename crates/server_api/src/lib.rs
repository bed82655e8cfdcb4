use chrono::NaiveDate;
use shared::{
    domain::{Country, CountryId, DocumentType, DocumentTypeId},
    error::{ApiError, ErrorCode},
};
use storage::{DuplicateRegistration, NewRegistration, Storage, StoredUser};
use tracing::{info, warn};

pub mod password;
pub mod validation;

use validation::{
    normalize_email, require, validate_address, validate_max_len, validate_phone,
    MAX_CITY_LEN, MAX_COUNTRY_CODE_LEN, MAX_COUNTRY_NAME_LEN, MAX_DOCUMENT_TYPE_NAME_LEN,
    MAX_LAST_NAME_LEN, MAX_NAME_LEN, MAX_PLACE_EXPEDITION_LEN, MAX_USERNAME_LEN,
};

pub const REGISTRATION_SUCCESS_MESSAGE: &str = "User registered successfully";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// A registration as accepted by the schema, with ids and dates already typed.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub last_name: String,
    pub is_militar: bool,
    pub document_type: DocumentTypeId,
    pub document_number: String,
    pub document_expedition_place: String,
    pub document_expedition_date: NaiveDate,
    pub country: CountryId,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub cel_phone: String,
    pub emergency_name: String,
    pub emergency_phone: String,
}

impl RegistrationRequest {
    /// Surrounding whitespace is dropped from every text field except the password.
    fn trimmed(self) -> Self {
        fn trim(value: String) -> String {
            value.trim().to_string()
        }

        Self {
            email: trim(self.email),
            username: trim(self.username),
            password: self.password,
            name: trim(self.name),
            last_name: trim(self.last_name),
            is_militar: self.is_militar,
            document_type: self.document_type,
            document_number: trim(self.document_number),
            document_expedition_place: trim(self.document_expedition_place),
            document_expedition_date: self.document_expedition_date,
            country: self.country,
            address: trim(self.address),
            city: trim(self.city),
            phone: trim(self.phone),
            cel_phone: trim(self.cel_phone),
            emergency_name: trim(self.emergency_name),
            emergency_phone: trim(self.emergency_phone),
        }
    }
}

pub async fn list_countries(ctx: &ApiContext) -> Result<Vec<Country>, ApiError> {
    ctx.storage.list_countries().await.map_err(internal)
}

pub async fn list_document_types(ctx: &ApiContext) -> Result<Vec<DocumentType>, ApiError> {
    ctx.storage.list_document_types().await.map_err(internal)
}

pub async fn country_by_id(ctx: &ApiContext, id: CountryId) -> Result<Option<Country>, ApiError> {
    ctx.storage.country_by_id(id).await.map_err(internal)
}

pub async fn document_type_by_id(
    ctx: &ApiContext,
    id: DocumentTypeId,
) -> Result<Option<DocumentType>, ApiError> {
    ctx.storage.document_type_by_id(id).await.map_err(internal)
}

pub async fn create_country(
    ctx: &ApiContext,
    country_code: &str,
    country_name: &str,
) -> Result<Country, ApiError> {
    let country_code = country_code.trim();
    let country_name = country_name.trim();
    require("countryCode", country_code)?;
    require("countryName", country_name)?;
    validate_max_len("countryCode", country_code, MAX_COUNTRY_CODE_LEN)?;
    validate_max_len("countryName", country_name, MAX_COUNTRY_NAME_LEN)?;

    if ctx
        .storage
        .country_code_exists(country_code)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::conflict(format!(
            "a country with code {country_code} already exists"
        )));
    }

    let id = ctx
        .storage
        .create_country(country_code, country_name)
        .await
        .map_err(internal)?;
    info!(country_id = id.0, %country_code, "country created");
    Ok(Country {
        id,
        country_code: country_code.to_string(),
        country_name: country_name.to_string(),
    })
}

pub async fn create_document_type(ctx: &ApiContext, name: &str) -> Result<DocumentType, ApiError> {
    let name = name.trim();
    require("name", name)?;
    validate_max_len("name", name, MAX_DOCUMENT_TYPE_NAME_LEN)?;

    if ctx
        .storage
        .document_type_name_exists(name)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::conflict(format!(
            "a document type named {name} already exists"
        )));
    }

    let id = ctx
        .storage
        .create_document_type(name)
        .await
        .map_err(internal)?;
    info!(document_type_id = id.0, %name, "document type created");
    Ok(DocumentType {
        id,
        name_type_document: name.to_string(),
    })
}

pub async fn register_user(
    ctx: &ApiContext,
    request: RegistrationRequest,
) -> Result<StoredUser, ApiError> {
    let request = request.trimmed();
    validate_registration_fields(&request)?;
    let email = normalize_email(&request.email)?;

    if ctx.storage.email_exists(&email).await.map_err(internal)? {
        return Err(ApiError::conflict("email is already registered"));
    }
    if ctx
        .storage
        .username_exists(&request.username)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::conflict("username is already registered"));
    }
    if ctx
        .storage
        .document_type_by_id(request.document_type)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err(ApiError::not_found("document type does not exist"));
    }
    if ctx
        .storage
        .country_by_id(request.country)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err(ApiError::not_found("country does not exist"));
    }
    if ctx
        .storage
        .document_exists(request.document_type, &request.document_number)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::conflict("document is already registered"));
    }

    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("hashing task failed: {e}")))?
        .map_err(internal)?;

    let registration = NewRegistration {
        email,
        username: request.username,
        password_hash,
        name: request.name,
        last_name: request.last_name,
        is_militar: request.is_militar,
        document_type_id: request.document_type,
        document_number: request.document_number,
        place_expedition: request.document_expedition_place,
        date_expedition: request.document_expedition_date,
        country_id: request.country,
        address: request.address,
        city: request.city,
        phone: request.phone,
        cel_phone: request.cel_phone,
        emergency_name: request.emergency_name,
        emergency_phone: request.emergency_phone,
    };

    let user_id = ctx
        .storage
        .register_user(&registration)
        .await
        .map_err(|err| match err.downcast_ref::<DuplicateRegistration>() {
            Some(duplicate) => ApiError::conflict(duplicate.to_string()),
            None => internal(err),
        })?;
    let user = ctx
        .storage
        .load_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::Internal, "registered user vanished"))?;
    info!(user_id = user_id.0, username = %user.username, "user registered");
    Ok(user)
}

fn validate_registration_fields(request: &RegistrationRequest) -> Result<(), ApiError> {
    for (field, value) in [
        ("email", &request.email),
        ("username", &request.username),
        ("password", &request.password),
        ("name", &request.name),
        ("lastName", &request.last_name),
        ("documentNumber", &request.document_number),
        ("documentExpeditionPlace", &request.document_expedition_place),
        ("address", &request.address),
        ("city", &request.city),
        ("phone", &request.phone),
        ("celPhone", &request.cel_phone),
        ("emergencyName", &request.emergency_name),
        ("emergencyPhone", &request.emergency_phone),
    ] {
        require(field, value)?;
    }

    validate_address(&request.address)?;
    validate_phone("phone", &request.phone)?;
    validate_phone("celPhone", &request.cel_phone)?;
    validate_phone("emergencyPhone", &request.emergency_phone)?;

    validate_max_len("username", &request.username, MAX_USERNAME_LEN)?;
    validate_max_len("name", &request.name, MAX_NAME_LEN)?;
    validate_max_len("lastName", &request.last_name, MAX_LAST_NAME_LEN)?;
    validate_max_len(
        "documentExpeditionPlace",
        &request.document_expedition_place,
        MAX_PLACE_EXPEDITION_LEN,
    )?;
    validate_max_len("city", &request.city, MAX_CITY_LEN)?;
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    let message = format!("{err:#}");
    warn!(error = %message, "storage failure");
    ApiError::new(ErrorCode::Internal, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (ApiContext, CountryId, DocumentTypeId) {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let country = storage
            .create_country("CO", "Colombia")
            .await
            .expect("country");
        let document_type = storage
            .create_document_type("Cedula de Ciudadania")
            .await
            .expect("document type");
        (ApiContext { storage }, country, document_type)
    }

    fn request(country: CountryId, document_type: DocumentTypeId) -> RegistrationRequest {
        RegistrationRequest {
            email: "test@Example.com".into(),
            username: "testuser".into(),
            password: "testpass123".into(),
            name: "Test".into(),
            last_name: "User".into(),
            is_militar: false,
            document_type,
            document_number: "1234567890".into(),
            document_expedition_place: "Bogota".into(),
            document_expedition_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("date"),
            country,
            address: "Calle 123 N 45-67".into(),
            city: "Bogota".into(),
            phone: "1234567".into(),
            cel_phone: "3001234567".into(),
            emergency_name: "Emergency Contact".into(),
            emergency_phone: "3009876543".into(),
        }
    }

    #[tokio::test]
    async fn registers_user_and_hashes_password() {
        let (ctx, country, document_type) = setup().await;
        let user = register_user(&ctx, request(country, document_type))
            .await
            .expect("register");
        assert_eq!(user.email, "test@example.com");
        assert_ne!(user.password_hash, "testpass123");
        assert!(password::verify_password("testpass123", &user.password_hash).expect("verify"));

        let contact = ctx
            .storage
            .load_contact_info(user.user_id)
            .await
            .expect("query")
            .expect("contact");
        assert_eq!(contact.country_id, country);
    }

    #[tokio::test]
    async fn rejects_duplicate_email_and_username() {
        let (ctx, country, document_type) = setup().await;
        register_user(&ctx, request(country, document_type))
            .await
            .expect("first");

        let mut same_email = request(country, document_type);
        same_email.username = "other".into();
        same_email.document_number = "999".into();
        let err = register_user(&ctx, same_email)
            .await
            .expect_err("duplicate email");
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "email is already registered");

        let mut same_username = request(country, document_type);
        same_username.email = "other@example.com".into();
        same_username.document_number = "999".into();
        let err = register_user(&ctx, same_username)
            .await
            .expect_err("duplicate username");
        assert_eq!(err.message, "username is already registered");
    }

    #[tokio::test]
    async fn rejects_duplicate_document_for_same_type() {
        let (ctx, country, document_type) = setup().await;
        register_user(&ctx, request(country, document_type))
            .await
            .expect("first");

        let mut second = request(country, document_type);
        second.email = "second@example.com".into();
        second.username = "second".into();
        let err = register_user(&ctx, second)
            .await
            .expect_err("duplicate document");
        assert_eq!(err.message, "document is already registered");
    }

    #[tokio::test]
    async fn rejects_unknown_references() {
        let (ctx, country, document_type) = setup().await;
        let err = register_user(&ctx, request(country, DocumentTypeId(404)))
            .await
            .expect_err("unknown document type");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "document type does not exist");

        let err = register_user(&ctx, request(CountryId(404), document_type))
            .await
            .expect_err("unknown country");
        assert_eq!(err.message, "country does not exist");
        assert_eq!(ctx.storage.count_users().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn rejects_malformed_contact_fields_before_touching_storage() {
        let (ctx, country, document_type) = setup().await;

        let mut bad_phone = request(country, document_type);
        bad_phone.phone = "123abc".into();
        let err = register_user(&ctx, bad_phone).await.expect_err("phone");
        assert_eq!(err.code, ErrorCode::Validation);

        let mut bad_address = request(country, document_type);
        bad_address.address = "Calle 1 #2".into();
        register_user(&ctx, bad_address)
            .await
            .expect_err("address");

        let mut long_username = request(country, document_type);
        long_username.username = "u".repeat(31);
        let err = register_user(&ctx, long_username)
            .await
            .expect_err("username");
        assert_eq!(err.message, "username must be at most 30 characters");

        let mut blank_city = request(country, document_type);
        blank_city.city = "   ".into();
        let err = register_user(&ctx, blank_city).await.expect_err("city");
        assert_eq!(err.message, "city is required");
    }

    #[tokio::test]
    async fn concurrent_duplicate_email_is_a_conflict() {
        let (ctx, country, document_type) = setup().await;
        let first = request(country, document_type);
        let mut second = request(country, document_type);
        second.username = "otheruser".into();
        second.document_number = "555".into();

        let (a, b) = tokio::join!(register_user(&ctx, first), register_user(&ctx, second));
        let err = match (a, b) {
            (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
            other => panic!("expected exactly one success: {other:?}"),
        };
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "email is already registered");
        assert_eq!(ctx.storage.count_users().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn surrounding_whitespace_does_not_create_distinct_users() {
        let (ctx, country, document_type) = setup().await;
        let mut padded = request(country, document_type);
        padded.username = " testuser ".into();
        padded.city = " Bogota ".into();
        let user = register_user(&ctx, padded).await.expect("register");
        assert_eq!(user.username, "testuser");

        let mut plain = request(country, document_type);
        plain.email = "second@example.com".into();
        plain.document_number = "555".into();
        let err = register_user(&ctx, plain).await.expect_err("same username");
        assert_eq!(err.message, "username is already registered");

        let contact = ctx
            .storage
            .load_contact_info(user.user_id)
            .await
            .expect("query")
            .expect("contact");
        assert_eq!(contact.city, "Bogota");
    }

    #[test]
    fn internal_errors_keep_the_whole_cause_chain() {
        let err = internal(anyhow::anyhow!("UNIQUE constraint failed").context("failed to insert user"));
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "failed to insert user: UNIQUE constraint failed");
    }

    #[tokio::test]
    async fn create_country_rejects_duplicates_and_long_codes() {
        let (ctx, _, _) = setup().await;
        let err = create_country(&ctx, "CO", "Colombia")
            .await
            .expect_err("duplicate");
        assert_eq!(err.code, ErrorCode::Conflict);

        create_country(&ctx, "COLOM", "Too long")
            .await
            .expect_err("code too long");

        let peru = create_country(&ctx, " PE ", "Peru").await.expect("create");
        assert_eq!(peru.country_code, "PE");
        assert_eq!(list_countries(&ctx).await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn create_document_type_rejects_duplicates() {
        let (ctx, _, _) = setup().await;
        let err = create_document_type(&ctx, "Cedula de Ciudadania")
            .await
            .expect_err("duplicate");
        assert!(err.is_user_facing());

        let passport = create_document_type(&ctx, "Passport").await.expect("create");
        let found = document_type_by_id(&ctx, passport.id)
            .await
            .expect("query")
            .expect("found");
        assert_eq!(found.name_type_document, "Passport");
    }
}
