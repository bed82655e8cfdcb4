use chrono::NaiveDate;
use server_api::{password::verify_password, register_user, ApiContext, RegistrationRequest};
use storage::Storage;

#[tokio::test]
async fn registration_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!("sqlite://{}", dir.path().join("registration.db").display());

    let storage = Storage::new(&database_url).await.expect("db");
    let country = storage
        .create_country("CO", "Colombia")
        .await
        .expect("country");
    let document_type = storage
        .create_document_type("Cedula de Ciudadania")
        .await
        .expect("document type");
    let ctx = ApiContext { storage };

    let user = register_user(
        &ctx,
        RegistrationRequest {
            email: "Ana@Example.com".into(),
            username: "ana".into(),
            password: "s3cret-pass".into(),
            name: "Ana".into(),
            last_name: "Lopez".into(),
            is_militar: true,
            document_type,
            document_number: "1234567890".into(),
            document_expedition_place: "Bogota".into(),
            document_expedition_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("date"),
            country,
            address: "Calle 123 N 45-67".into(),
            city: "Bogota".into(),
            phone: "1234567".into(),
            cel_phone: "3001234567".into(),
            emergency_name: "Luis".into(),
            emergency_phone: "3009876543".into(),
        },
    )
    .await
    .expect("registration");
    drop(ctx);

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let stored = reopened
        .load_user(user.user_id)
        .await
        .expect("load")
        .expect("user row");
    assert_eq!(stored.email, "Ana@example.com");
    assert!(stored.is_militar);
    assert!(stored.is_active);
    assert!(!stored.email_verified);
    assert!(verify_password("s3cret-pass", &stored.password_hash).expect("verify"));

    let document = reopened
        .load_user_document(user.user_id)
        .await
        .expect("load document")
        .expect("document row");
    assert_eq!(document.document_type_id, document_type);
    assert_eq!(document.document_number, "1234567890");

    let contact = reopened
        .load_contact_info(user.user_id)
        .await
        .expect("load contact")
        .expect("contact row");
    assert_eq!(contact.country_id, country);
    assert_eq!(contact.emergency_phone, "3009876543");
}
