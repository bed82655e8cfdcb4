use super::*;

fn filled() -> RegistrationInput {
    RegistrationInput {
        email: "ana@example.com".into(),
        username: "ana".into(),
        password: "s3cret!".into(),
        name: "Ana".into(),
        last_name: "Gomez".into(),
        is_militar: false,
        document_type: "1".into(),
        document_number: "1234567890".into(),
        document_expedition_place: "Bogota".into(),
        document_expedition_date: "2020-01-01".into(),
        country: "1".into(),
        address: "Calle 123 N 45-67".into(),
        city: "Bogota".into(),
        phone: "6011234".into(),
        cel_phone: "3001234567".into(),
        emergency_name: "Luis Gomez".into(),
        emergency_phone: "3009876543".into(),
    }
}

#[test]
fn parses_every_wire_name() {
    for field in FormField::ALL {
        assert_eq!(field.wire_name().parse::<FormField>(), Ok(field));
    }
    assert_eq!(
        "last_name".parse::<FormField>(),
        Err(UnknownField("last_name".to_string()))
    );
}

#[test]
fn unknown_field_error_names_the_field() {
    let err = "favoriteColor".parse::<FormField>().expect_err("unknown");
    assert_eq!(err.to_string(), "unknown form field 'favoriteColor'");
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    assert!(boxed.source().is_none());
}

#[test]
fn empty_form_reports_every_required_field_missing() {
    let missing = RegistrationInput::default().missing_required_fields();
    assert_eq!(missing.len(), 16);
    assert!(!missing.contains(&FormField::IsMilitar));
    assert_eq!(missing[0], FormField::Email);
}

#[test]
fn filled_form_has_nothing_missing() {
    assert!(filled().missing_required_fields().is_empty());
}

#[test]
fn checkbox_only_accepts_booleans() {
    let mut input = RegistrationInput::default();
    input
        .set(FormField::IsMilitar, FieldValue::Checked(true))
        .expect("checkbox");
    assert!(input.is_militar);

    let rejected = input
        .set(FormField::IsMilitar, FieldValue::from("yes"))
        .expect_err("text on checkbox");
    assert_eq!(rejected, FieldValue::Text("yes".into()));

    input
        .set(FormField::City, FieldValue::Checked(true))
        .expect_err("bool on text field");
    assert_eq!(input.city, "");
}

#[test]
fn set_replaces_a_single_field() {
    let mut input = filled();
    input
        .set(FormField::CelPhone, FieldValue::from("3110000000"))
        .expect("set");
    let mut expected = filled();
    expected.cel_phone = "3110000000".into();
    assert_eq!(input, expected);
}

#[test]
fn wire_input_turns_empty_strings_into_null() {
    let mut input = filled();
    input.city.clear();
    let encoded = serde_json::to_value(input.to_wire()).expect("json");
    assert!(encoded["city"].is_null());
    assert_eq!(encoded["lastName"], "Gomez");
    assert_eq!(encoded["isMilitar"], false);
    assert_eq!(encoded["documentExpeditionDate"], "2020-01-01");
}

#[test]
fn sections_follow_form_layout() {
    assert_eq!(FormField::IsMilitar.section(), FormSection::BasicInformation);
    assert_eq!(
        FormField::DocumentExpeditionDate.section(),
        FormSection::DocumentInformation
    );
    assert_eq!(
        FormField::Country.section().title(),
        "Contact Information"
    );
    assert!(FormField::Country.is_selection());
}
