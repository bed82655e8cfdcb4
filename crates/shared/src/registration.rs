use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every input of the registration form, addressed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Email,
    Username,
    Password,
    Name,
    LastName,
    IsMilitar,
    DocumentType,
    DocumentNumber,
    DocumentExpeditionPlace,
    DocumentExpeditionDate,
    Country,
    Address,
    City,
    Phone,
    CelPhone,
    EmergencyName,
    EmergencyPhone,
}

impl FormField {
    pub const ALL: [FormField; 17] = [
        FormField::Email,
        FormField::Username,
        FormField::Password,
        FormField::Name,
        FormField::LastName,
        FormField::IsMilitar,
        FormField::DocumentType,
        FormField::DocumentNumber,
        FormField::DocumentExpeditionPlace,
        FormField::DocumentExpeditionDate,
        FormField::Country,
        FormField::Address,
        FormField::City,
        FormField::Phone,
        FormField::CelPhone,
        FormField::EmergencyName,
        FormField::EmergencyPhone,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            FormField::Email => "email",
            FormField::Username => "username",
            FormField::Password => "password",
            FormField::Name => "name",
            FormField::LastName => "lastName",
            FormField::IsMilitar => "isMilitar",
            FormField::DocumentType => "documentType",
            FormField::DocumentNumber => "documentNumber",
            FormField::DocumentExpeditionPlace => "documentExpeditionPlace",
            FormField::DocumentExpeditionDate => "documentExpeditionDate",
            FormField::Country => "country",
            FormField::Address => "address",
            FormField::City => "city",
            FormField::Phone => "phone",
            FormField::CelPhone => "celPhone",
            FormField::EmergencyName => "emergencyName",
            FormField::EmergencyPhone => "emergencyPhone",
        }
    }

    /// `isMilitar` is the only optional input and the only checkbox.
    pub fn is_required(self) -> bool {
        !self.is_checkbox()
    }

    pub fn is_checkbox(self) -> bool {
        matches!(self, FormField::IsMilitar)
    }

    pub fn is_selection(self) -> bool {
        matches!(self, FormField::Country | FormField::DocumentType)
    }

    pub fn section(self) -> FormSection {
        match self {
            FormField::Email
            | FormField::Username
            | FormField::Password
            | FormField::Name
            | FormField::LastName
            | FormField::IsMilitar => FormSection::BasicInformation,
            FormField::DocumentType
            | FormField::DocumentNumber
            | FormField::DocumentExpeditionPlace
            | FormField::DocumentExpeditionDate => FormSection::DocumentInformation,
            FormField::Country
            | FormField::Address
            | FormField::City
            | FormField::Phone
            | FormField::CelPhone
            | FormField::EmergencyName
            | FormField::EmergencyPhone => FormSection::ContactInformation,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.wire_name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSection {
    BasicInformation,
    DocumentInformation,
    ContactInformation,
}

impl FormSection {
    pub fn title(self) -> &'static str {
        match self {
            FormSection::BasicInformation => "Basic Information",
            FormSection::DocumentInformation => "Document Information",
            FormSection::ContactInformation => "Contact Information",
        }
    }
}

/// Checkbox inputs carry booleans, everything else carries text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Checked(value)
    }
}

/// Live form state. Selections hold the raw option value (an id or "").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub last_name: String,
    pub is_militar: bool,
    pub document_type: String,
    pub document_number: String,
    pub document_expedition_place: String,
    pub document_expedition_date: String,
    pub country: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub cel_phone: String,
    pub emergency_name: String,
    pub emergency_phone: String,
}

impl RegistrationInput {
    pub fn text(&self, field: FormField) -> Option<&str> {
        let value = match field {
            FormField::Email => &self.email,
            FormField::Username => &self.username,
            FormField::Password => &self.password,
            FormField::Name => &self.name,
            FormField::LastName => &self.last_name,
            FormField::IsMilitar => return None,
            FormField::DocumentType => &self.document_type,
            FormField::DocumentNumber => &self.document_number,
            FormField::DocumentExpeditionPlace => &self.document_expedition_place,
            FormField::DocumentExpeditionDate => &self.document_expedition_date,
            FormField::Country => &self.country,
            FormField::Address => &self.address,
            FormField::City => &self.city,
            FormField::Phone => &self.phone,
            FormField::CelPhone => &self.cel_phone,
            FormField::EmergencyName => &self.emergency_name,
            FormField::EmergencyPhone => &self.emergency_phone,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        let slot = match field {
            FormField::Email => &mut self.email,
            FormField::Username => &mut self.username,
            FormField::Password => &mut self.password,
            FormField::Name => &mut self.name,
            FormField::LastName => &mut self.last_name,
            FormField::IsMilitar => return None,
            FormField::DocumentType => &mut self.document_type,
            FormField::DocumentNumber => &mut self.document_number,
            FormField::DocumentExpeditionPlace => &mut self.document_expedition_place,
            FormField::DocumentExpeditionDate => &mut self.document_expedition_date,
            FormField::Country => &mut self.country,
            FormField::Address => &mut self.address,
            FormField::City => &mut self.city,
            FormField::Phone => &mut self.phone,
            FormField::CelPhone => &mut self.cel_phone,
            FormField::EmergencyName => &mut self.emergency_name,
            FormField::EmergencyPhone => &mut self.emergency_phone,
        };
        Some(slot)
    }

    /// Writes one field. Returns the value back when its kind does not fit the field.
    pub fn set(&mut self, field: FormField, value: FieldValue) -> Result<(), FieldValue> {
        match (field, value) {
            (FormField::IsMilitar, FieldValue::Checked(checked)) => {
                self.is_militar = checked;
                Ok(())
            }
            (field, FieldValue::Text(text)) => match self.text_mut(field) {
                Some(slot) => {
                    *slot = text;
                    Ok(())
                }
                None => Err(FieldValue::Text(text)),
            },
            (_, value) => Err(value),
        }
    }

    /// Required fields still holding an empty string, in form order.
    pub fn missing_required_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| field.is_required())
            .filter(|field| self.text(*field).is_some_and(str::is_empty))
            .collect()
    }

    pub fn to_wire(&self) -> UserRegistrationInput {
        fn non_empty(value: &str) -> Option<String> {
            (!value.is_empty()).then(|| value.to_string())
        }

        UserRegistrationInput {
            email: non_empty(&self.email),
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            name: non_empty(&self.name),
            last_name: non_empty(&self.last_name),
            is_militar: self.is_militar,
            document_type: non_empty(&self.document_type),
            document_number: non_empty(&self.document_number),
            document_expedition_place: non_empty(&self.document_expedition_place),
            document_expedition_date: non_empty(&self.document_expedition_date),
            country: non_empty(&self.country),
            address: non_empty(&self.address),
            city: non_empty(&self.city),
            phone: non_empty(&self.phone),
            cel_phone: non_empty(&self.cel_phone),
            emergency_name: non_empty(&self.emergency_name),
            emergency_phone: non_empty(&self.emergency_phone),
        }
    }
}

/// `UserRegistrationInput` as sent in the mutation variables. Empty strings become `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistrationInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub is_militar: bool,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub document_expedition_place: Option<String>,
    pub document_expedition_date: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub cel_phone: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationVariables {
    pub input: UserRegistrationInput,
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
