use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// GraphQL `ID`s travel as strings; rows are keyed by SQLite integers.
macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match WireId::deserialize(deserializer)? {
                    WireId::Number(v) => Ok(Self(v)),
                    WireId::Text(v) => v.parse().map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

id_newtype!(CountryId);
id_newtype!(DocumentTypeId);
id_newtype!(UserId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: CountryId,
    pub country_code: String,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: DocumentTypeId,
    pub name_type_document: String,
}

/// Lookup lists used to populate the form's selection inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    #[serde(rename = "allCountries")]
    pub countries: Vec<Country>,
    #[serde(rename = "allDocumentTypes")]
    pub document_types: Vec<DocumentType>,
}

impl ReferenceData {
    pub fn has_country(&self, id: CountryId) -> bool {
        self.countries.iter().any(|c| c.id == id)
    }

    pub fn has_document_type(&self, id: DocumentTypeId) -> bool {
        self.document_types.iter().any(|d| d.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub user: Option<RegisteredUser>,
}
