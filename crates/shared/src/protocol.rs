use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::RegistrationResult;

pub const INITIAL_DATA_QUERY: &str = r#"query InitialData {
  allCountries {
    id
    countryCode
    countryName
  }
  allDocumentTypes {
    id
    nameTypeDocument
  }
}"#;

pub const REGISTER_USER_MUTATION: &str = r#"mutation RegisterUser($input: UserRegistrationInput!) {
  registerUser(input: $input) {
    success
    message
    user {
      id
      email
    }
  }
}"#;

/// Body of a GraphQL-over-HTTP POST.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<V = serde_json::Value> {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<V>,
}

impl GraphQlRequest<serde_json::Value> {
    pub fn initial_data() -> Self {
        Self {
            query: INITIAL_DATA_QUERY.to_string(),
            operation_name: Some("InitialData".to_string()),
            variables: None,
        }
    }
}

impl<V> GraphQlRequest<V> {
    pub fn register_user(variables: V) -> Self {
        Self {
            query: REGISTER_USER_MUTATION.to_string(),
            operation_name: Some("RegisterUser".to_string()),
            variables: Some(variables),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
}

impl<T: DeserializeOwned> GraphQlResponse<T> {
    /// Joins every error message; `None` when the response carried none.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserData {
    pub register_user: RegistrationResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountryId, ReferenceData};

    #[test]
    fn decodes_initial_data_with_string_ids() {
        let raw = r#"{"data":{"allCountries":[{"id":"4","countryCode":"CO","countryName":"Colombia"}],
            "allDocumentTypes":[{"id":"2","nameTypeDocument":"Passport"}]}}"#;
        let response: GraphQlResponse<ReferenceData> = serde_json::from_str(raw).expect("json");
        let data = response.data.as_ref().expect("data");
        assert_eq!(data.countries[0].id, CountryId(4));
        assert_eq!(data.document_types[0].name_type_document, "Passport");
        assert!(response.error_summary().is_none());
    }

    #[test]
    fn summarizes_graphql_errors() {
        let raw = r#"{"data":null,"errors":[{"message":"first"},{"message":"second","path":["registerUser"]}]}"#;
        let response: GraphQlResponse<RegisterUserData> = serde_json::from_str(raw).expect("json");
        assert!(response.data.is_none());
        assert_eq!(response.error_summary().as_deref(), Some("first; second"));
    }

    #[test]
    fn register_request_carries_operation_name_and_variables() {
        let request = GraphQlRequest::register_user(serde_json::json!({ "input": {} }));
        let encoded = serde_json::to_value(&request).expect("json");
        assert_eq!(encoded["operationName"], "RegisterUser");
        assert!(encoded["query"]
            .as_str()
            .expect("query")
            .contains("registerUser(input: $input)"));
        assert!(encoded["variables"]["input"].is_object());
    }
}
