//! GraphQL schema: reference-data queries and the registration mutations.

use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Schema, SimpleObject, ID,
};
use chrono::NaiveDate;
use server_api::{ApiContext, RegistrationRequest, REGISTRATION_SUCCESS_MESSAGE};
use shared::{
    domain::{Country, CountryId, DocumentType, DocumentTypeId},
    error::{ApiError, ErrorCode},
};
use storage::StoredUser;
use tracing::{error, warn};

pub type RegistrationSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(api: ApiContext) -> RegistrationSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(api)
        .finish()
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Country")]
pub struct CountryNode {
    pub id: ID,
    pub country_code: String,
    pub country_name: String,
}

impl From<Country> for CountryNode {
    fn from(country: Country) -> Self {
        Self {
            id: ID(country.id.to_string()),
            country_code: country.country_code,
            country_name: country.country_name,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "DocumentType")]
pub struct DocumentTypeNode {
    pub id: ID,
    pub name_type_document: String,
}

impl From<DocumentType> for DocumentTypeNode {
    fn from(document_type: DocumentType) -> Self {
        Self {
            id: ID(document_type.id.to_string()),
            name_type_document: document_type.name_type_document,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "User")]
pub struct UserNode {
    pub id: ID,
    pub email: String,
    pub username: String,
    pub name: String,
    pub last_name: String,
    pub is_militar: bool,
    pub is_active: bool,
    pub email_verified: bool,
}

impl From<StoredUser> for UserNode {
    fn from(user: StoredUser) -> Self {
        Self {
            id: ID(user.user_id.to_string()),
            email: user.email,
            username: user.username,
            name: user.name,
            last_name: user.last_name,
            is_militar: user.is_militar,
            is_active: user.is_active,
            email_verified: user.email_verified,
        }
    }
}

#[derive(Debug, InputObject)]
#[graphql(name = "UserRegistrationInput")]
pub struct RegistrationInputObject {
    pub email: String,
    pub username: String,
    pub password: String,
    pub last_name: String,
    pub name: String,
    #[graphql(default)]
    pub is_militar: bool,
    pub document_type: ID,
    pub document_number: String,
    pub document_expedition_place: String,
    pub document_expedition_date: NaiveDate,
    pub country: ID,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub cel_phone: String,
    pub emergency_name: String,
    pub emergency_phone: String,
}

impl RegistrationInputObject {
    fn into_request(self) -> Result<RegistrationRequest, ApiError> {
        let document_type = self
            .document_type
            .parse::<DocumentTypeId>()
            .map_err(|_| ApiError::not_found("document type does not exist"))?;
        let country = self
            .country
            .parse::<CountryId>()
            .map_err(|_| ApiError::not_found("country does not exist"))?;

        Ok(RegistrationRequest {
            email: self.email,
            username: self.username,
            password: self.password,
            name: self.name,
            last_name: self.last_name,
            is_militar: self.is_militar,
            document_type,
            document_number: self.document_number,
            document_expedition_place: self.document_expedition_place,
            document_expedition_date: self.document_expedition_date,
            country,
            address: self.address,
            city: self.city,
            phone: self.phone,
            cel_phone: self.cel_phone,
            emergency_name: self.emergency_name,
            emergency_phone: self.emergency_phone,
        })
    }
}

#[derive(Debug, SimpleObject)]
pub struct RegisterUserPayload {
    pub success: bool,
    pub message: String,
    pub user: Option<UserNode>,
}

#[derive(Debug, SimpleObject)]
pub struct CreateCountryPayload {
    pub success: bool,
    pub message: String,
    pub country: Option<CountryNode>,
}

#[derive(Debug, SimpleObject)]
pub struct CreateTypeDocumentPayload {
    pub success: bool,
    pub message: String,
    pub type_document: Option<DocumentTypeNode>,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn all_countries(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CountryNode>> {
        let api = ctx.data::<ApiContext>()?;
        let countries = server_api::list_countries(api).await.map_err(to_graphql_error)?;
        Ok(countries.into_iter().map(Into::into).collect())
    }

    async fn all_document_types(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<DocumentTypeNode>> {
        let api = ctx.data::<ApiContext>()?;
        let document_types = server_api::list_document_types(api)
            .await
            .map_err(to_graphql_error)?;
        Ok(document_types.into_iter().map(Into::into).collect())
    }

    async fn country_by_id(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<CountryNode>> {
        let api = ctx.data::<ApiContext>()?;
        let Ok(id) = id.parse::<CountryId>() else {
            return Ok(None);
        };
        let country = server_api::country_by_id(api, id)
            .await
            .map_err(to_graphql_error)?;
        Ok(country.map(Into::into))
    }

    async fn document_type_by_id(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<DocumentTypeNode>> {
        let api = ctx.data::<ApiContext>()?;
        let Ok(id) = id.parse::<DocumentTypeId>() else {
            return Ok(None);
        };
        let document_type = server_api::document_type_by_id(api, id)
            .await
            .map_err(to_graphql_error)?;
        Ok(document_type.map(Into::into))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn register_user(
        &self,
        ctx: &Context<'_>,
        input: RegistrationInputObject,
    ) -> async_graphql::Result<RegisterUserPayload> {
        let api = ctx.data::<ApiContext>()?;
        let outcome = match input.into_request() {
            Ok(request) => server_api::register_user(api, request).await,
            Err(err) => Err(err),
        };

        Ok(match outcome {
            Ok(user) => RegisterUserPayload {
                success: true,
                message: REGISTRATION_SUCCESS_MESSAGE.to_string(),
                user: Some(user.into()),
            },
            Err(err) => RegisterUserPayload {
                success: false,
                message: failure_message("registerUser", err),
                user: None,
            },
        })
    }

    async fn create_country(
        &self,
        ctx: &Context<'_>,
        country_code: String,
        country_name: String,
    ) -> async_graphql::Result<CreateCountryPayload> {
        let api = ctx.data::<ApiContext>()?;
        Ok(
            match server_api::create_country(api, &country_code, &country_name).await {
                Ok(country) => CreateCountryPayload {
                    success: true,
                    message: "Country created successfully".to_string(),
                    country: Some(country.into()),
                },
                Err(err) => CreateCountryPayload {
                    success: false,
                    message: failure_message("createCountry", err),
                    country: None,
                },
            },
        )
    }

    async fn create_type_document(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> async_graphql::Result<CreateTypeDocumentPayload> {
        let api = ctx.data::<ApiContext>()?;
        Ok(match server_api::create_document_type(api, &name).await {
            Ok(document_type) => CreateTypeDocumentPayload {
                success: true,
                message: "Document type created successfully".to_string(),
                type_document: Some(document_type.into()),
            },
            Err(err) => CreateTypeDocumentPayload {
                success: false,
                message: failure_message("createTypeDocument", err),
                type_document: None,
            },
        })
    }
}

/// Business-rule rejections are echoed; internal failures are logged and masked.
fn failure_message(operation: &'static str, err: ApiError) -> String {
    if err.is_user_facing() {
        warn!(operation, code = ?err.code, message = %err.message, "mutation rejected");
        err.message
    } else {
        error!(operation, message = %err.message, "mutation failed");
        "internal server error".to_string()
    }
}

fn to_graphql_error(err: ApiError) -> async_graphql::Error {
    let code = match err.code {
        ErrorCode::Validation => "VALIDATION",
        ErrorCode::Conflict => "CONFLICT",
        ErrorCode::NotFound => "NOT_FOUND",
        ErrorCode::Internal => "INTERNAL",
    };
    let message = if err.is_user_facing() {
        err.message
    } else {
        error!(message = %err.message, "query failed");
        "internal server error".to_string()
    };
    async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
