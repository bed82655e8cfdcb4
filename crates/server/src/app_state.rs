use server_api::ApiContext;

use crate::graphql::RegistrationSchema;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) schema: RegistrationSchema,
    pub(crate) graphiql: bool,
}
