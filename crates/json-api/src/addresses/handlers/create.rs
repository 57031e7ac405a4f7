//! Create Address Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use emporium_app::domain::addresses::{data::NewAddress, records::AddressUuid};

use crate::{
    addresses::{errors::into_status_error, index::AddressResponse},
    extensions::*,
    state::State,
};

/// Create Address Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateAddressRequest {
    pub name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl CreateAddressRequest {
    fn has_blank_field(&self) -> bool {
        [
            &self.name,
            &self.phone,
            &self.line1,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .any(|value| value.trim().is_empty())
    }
}

impl From<CreateAddressRequest> for NewAddress {
    fn from(request: CreateAddressRequest) -> Self {
        NewAddress {
            uuid: AddressUuid::new(),
            name: request.name,
            phone: request.phone,
            line1: request.line1,
            line2: request.line2.filter(|line| !line.trim().is_empty()),
            city: request.city,
            state: request.state,
            postal_code: request.postal_code,
        }
    }
}

/// Create Address Handler
#[endpoint(
    tags("addresses"),
    summary = "Create Address",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Address created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateAddressRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<AddressResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;
    let request = json.into_inner();

    if request.has_blank_field() {
        return Err(StatusError::bad_request().brief("Address fields must not be blank"));
    }

    let address = state
        .app
        .addresses
        .create_address(user, request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/addresses/{}", address.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(address.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use crate::{
        addresses::handlers::tests::make_address,
        test_helpers::{Mocks, customer_service},
    };

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("addresses").post(handler))
    }

    fn payload() -> Value {
        json!({
            "name": "Asha Rao",
            "phone": "9000000001",
            "line1": "12 Lake Road",
            "city": "Kochi",
            "state": "Kerala",
            "postal_code": "682001",
        })
    }

    #[tokio::test]
    async fn test_create_address_success() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .addresses
            .expect_create_address()
            .once()
            .withf(|_, address| address.city == "Kochi" && address.line2.is_none())
            .return_once(|_, address| Ok(make_address(address.uuid, true)));

        let mut res = TestClient::post("http://example.com/addresses")
            .json(&payload())
            .send(&make_service(mocks))
            .await;

        let body: AddressResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/addresses/{}", body.uuid).as_str()));
        assert!(body.is_primary, "expected first address to be primary");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_blank_address_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.addresses.expect_create_address().never();

        let mut body = payload();

        if let Some(fields) = body.as_object_mut() {
            fields.insert("city".to_string(), Value::from(" "));
        }

        let res = TestClient::post("http://example.com/addresses")
            .json(&body)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
