//! Auth middleware.

use std::sync::Arc;

use emporium_app::auth::AuthServiceError;
use jiff::Timestamp;
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use crate::{extensions::*, state::State};

/// Resolve the bearer token to a [`Principal`](emporium_app::auth::Principal)
/// and store it in the depot.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(token) = extract_bearer_token(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid Authorization header"));
        ctrl.skip_rest();

        return;
    };

    let state = match depot.obtain::<Arc<State>>() {
        Ok(state) => state,
        Err(_error) => {
            res.render(StatusError::internal_server_error());
            ctrl.skip_rest();

            return;
        }
    };

    let principal = match state
        .app
        .auth
        .authenticate_bearer(token, Timestamp::now())
        .await
    {
        Ok(principal) => principal,
        Err(AuthServiceError::NotFound | AuthServiceError::InvalidReference) => {
            res.render(StatusError::unauthorized().brief("Invalid or expired session"));
            ctrl.skip_rest();

            return;
        }
        Err(AuthServiceError::Sql(source)) => {
            error!("failed to validate session: {source}");

            res.render(StatusError::internal_server_error());
            ctrl.skip_rest();

            return;
        }
    };

    depot.insert_principal(principal);

    ctrl.call_next(req, depot, res).await;
}

/// Reject callers whose session is not an admin session.
#[salvo::handler]
pub(crate) async fn require_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if let Err(status) = depot.admin_or_403() {
        res.render(status);
        ctrl.skip_rest();

        return;
    }

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use emporium_app::auth::{Principal, Role};
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, TEST_USER};

    use super::*;

    #[salvo::handler]
    async fn echo_user(depot: &mut Depot, res: &mut Response) {
        let user = depot
            .user_or_401()
            .map_or_else(|_| "missing".to_string(), |uuid| uuid.to_string());

        res.render(user);
    }

    fn make_service(mocks: Mocks) -> Service {
        let router = Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(handler)
            .push(Router::with_path("me").get(echo_user))
            .push(
                Router::with_path("admin")
                    .hoop(require_admin)
                    .get(echo_user),
            );

        Service::new(router)
    }

    fn session(role: Role) -> Principal {
        Principal {
            user_uuid: TEST_USER,
            role,
        }
    }

    #[tokio::test]
    async fn missing_authorization_header_returns_401() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com/me")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn non_bearer_scheme_returns_401() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com/me")
            .add_header(AUTHORIZATION, "Basic abc123", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_session_returns_401() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .withf(|token, _| token == "em_v1_abc")
            .return_once(|_, _| Err(AuthServiceError::NotFound));

        let res = TestClient::get("http://example.com/me")
            .add_header(AUTHORIZATION, "Bearer em_v1_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn valid_session_injects_principal() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .return_once(|_, _| Ok(session(Role::Customer)));

        let mut res = TestClient::get("http://example.com/me")
            .add_header(AUTHORIZATION, "Bearer em_v1_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, TEST_USER.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn customer_session_on_admin_route_returns_403() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .return_once(|_, _| Ok(session(Role::Customer)));

        let res = TestClient::get("http://example.com/admin")
            .add_header(AUTHORIZATION, "Bearer em_v1_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn admin_session_passes_admin_guard() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .return_once(|_, _| Ok(session(Role::Admin)));

        let res = TestClient::get("http://example.com/admin")
            .add_header(AUTHORIZATION, "Bearer em_v1_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }
}
