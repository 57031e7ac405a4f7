//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{
        AuthServiceError, IssuedSession, NewSession, Principal, Role, SessionTokenVersion,
        format_session_token, generate_session_secret, hash_session_token, parse_session_token,
        repository::PgSessionsRepository,
    },
    database::Db,
    domain::users::records::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    sessions: PgSessionsRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            sessions: PgSessionsRepository::new(),
        }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(
        &self,
        bearer_token: &str,
        at: Timestamp,
    ) -> Result<Principal, AuthServiceError> {
        parse_session_token(bearer_token).map_err(|_| AuthServiceError::NotFound)?;

        let mut tx = self.db.begin_transaction().await?;

        let principal = self
            .sessions
            .find_active_session(&mut tx, &hash_session_token(bearer_token), at)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        tx.commit().await?;

        Ok(principal)
    }

    #[tracing::instrument(
        name = "auth.service.issue_session",
        skip(self),
        fields(user_uuid = %user, role = %role),
        err
    )]
    async fn issue_session(
        &self,
        user: UserUuid,
        role: Role,
        expires_at: Option<Timestamp>,
    ) -> Result<IssuedSession, AuthServiceError> {
        let session_uuid = Uuid::now_v7();
        let secret = generate_session_secret();
        let token = format_session_token(session_uuid, SessionTokenVersion::V1, &secret);

        let mut tx = self.db.begin_transaction().await?;

        let session = self
            .sessions
            .create_session(
                &mut tx,
                &NewSession {
                    uuid: session_uuid,
                    user_uuid: user,
                    role,
                    token_hash: hash_session_token(&token),
                    expires_at,
                },
            )
            .await?;

        tx.commit().await?;

        info!(session_uuid = %session.uuid, "issued session");

        Ok(IssuedSession { token, session })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the caller it was issued for.
    async fn authenticate_bearer(
        &self,
        bearer_token: &str,
        at: Timestamp,
    ) -> Result<Principal, AuthServiceError>;

    /// Create a session and return its raw token. The token is not
    /// recoverable afterwards.
    async fn issue_session(
        &self,
        user: UserUuid,
        role: Role,
        expires_at: Option<Timestamp>,
    ) -> Result<IssuedSession, AuthServiceError>;
}
