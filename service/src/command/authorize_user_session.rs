//! [`Command`] for authorizing a user [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::{Algorithm, Validation};
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a user [`Session`] by its [`session::Token`]
/// issued by the identity provider.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Gw, Nt> Command<AuthorizeUserSession> for Service<Db, Gw, Nt> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(tracerr::from_and_wrap!(=> ExecutionError))?
        .claims;

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{DecodingKey, EncodingKey, Header};

    use crate::{
        domain::user::{self, session, Session},
        infra::{notifier::Silent, Memory},
        task, Command as _, Config, Service,
    };

    use super::AuthorizeUserSession;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> Service<Memory, (), Silent> {
        Service {
            config: Config {
                jwt_decoding_key: DecodingKey::from_secret(SECRET),
                expire_leases: task::expire_leases::Config::default(),
            },
            database: Memory::new(),
            gateway: (),
            notifier: Silent,
        }
    }

    fn token(session: &Session, secret: &[u8]) -> session::Token {
        let raw = jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: (DateTime::now() + Duration::from_secs(3600)).coerce(),
        };

        let authorized = service()
            .execute(AuthorizeUserSession {
                token: token(&session, SECRET),
            })
            .await
            .unwrap();

        assert_eq!(authorized.user_id, session.user_id);
    }

    #[tokio::test]
    async fn rejects_foreign_or_expired_token() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: (DateTime::now() + Duration::from_secs(3600)).coerce(),
        };
        assert!(service()
            .execute(AuthorizeUserSession {
                token: token(&session, b"another-secret"),
            })
            .await
            .is_err());

        let expired = Session {
            user_id: user::Id::new(),
            expires_at: (DateTime::now() - Duration::from_secs(3600)).coerce(),
        };
        assert!(service()
            .execute(AuthorizeUserSession {
                token: token(&expired, SECRET),
            })
            .await
            .is_err());
    }
}
