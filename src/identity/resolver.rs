//! Identity resolver and the `CurrentActor` request extractor

use crate::error::{AuthError, Error, Result};
use crate::identity::store::UserDirectory;
use crate::identity::token::TokenVerifier;
use crate::identity::types::Actor;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;

/// Resolves a bearer credential to an authenticated [`Actor`]
pub struct IdentityResolver {
    verifier: Arc<dyn TokenVerifier>,
    directory: Arc<dyn UserDirectory>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn TokenVerifier>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            verifier,
            directory,
        }
    }

    /// Resolve a raw token or an `Authorization` header value.
    ///
    /// Fails with `MissingCredential` when nothing usable is supplied and
    /// with `InvalidCredential` when the token does not verify or its
    /// subject is unknown to the directory. The role is taken from the
    /// directory record, not from the token.
    pub async fn resolve(&self, credential: Option<&str>) -> Result<Actor> {
        let token = credential
            .map(|c| {
                let c = c.trim_start();
                // Strip the scheme before trimming so "Bearer " is empty
                c.strip_prefix("Bearer")
                    .filter(|rest| rest.is_empty() || rest.starts_with(' '))
                    .unwrap_or(c)
                    .trim()
            })
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let claims = self.verifier.verify(token)?;

        match self.directory.find_by_id(&claims.sub).await? {
            Some(user) => Ok(Actor::from(&user)),
            None => {
                tracing::debug!(subject = %claims.sub, "Token subject not in directory");
                Err(AuthError::InvalidCredential("User not found".to_string()).into())
            }
        }
    }
}

/// Extractor yielding the actor behind the request's bearer token
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
    Arc<IdentityResolver>: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let resolver = Arc::<IdentityResolver>::from_ref(state);
        let credential = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let actor = resolver.resolve(credential).await?;
        Ok(Self(actor))
    }
}
