//! Identity context middleware.
//!
//! Derives a per-request authentication state from the Authorization header
//! and never rejects the request: a missing header, a malformed header, or a
//! token that fails verification all yield an unauthenticated context, and
//! each downstream operation decides for itself whether to require
//! authentication.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ApiError;
use crate::security::token::SessionTokenCodec;

/// Per-request authentication state. Derived once by the middleware,
/// read-only downstream, discarded at request end.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityContext {
    authenticated: bool,
    subject: Option<Uuid>,
}

impl IdentityContext {
    pub fn authenticated(subject: Uuid) -> Self {
        Self {
            authenticated: true,
            subject: Some(subject),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn subject(&self) -> Option<Uuid> {
        self.subject
    }

    /// The subject id, or `Unauthenticated` — the one check operations use
    /// to demand a caller identity.
    pub fn require_subject(&self) -> Result<Uuid, ApiError> {
        if self.authenticated {
            self.subject.ok_or(ApiError::Unauthenticated)
        } else {
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Header parsing and verification. Every failure collapses to
/// unauthenticated.
fn derive_identity(header: Option<&str>, codec: &SessionTokenCodec) -> IdentityContext {
    let Some(header) = header else {
        return IdentityContext::unauthenticated();
    };

    // Authorization header format: "Bearer TOKEN_HERE"
    let Some(token) = header.strip_prefix("Bearer ") else {
        return IdentityContext::unauthenticated();
    };

    if token.is_empty() {
        return IdentityContext::unauthenticated();
    }

    match codec.verify(token) {
        Ok(subject) => IdentityContext::authenticated(subject),
        Err(_) => IdentityContext::unauthenticated(),
    }
}

/// Identity context middleware
pub struct IdentityMiddleware {
    codec: SessionTokenCodec,
}

impl IdentityMiddleware {
    pub fn new(codec: SessionTokenCodec) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service,
            codec: self.codec.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: S,
    codec: SessionTokenCodec,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());
        let identity = derive_identity(header, &self.codec);

        req.extensions_mut().insert(identity);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

impl FromRequest for IdentityContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let identity = req
            .extensions()
            .get::<IdentityContext>()
            .copied()
            .unwrap_or_default();
        ready(Ok(identity))
    }
}
