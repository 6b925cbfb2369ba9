// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{CallerContext, UserRole},
};

/// 1. O Trait que define quais papéis passam pelo guardião
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

/// 2. O Extractor (Guardião). Entrega o chamador já verificado.
pub struct RequireRole<T> {
    pub caller: CallerContext,
    _role: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o chamador (401 se o auth_guard não rodou)
        let AuthenticatedUser(caller) = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Confere o papel
        if !T::allows(caller.role) {
            let app_state = AppState::from_ref(state);
            return Err(AppError::Forbidden
                .to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store));
        }

        Ok(RequireRole {
            caller,
            _role: PhantomData,
        })
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Admin
    }
}

pub type RequireAdmin = RequireRole<AdminOnly>;
