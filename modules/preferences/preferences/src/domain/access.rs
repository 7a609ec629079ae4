//! Access gate: decides whether a principal may run a preference operation.
//!
//! A caller moves through three states. Without a principal it is
//! unauthenticated. [`AccessGate::authenticate`] turns a principal into an
//! [`Authenticated`] caller, and [`Authenticated::authorize`] checks the read
//! scope and yields an [`Authorized`] caller. Mutations then go through
//! [`Authorized::ensure_can_modify`].

use prefkit_security::Principal;

use crate::config::AccessConfig;
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub struct AccessGate {
    read_scope: String,
    elevated_roles: Vec<String>,
}

impl AccessGate {
    pub fn new(read_scope: impl Into<String>, elevated_roles: Vec<String>) -> Self {
        Self {
            read_scope: read_scope.into(),
            elevated_roles,
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.read_scope.clone(), config.elevated_roles.clone())
    }

    /// # Errors
    /// `Unauthenticated` when there is no principal or it has no username.
    pub fn authenticate<'a>(
        &self,
        principal: Option<&'a Principal>,
    ) -> Result<Authenticated<'a>, DomainError> {
        match principal {
            Some(p) if !p.username().is_empty() => Ok(Authenticated { principal: p }),
            _ => Err(DomainError::Unauthenticated),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Authenticated<'a> {
    principal: &'a Principal,
}

impl<'a> Authenticated<'a> {
    /// # Errors
    /// `Forbidden` when the principal lacks the read scope.
    pub fn authorize(self, gate: &AccessGate) -> Result<Authorized<'a>, DomainError> {
        if !self.principal.has_scope(&gate.read_scope) {
            return Err(DomainError::forbidden(format!(
                "scope '{}' is required",
                gate.read_scope
            )));
        }
        Ok(Authorized {
            principal: self.principal,
            elevated: self.principal.has_any_role(&gate.elevated_roles),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Authorized<'a> {
    principal: &'a Principal,
    elevated: bool,
}

impl Authorized<'_> {
    #[must_use]
    pub fn username(&self) -> &str {
        self.principal.username()
    }

    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    #[must_use]
    pub fn can_modify(&self, owner: &str) -> bool {
        self.elevated || owner == self.username()
    }

    /// # Errors
    /// `Forbidden` unless the caller owns the target or holds an elevated role.
    pub fn ensure_can_modify(&self, owner: &str) -> Result<(), DomainError> {
        if self.can_modify(owner) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "'{}' cannot modify preferences owned by '{owner}'",
                self.username()
            )))
        }
    }
}
