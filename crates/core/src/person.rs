//! # Person Module
//!
//! Workers, clients and the assignments that tie them together.
//! - Person: identified by RUT, owns a collection of documents
//! - Client: scope for client-specific prerequisite rules
//! - Assignment: a person working for a client

use crate::error::{CoreError, CoreResult};
use crate::rut::Rut;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A worker known to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// National identifier, canonical form `12345678-5`
    pub rut: Rut,
    /// Full name
    pub name: String,
    /// Job role (operator, driver, supervisor, ...)
    pub role: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Person {
    /// Create a new Person
    pub fn new(rut: Rut, name: &str) -> Self {
        Self {
            rut,
            name: name.to_string(),
            role: None,
            created_at: Utc::now(),
        }
    }

    /// Parse the RUT and create a Person
    pub fn parse(rut: &str, name: &str) -> CoreResult<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Person name must not be empty".to_string(),
            ));
        }
        Ok(Self::new(Rut::parse(rut)?, name.trim()))
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    /// Person id as stored (canonical RUT)
    pub fn id(&self) -> String {
        self.rut.to_string()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{} ({} - {})", self.name, self.rut.formatted(), role),
            None => write!(f, "{} ({})", self.name, self.rut.formatted()),
        }
    }
}

/// A client company that workers are assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Portfolio (cartera) that owns the client
    pub portfolio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(id: &str, name: &str) -> CoreResult<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CoreError::EmptyClientId);
        }
        Ok(Self {
            id: id.to_string(),
            name: name.trim().to_string(),
            portfolio: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_portfolio(mut self, portfolio: &str) -> Self {
        self.portfolio = Some(portfolio.to_string());
        self
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A person assigned to work for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub person_id: String,
    pub client_id: String,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(person_id: &str, client_id: &str) -> Self {
        Self {
            person_id: person_id.to_string(),
            client_id: client_id.to_string(),
            assigned_at: Utc::now(),
        }
    }
}
