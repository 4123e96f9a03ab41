//! Cache Policy
//!
//! Per-route caching rules, the TTL categories, and the table that says
//! which cached keys a mutation on each resource makes stale.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, Request};
use axum::http::Uri;
use tracing::error;

use super::CacheKey;
use crate::error::{CacheError, Result};
use crate::store::is_glob;

// == TTL ==
/// Families of cached data with their own default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlCategory {
    /// Paginated resource listings
    List,
    /// Reference data behind create/edit forms
    FormData,
    /// Aggregates shown on the dashboard
    Dashboard,
    /// Authenticated user snapshots
    Session,
}

/// TTL in seconds for each [`TtlCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub list: u64,
    pub form_data: u64,
    pub dashboard: u64,
    pub session: u64,
}

impl TtlPolicy {
    pub fn ttl_for(&self, category: TtlCategory) -> u64 {
        match category {
            TtlCategory::List => self.list,
            TtlCategory::FormData => self.form_data,
            TtlCategory::Dashboard => self.dashboard,
            TtlCategory::Session => self.session,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            list: 300,
            form_data: 600,
            dashboard: 600,
            session: 86400,
        }
    }
}

// == Principal ==
/// Authenticated caller id, inserted into request extensions by the auth
/// layer. Required by [`KeyRule::PerPrincipal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

// == Key Rule ==
/// Custom key derivation. Returning `None` or an empty key skips the cache.
pub type KeyFn = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// How a cached route turns a request into a key.
#[derive(Clone)]
pub enum KeyRule {
    /// Namespace + path + canonical query. For responses that are the same
    /// for every caller.
    Namespace(String),
    /// Namespace + path + principal + canonical query. Requests without a
    /// [`Principal`] are not cached.
    PerPrincipal(String),
    /// Caller-supplied derivation.
    Custom(KeyFn),
}

impl KeyRule {
    pub fn custom<F>(derive: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        KeyRule::Custom(Arc::new(derive))
    }
}

impl fmt::Debug for KeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRule::Namespace(ns) => f.debug_tuple("Namespace").field(ns).finish(),
            KeyRule::PerPrincipal(ns) => f.debug_tuple("PerPrincipal").field(ns).finish(),
            KeyRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// == Cache Policy ==
/// A validated `(key rule, ttl)` pair for one cached route.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    rule: KeyRule,
    ttl_secs: u64,
}

impl CachePolicy {
    /// Validates the policy at route registration.
    ///
    /// Fails on a zero TTL and on namespaces that are empty or contain glob
    /// metacharacters, since those would collide with invalidation patterns.
    pub fn new(rule: KeyRule, ttl_secs: u64) -> Result<Self> {
        if ttl_secs == 0 {
            return Err(CacheError::Policy("ttl must be positive".to_string()));
        }
        if let KeyRule::Namespace(ns) | KeyRule::PerPrincipal(ns) = &rule {
            validate_namespace(ns)?;
        }
        Ok(Self { rule, ttl_secs })
    }

    pub fn namespace(ns: impl Into<String>, ttl_secs: u64) -> Result<Self> {
        Self::new(KeyRule::Namespace(ns.into()), ttl_secs)
    }

    pub fn per_principal(ns: impl Into<String>, ttl_secs: u64) -> Result<Self> {
        Self::new(KeyRule::PerPrincipal(ns.into()), ttl_secs)
    }

    /// Listing of `resource`, shared by all callers.
    pub fn resource_list(resource: Resource, ttl: &TtlPolicy) -> Result<Self> {
        Self::namespace(resource.list_namespace(), ttl.ttl_for(TtlCategory::List))
    }

    /// Form reference data of `resource`.
    pub fn resource_form(resource: Resource, ttl: &TtlPolicy) -> Result<Self> {
        Self::namespace(resource.form_namespace(), ttl.ttl_for(TtlCategory::FormData))
    }

    /// A dashboard aggregate, e.g. `dashboard("totals", ..)` → `dashboard_totals`.
    pub fn dashboard(name: &str, ttl: &TtlPolicy) -> Result<Self> {
        Self::namespace(
            format!("{}_{}", DASHBOARD_NAMESPACE, name),
            ttl.ttl_for(TtlCategory::Dashboard),
        )
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn rule(&self) -> &KeyRule {
        &self.rule
    }

    /// Derives the key for `request`, or `None` if it must not be cached.
    pub fn derive_key(&self, request: &Request) -> Option<String> {
        let key = match &self.rule {
            KeyRule::Namespace(ns) => {
                let query = query_pairs(request.uri())?;
                CacheKey::new(ns.as_str())
                    .path(request.uri().path())
                    .query(query)
                    .build()
            }
            KeyRule::PerPrincipal(ns) => {
                let principal = request.extensions().get::<Principal>()?;
                let query = query_pairs(request.uri())?;
                CacheKey::new(ns.as_str())
                    .path(request.uri().path())
                    .principal(principal.0.as_str())
                    .query(query)
                    .build()
            }
            KeyRule::Custom(derive) => {
                let key = derive(request)?;
                if key.is_empty() {
                    error!(path = %request.uri().path(), "Custom key rule produced an empty key");
                    return None;
                }
                key
            }
        };
        Some(key)
    }
}

fn validate_namespace(ns: &str) -> Result<()> {
    if ns.is_empty() {
        return Err(CacheError::Policy("namespace must not be empty".to_string()));
    }
    if is_glob(ns) {
        return Err(CacheError::Policy(format!(
            "namespace '{}' contains glob metacharacters",
            ns
        )));
    }
    Ok(())
}

/// Decoded query pairs, or `None` for a query string that does not parse.
///
/// Form decoding replaces percent-encoded bytes that are not UTF-8 with
/// U+FFFD, so `%FF` and `%FE` would decode alike. Any replacement character
/// in the output therefore means the decoding may have been lossy, and the
/// request is not keyed.
fn query_pairs(uri: &Uri) -> Option<Vec<(String, String)>> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    let lossy = pairs.iter().any(|(k, v)| {
        k.contains(char::REPLACEMENT_CHARACTER) || v.contains(char::REPLACEMENT_CHARACTER)
    });
    (!lossy).then_some(pairs)
}

// == Resources ==
/// Namespace shared by every dashboard aggregate.
pub const DASHBOARD_NAMESPACE: &str = "dashboard";

/// Resource families of the admin panel.
///
/// Namespaces keep the panel's historical prefixes so keys already in the
/// store stay addressable by the same patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Clients,
    Kiosks,
    Bookings,
    Payments,
    Credits,
    Campaigns,
    Media,
    Prices,
    WaitingQueue,
    ServiceQueue,
    InteractionLogs,
}

impl Resource {
    pub const ALL: [Resource; 11] = [
        Resource::Clients,
        Resource::Kiosks,
        Resource::Bookings,
        Resource::Payments,
        Resource::Credits,
        Resource::Campaigns,
        Resource::Media,
        Resource::Prices,
        Resource::WaitingQueue,
        Resource::ServiceQueue,
        Resource::InteractionLogs,
    ];

    /// Key prefix of everything cached for this resource.
    pub fn prefix(self) -> &'static str {
        match self {
            Resource::Clients => "clientes",
            Resource::Kiosks => "quiosques",
            Resource::Bookings => "agendamentos",
            Resource::Payments => "pagamentos",
            Resource::Credits => "creditos",
            Resource::Campaigns => "campanhas",
            Resource::Media => "midias",
            Resource::Prices => "precos",
            Resource::WaitingQueue => "fila_espera",
            Resource::ServiceQueue => "fila_atendimento",
            Resource::InteractionLogs => "logs_interacoes",
        }
    }

    /// Namespace for the resource's listing endpoint.
    pub fn list_namespace(self) -> String {
        format!("{}_list", self.prefix())
    }

    /// Namespace for the resource's form reference data.
    pub fn form_namespace(self) -> String {
        format!("{}_form_data", self.prefix())
    }

    /// Patterns a committed mutation on this resource invalidates.
    ///
    /// This is the single source of truth for write-path invalidation.
    pub fn invalidation_patterns(self) -> &'static [&'static str] {
        match self {
            Resource::Clients => &["clientes_*", "agendamentos_*", "dashboard_*"],
            Resource::Kiosks => &["quiosques_*", "agendamentos_*", "dashboard_*"],
            Resource::Bookings => &["agendamentos_*", "dashboard_*"],
            Resource::Payments => &["pagamentos_*", "agendamentos_*", "dashboard_*"],
            Resource::Credits => &["creditos_*", "dashboard_*"],
            Resource::Campaigns => &["campanhas_*"],
            Resource::Media => &["midias_*", "campanhas_*"],
            Resource::Prices => &["precos_*", "pagamentos_*"],
            Resource::WaitingQueue => &["fila_espera_*", "dashboard_*"],
            Resource::ServiceQueue => &["fila_atendimento_*", "dashboard_*"],
            Resource::InteractionLogs => &["logs_interacoes_*"],
        }
    }
}

impl FromStr for Resource {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.prefix() == s)
            .ok_or_else(|| CacheError::NotFound(format!("resource '{}'", s)))
    }
}
