//! Plate to user identity resolution.

use parkwatch_auth::{AuthorizedClient, HttpRequest};
use parkwatch_core::document::{excerpt, FieldPath};
use tracing::{debug, info, warn};

use crate::config::EndpointConfig;

/// Locations of the user id in a lookup response, highest priority first.
pub const LOOKUP_IDENTITY_FIELDS: &[FieldPath] = &[
    FieldPath::text_or_integer("data.id"),
    FieldPath::text_or_integer("id"),
    FieldPath::text_or_integer("data.user_id"),
    FieldPath::text_or_integer("data.userId"),
    FieldPath::text_or_integer("data.user.id"),
    FieldPath::text_or_integer("user_id"),
];

/// Maximum number of body characters included in log messages.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Outcome of a plate lookup.
///
/// Only `Found` carries an identity. `NotFound` is a normal answer;
/// `Unavailable` covers every failure and exists for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlateLookup {
    /// The plate belongs to this user.
    Found(String),
    /// The server does not know the plate, or knows it without an owner.
    NotFound,
    /// The lookup failed; the reason is for logging only.
    Unavailable(String),
}

impl PlateLookup {
    /// The resolved identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Found(id) => Some(id),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }

    /// Consume the outcome, returning the identity if any.
    #[must_use]
    pub fn into_identity(self) -> Option<String> {
        match self {
            Self::Found(id) => Some(id),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }
}

/// Looks up the owner of a plate.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    client: AuthorizedClient,
    endpoints: EndpointConfig,
}

impl ResolverClient {
    /// Create a resolver.
    #[must_use]
    pub const fn new(client: AuthorizedClient, endpoints: EndpointConfig) -> Self {
        Self { client, endpoints }
    }

    /// The authorized client used for lookups.
    #[must_use]
    pub const fn client(&self) -> &AuthorizedClient {
        &self.client
    }

    /// Resolve the user who owns `plate`.
    ///
    /// Never fails: authentication and transport problems degrade to
    /// [`PlateLookup::Unavailable`].
    pub async fn resolve_user_by_plate(&self, plate: &str) -> PlateLookup {
        let url = self.client.url(&self.endpoints.lookup(plate));

        let response = match self.client.send(HttpRequest::get(&url)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(plate = %plate, error = %e, "plate lookup failed");
                return PlateLookup::Unavailable(e.to_string());
            }
        };

        match response.status {
            200 => {}
            404 => {
                debug!(plate = %plate, "plate not registered");
                return PlateLookup::NotFound;
            }
            status => {
                warn!(
                    plate = %plate,
                    status,
                    body = excerpt(&response.body, BODY_EXCERPT_CHARS),
                    "plate lookup rejected"
                );
                return PlateLookup::Unavailable(format!("HTTP {status}"));
            }
        }

        let document = match response.document() {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    plate = %plate,
                    error = %e,
                    body = excerpt(&response.body, BODY_EXCERPT_CHARS),
                    "plate lookup returned unparsable body"
                );
                return PlateLookup::Unavailable(e.to_string());
            }
        };

        match document.first_match(LOOKUP_IDENTITY_FIELDS) {
            Some((field, user_id)) => {
                info!(plate = %plate, user_id = %user_id, field = field.path(), "plate resolved");
                PlateLookup::Found(user_id)
            }
            None => {
                debug!(plate = %plate, "lookup response has no user id");
                PlateLookup::NotFound
            }
        }
    }
}
