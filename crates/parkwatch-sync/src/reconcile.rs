//! Local versus server identity reconciliation.
//!
//! | local     | server    | retained | outcome          |
//! |-----------|-----------|----------|------------------|
//! | = server  | = local   | local    | `Agreed`         |
//! | empty     | non-empty | server   | `AdoptedServer`  |
//! | non-empty | empty     | local    | `ServerSilent`   |
//! | non-empty | different | server   | `ServerOverrode` |

use parkwatch_core::document::normalize;
use serde::Serialize;

/// Which branch of the reconciliation table applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Both sides agree, including both empty.
    Agreed,
    /// Only the server knew the identity.
    AdoptedServer,
    /// The server did not echo the identity it was sent.
    ServerSilent,
    /// The server reported a different identity.
    ServerOverrode,
}

impl ReconcileOutcome {
    /// Returns `true` for outcomes worth a warning.
    #[must_use]
    pub const fn is_anomaly(self) -> bool {
        matches!(self, Self::ServerSilent)
    }
}

/// The identity to keep and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Identity to store with the parked vehicle.
    pub retained: Option<String>,
    /// Branch taken.
    pub outcome: ReconcileOutcome,
}

/// Reconcile the identity resolved locally with the one the server confirmed.
///
/// Inputs are normalized first, so blank strings and `"null"` count as empty.
#[must_use]
pub fn reconcile(local: Option<&str>, server: Option<&str>) -> Reconciliation {
    let local = local.and_then(normalize);
    let server = server.and_then(normalize);

    let (retained, outcome) = match (local, server) {
        (l, s) if l == s => (l, ReconcileOutcome::Agreed),
        (None, s) => (s, ReconcileOutcome::AdoptedServer),
        (l, None) => (l, ReconcileOutcome::ServerSilent),
        (Some(_), s) => (s, ReconcileOutcome::ServerOverrode),
    };

    Reconciliation { retained, outcome }
}
