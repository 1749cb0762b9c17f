//! Check-in, check-out and slot status advisories.
//!
//! A check-in only counts once the server has returned a history id; HTTP
//! success alone confirms nothing. A check-out only counts once the server
//! has returned a check-out timestamp.

use parkwatch_auth::{AuthorizedClient, HttpRequest, HttpResponse};
use parkwatch_core::document::{excerpt, normalize, Document, FieldPath};
use parkwatch_core::{Occupancy, SlotId};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::EndpointConfig;
use crate::error::{Result, SyncError};
use crate::reconcile::{reconcile, Reconciliation};
use crate::resolver::BODY_EXCERPT_CHARS;

/// Locations of the history id in a check-in response.
pub const HISTORY_ID_FIELDS: &[FieldPath] = &[
    FieldPath::text_or_integer("data.history.id"),
    FieldPath::text_or_integer("data.history_id"),
    FieldPath::text_or_integer("data.id"),
    FieldPath::text_or_integer("history.id"),
    FieldPath::text_or_integer("history_id"),
    FieldPath::text_or_integer("id"),
];

/// Locations of the check-in timestamp.
pub const CHECK_IN_TIME_FIELDS: &[FieldPath] = &[
    FieldPath::text("data.history.check_in_time"),
    FieldPath::text("data.history.checkInTime"),
    FieldPath::text("data.history.created_at"),
    FieldPath::text("data.check_in_time"),
    FieldPath::text("data.checkInTime"),
    FieldPath::text("check_in_time"),
    FieldPath::text("checkInTime"),
];

/// Locations of the user id the server attached to the check-in.
pub const CONFIRMED_USER_FIELDS: &[FieldPath] = &[
    FieldPath::text_or_integer("data.history.user_id"),
    FieldPath::text_or_integer("data.history.userId"),
    FieldPath::text_or_integer("data.user_id"),
    FieldPath::text_or_integer("data.userId"),
    FieldPath::text_or_integer("data.user.id"),
    FieldPath::text_or_integer("user_id"),
];

/// Locations of the check-out timestamp.
pub const CHECK_OUT_TIME_FIELDS: &[FieldPath] = &[
    FieldPath::text("data.history.check_out_time"),
    FieldPath::text("data.history.checkOutTime"),
    FieldPath::text("data.check_out_time"),
    FieldPath::text("data.checkOutTime"),
    FieldPath::text("check_out_time"),
    FieldPath::text("checkOutTime"),
];

/// Locations of the server-computed parking duration in minutes.
pub const DURATION_FIELDS: &[FieldPath] = &[
    FieldPath::integer("data.duration_minutes"),
    FieldPath::integer("data.history.duration_minutes"),
    FieldPath::integer("duration_minutes"),
];

/// A confirmed check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInReceipt {
    /// Server history id; the key for the later check-out.
    pub history_id: String,
    /// Server check-in timestamp, empty if absent.
    pub check_in_time: String,
    /// User id the server attached, if any.
    pub confirmed_user: Option<String>,
    /// Result of reconciling the local hint with `confirmed_user`.
    pub reconciliation: Reconciliation,
}

impl CheckInReceipt {
    /// The identity to store with the parked vehicle.
    #[must_use]
    pub fn retained_user(&self) -> Option<&str> {
        self.reconciliation.retained.as_deref()
    }
}

/// A confirmed check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutReceipt {
    /// Server check-out timestamp.
    pub check_out_time: String,
    /// Parking duration reported by the server, if any.
    pub duration_minutes: Option<i64>,
}

/// Runs check-in and check-out against the parking service.
#[derive(Debug, Clone)]
pub struct Coordinator {
    client: AuthorizedClient,
    endpoints: EndpointConfig,
}

impl Coordinator {
    /// Create a coordinator.
    #[must_use]
    pub const fn new(client: AuthorizedClient, endpoints: EndpointConfig) -> Self {
        Self { client, endpoints }
    }

    /// Check a vehicle in.
    ///
    /// `local_hint` is sent as the user id when present; the identity to
    /// keep is decided by reconciling it with what the server returns.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Authentication or transport fails (`Auth`, `Transport`)
    /// - The status is not 200 or 201 (`UnexpectedStatus`)
    /// - The body is not JSON (`SchemaMismatch`)
    /// - No history id is present (`Confirmation`)
    pub async fn check_in(
        &self,
        local_hint: Option<&str>,
        plate: &str,
        slot: SlotId,
    ) -> Result<CheckInReceipt> {
        let body = check_in_body(local_hint, plate, slot);
        let url = self.client.url(&self.endpoints.checkin_path);
        let response = self.client.send(HttpRequest::post(url, body)).await?;

        if !matches!(response.status, 200 | 201) {
            return Err(unexpected(&response));
        }
        let document = parse(&response)?;

        let history_id = document
            .first_present(HISTORY_ID_FIELDS)
            .ok_or_else(|| SyncError::Confirmation("check-in response has no history id".into()))?;
        let check_in_time = document
            .first_present(CHECK_IN_TIME_FIELDS)
            .unwrap_or_default();
        let confirmed_user = document.first_present(CONFIRMED_USER_FIELDS);

        let reconciliation = reconcile(local_hint, confirmed_user.as_deref());
        if reconciliation.outcome.is_anomaly() {
            warn!(
                slot = %slot,
                plate = %plate,
                local = local_hint.unwrap_or_default(),
                "server did not echo the user id it was sent"
            );
        }

        info!(
            slot = %slot,
            plate = %plate,
            history_id = %history_id,
            outcome = ?reconciliation.outcome,
            "checked in"
        );

        Ok(CheckInReceipt {
            history_id,
            check_in_time,
            confirmed_user,
            reconciliation,
        })
    }

    /// Check a vehicle out by history id.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `history_id` is blank or `"null"` (`MissingHistoryId`); no request
    ///   is sent
    /// - Authentication or transport fails (`Auth`, `Transport`)
    /// - The server does not know the history id (`NotFound`)
    /// - Any other status than 200 (`UnexpectedStatus`)
    /// - The body is not JSON (`SchemaMismatch`)
    /// - No check-out timestamp is present (`Confirmation`)
    pub async fn check_out(&self, history_id: &str) -> Result<CheckOutReceipt> {
        let history_id = normalize(history_id).ok_or(SyncError::MissingHistoryId)?;

        let body = json!({
            "history_id": history_id,
            "historyId": history_id,
        });
        let url = self.client.url(&self.endpoints.checkout_path);
        let response = self.client.send(HttpRequest::post(url, body)).await?;

        match response.status {
            200 => {}
            404 => return Err(SyncError::NotFound(format!("history {history_id}"))),
            _ => return Err(unexpected(&response)),
        }
        let document = parse(&response)?;

        let check_out_time = document
            .first_present(CHECK_OUT_TIME_FIELDS)
            .ok_or_else(|| {
                SyncError::Confirmation("check-out response has no timestamp".into())
            })?;
        let duration_minutes = document
            .first_present(DURATION_FIELDS)
            .and_then(|minutes| minutes.parse().ok());

        info!(
            history_id = %history_id,
            check_out_time = %check_out_time,
            duration_minutes,
            "checked out"
        );

        Ok(CheckOutReceipt {
            check_out_time,
            duration_minutes,
        })
    }

    /// Tell the server a slot changed state. The result is only for logging.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or transport fails, `NotFound` if
    /// the server does not know the slot, and `UnexpectedStatus` for any
    /// other status than 200.
    pub async fn update_slot_advisory(&self, slot: SlotId, status: Occupancy) -> Result<()> {
        let body = json!({
            "status": status.as_status(),
            "sensor_id": self.endpoints.sensor_id(slot),
        });
        let url = self.client.url(&self.endpoints.slot_status(slot));
        let response = self.client.send(HttpRequest::put(url, body)).await?;

        match response.status {
            200 => {}
            404 => return Err(SyncError::NotFound(format!("slot {slot}"))),
            _ => return Err(unexpected(&response)),
        }
        debug!(slot = %slot, status = status.as_status(), "slot advisory sent");
        Ok(())
    }
}

fn check_in_body(local_hint: Option<&str>, plate: &str, slot: SlotId) -> Value {
    let mut body = Map::new();
    body.insert("slot_id".into(), json!(slot.get()));
    body.insert("slotId".into(), json!(slot.get()));
    body.insert("license_plate".into(), json!(plate));
    body.insert("licensePlate".into(), json!(plate));
    if let Some(user_id) = local_hint.and_then(normalize) {
        body.insert("user_id".into(), json!(user_id));
        body.insert("userId".into(), json!(user_id));
    }
    Value::Object(body)
}

fn parse(response: &HttpResponse) -> Result<Document> {
    response.document().map_err(|e| {
        warn!(
            status = response.status,
            body = excerpt(&response.body, BODY_EXCERPT_CHARS),
            "unparsable response"
        );
        SyncError::SchemaMismatch(e.to_string())
    })
}

fn unexpected(response: &HttpResponse) -> SyncError {
    let body = Document::parse(&response.body)
        .ok()
        .and_then(|doc| doc.get(&FieldPath::text("message")))
        .unwrap_or_else(|| excerpt(&response.body, BODY_EXCERPT_CHARS).to_string());
    SyncError::UnexpectedStatus {
        status: response.status,
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parkwatch_auth::{ApiConfig, HttpMethod, MockTransport, SessionManager};

    use super::*;
    use crate::reconcile::ReconcileOutcome;

    const LOGIN: &str = "/api/auth/login";
    const CHECKIN: &str = "/api/parking/checkin";
    const CHECKOUT: &str = "/api/parking/checkout";

    fn coordinator(mock: &Arc<MockTransport>) -> Coordinator {
        mock.stub(HttpMethod::Post, LOGIN, 200, json!({"token": "t"}));
        let config = ApiConfig {
            base_url: "http://api.test".to_string(),
            ..ApiConfig::default()
        };
        let session = Arc::new(SessionManager::new(config, mock.clone()));
        Coordinator::new(AuthorizedClient::new(session), EndpointConfig::default())
    }

    fn slot(n: u32) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn body_omits_user_without_hint() {
        let body = check_in_body(None, "ABC", slot(2));
        assert_eq!(
            body,
            json!({"slot_id": 2, "slotId": 2, "license_plate": "ABC", "licensePlate": "ABC"})
        );
        assert_eq!(check_in_body(Some("null"), "ABC", slot(2)), body);
        assert_eq!(check_in_body(Some("  "), "ABC", slot(2)), body);

        let with_user = check_in_body(Some("U1"), "ABC", slot(2));
        assert_eq!(with_user["user_id"], "U1");
        assert_eq!(with_user["userId"], "U1");
    }

    #[tokio::test]
    async fn check_in_server_identity_wins() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(
            HttpMethod::Post,
            CHECKIN,
            201,
            json!({
                "success": true,
                "data": {
                    "history": {
                        "id": 17,
                        "user_id": "U2",
                        "check_in_time": "2024-05-01T10:00:00Z"
                    }
                }
            }),
        );

        let receipt = coordinator.check_in(Some("U1"), "ABC", slot(1)).await.unwrap();
        assert_eq!(receipt.history_id, "17");
        assert_eq!(receipt.check_in_time, "2024-05-01T10:00:00Z");
        assert_eq!(receipt.retained_user(), Some("U2"));
        assert_eq!(receipt.reconciliation.outcome, ReconcileOutcome::ServerOverrode);
    }

    #[tokio::test]
    async fn check_in_both_empty_is_agreed() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(HttpMethod::Post, CHECKIN, 200, json!({"history_id": "h-1"}));

        let receipt = coordinator.check_in(None, "ABC", slot(1)).await.unwrap();
        assert_eq!(receipt.retained_user(), None);
        assert_eq!(receipt.reconciliation.outcome, ReconcileOutcome::Agreed);
        assert_eq!(receipt.check_in_time, "");
    }

    #[tokio::test]
    async fn check_in_without_history_id_fails() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(
            HttpMethod::Post,
            CHECKIN,
            200,
            json!({"data": {"history": {"id": "null", "user_id": "U1"}}}),
        );

        let err = coordinator.check_in(Some("U1"), "ABC", slot(1)).await.unwrap_err();
        assert!(matches!(err, SyncError::Confirmation(_)));
    }

    #[tokio::test]
    async fn check_in_status_and_schema_errors() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(
            HttpMethod::Post,
            CHECKIN,
            400,
            json!({"success": false, "message": "slot unavailable"}),
        );
        mock.expect_reply(
            HttpMethod::Post,
            CHECKIN,
            Ok(HttpResponse::new(201, "created")),
        );

        let err = coordinator.check_in(None, "ABC", slot(1)).await.unwrap_err();
        assert!(
            matches!(err, SyncError::UnexpectedStatus { status: 400, ref body } if body == "slot unavailable")
        );
        let err = coordinator.check_in(None, "ABC", slot(1)).await.unwrap_err();
        assert!(matches!(err, SyncError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn check_out_requires_history_id() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);

        for id in ["", "   ", "null"] {
            let err = coordinator.check_out(id).await.unwrap_err();
            assert!(matches!(err, SyncError::MissingHistoryId));
        }
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn check_out_confirms_with_timestamp() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(
            HttpMethod::Post,
            CHECKOUT,
            200,
            json!({
                "data": {
                    "history": {"id": 17, "check_out_time": "2024-05-01T11:30:00Z"},
                    "duration_minutes": 90
                }
            }),
        );

        let receipt = coordinator.check_out("17").await.unwrap();
        assert_eq!(receipt.check_out_time, "2024-05-01T11:30:00Z");
        assert_eq!(receipt.duration_minutes, Some(90));

        let sent = &mock.requests_to(CHECKOUT)[0];
        assert_eq!(sent.body, Some(json!({"history_id": "17", "historyId": "17"})));
    }

    #[tokio::test]
    async fn check_out_without_timestamp_fails() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(HttpMethod::Post, CHECKOUT, 200, json!({"success": true}));

        let err = coordinator.check_out("17").await.unwrap_err();
        assert!(matches!(err, SyncError::Confirmation(_)));
    }

    #[tokio::test]
    async fn advisory_put() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(HttpMethod::Put, "/api/slots/3/status", 200, json!({}));
        mock.expect(HttpMethod::Put, "/api/slots/3/status", 404, json!({}));
        mock.expect(HttpMethod::Put, "/api/slots/3/status", 500, json!({}));

        coordinator
            .update_slot_advisory(slot(3), Occupancy::Occupied)
            .await
            .unwrap();
        let sent = &mock.requests_to("/api/slots/3/status")[0];
        assert_eq!(
            sent.body,
            Some(json!({"status": "occupied", "sensor_id": "PARKWATCH_SLOT_3"}))
        );

        let err = coordinator
            .update_slot_advisory(slot(3), Occupancy::Free)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(ref what) if what == "slot 3"));
        assert!(err.is_expected_state());

        let err = coordinator
            .update_slot_advisory(slot(3), Occupancy::Free)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnexpectedStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn check_out_unknown_history_is_not_found() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(HttpMethod::Post, CHECKOUT, 404, json!({"message": "no such history"}));

        let err = coordinator.check_out("99").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(ref what) if what == "history 99"));
        assert!(err.is_expected_state());
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn check_out_duration_fallback_and_absence() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(&mock);
        mock.expect(
            HttpMethod::Post,
            CHECKOUT,
            200,
            json!({"check_out_time": "2024-05-01T11:30:00Z", "duration_minutes": 7}),
        );
        mock.expect(
            HttpMethod::Post,
            CHECKOUT,
            200,
            json!({"check_out_time": "2024-05-01T11:30:00Z", "duration_minutes": "7"}),
        );

        assert_eq!(coordinator.check_out("1").await.unwrap().duration_minutes, Some(7));
        // text is not a duration
        assert_eq!(coordinator.check_out("1").await.unwrap().duration_minutes, None);
    }
}
