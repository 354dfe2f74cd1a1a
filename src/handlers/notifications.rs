//! Notification endpoints
//!
//! Signal batch processing, per-user preferences, and the bounded
//! notification list with read-state transitions.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;
use crate::models::OnChainSignal;
use crate::notifications::{Notification, NotificationPreferences, PreferencePatch};

fn default_user() -> String {
    "demo_user".to_string()
}

/// Request body for signal batch processing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSignalsRequest {
    pub signals: Vec<OnChainSignal>,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSignalsResponse {
    pub success: bool,
    pub notifications_sent: usize,
    pub notification_ids: Vec<String>,
}

/// Run a signal batch through the notification engine for one user
///
/// POST /api/v1/notifications/process
pub async fn process_signals(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessSignalsRequest>,
) -> Result<Json<ProcessSignalsResponse>, AppError> {
    let outcome = state.engine.process_signals(&body.signals, &body.user_id).await;

    Ok(Json(ProcessSignalsResponse {
        success: true,
        notifications_sent: outcome.notifications_sent,
        notification_ids: outcome.notification_ids,
    }))
}

/// Query parameters carrying a user id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// Get a user's notification preferences (defaults on first access)
///
/// GET /api/v1/notifications/preferences?userId=
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Json<NotificationPreferences> {
    Json(state.preferences.get(&params.user_id))
}

/// Request body for a partial preference update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(flatten)]
    pub patch: PreferencePatch,
}

#[derive(Debug, Serialize)]
pub struct UpdatePreferencesResponse {
    pub success: bool,
    pub preferences: NotificationPreferences,
}

/// Merge a partial update into a user's preferences
///
/// POST /api/v1/notifications/preferences
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdatePreferencesRequest>,
) -> Json<UpdatePreferencesResponse> {
    let preferences = state.preferences.update(&body.user_id, body.patch);
    tracing::info!(user_id = %body.user_id, "Notification preferences updated");

    Json(UpdatePreferencesResponse {
        success: true,
        preferences,
    })
}

/// Query parameters for the notification list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub total: usize,
}

/// List a user's most recent notifications
///
/// GET /api/v1/notifications/list?userId=&limit=
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListNotificationsQuery>,
) -> Json<ListNotificationsResponse> {
    let notifications = state.notifications.list(&params.user_id, params.limit);
    let unread_count = state.notifications.unread_count(&params.user_id);
    // Stored count, not the page size: a limited page still reports how
    // many notifications the user has
    let total = state.notifications.total(&params.user_id);

    Json(ListNotificationsResponse {
        notifications,
        unread_count,
        total,
    })
}

/// Request body for read-state transitions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    pub notification_id: Option<String>,
    #[serde(default)]
    pub mark_all: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
}

/// Mark one notification (or all of them) as read
///
/// POST /api/v1/notifications/mark-read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, AppError> {
    if body.mark_all {
        let changed = state.notifications.mark_all_read(&body.user_id);
        tracing::info!(user_id = %body.user_id, changed, "Marked all notifications read");
    } else if let Some(id) = &body.notification_id {
        if !state.notifications.mark_read(&body.user_id, id) {
            return Err(AppError::NotFound(format!(
                "Notification \"{}\" not found",
                id
            )));
        }
    } else {
        return Err(AppError::Validation(
            "Missing notificationId or markAll flag".to_string(),
        ));
    }

    Ok(Json(MarkReadResponse { success: true }))
}
