//! WebSocket Handler - 章节与分析任务事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::domain::project::ProjectId;
use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// 只推送该项目的事件；缺省推送全部
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

/// GET /ws/events
pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<EventsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let filter = query.project_id.map(ProjectId::from_uuid);
    ws.on_upgrade(move |socket| handle_events_socket(socket, filter, state))
}

fn should_forward(event: &WsEvent, filter: Option<ProjectId>) -> bool {
    filter.map_or(true, |project_id| event.project_id() == project_id)
}

async fn handle_events_socket(socket: WebSocket, filter: Option<ProjectId>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_publisher.subscribe();

    tracing::info!(project_id = ?filter, "Events WebSocket connected");

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Events WebSocket lagged, dropping events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if !should_forward(&event, filter) {
                continue;
            }

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳与关闭）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Events WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Events WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(project_id = ?filter, "Events WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_project() {
        let mine = ProjectId::new();
        let event = WsEvent::ProjectDeleted { project_id: mine };

        assert!(should_forward(&event, None));
        assert!(should_forward(&event, Some(mine)));
        assert!(!should_forward(&event, Some(ProjectId::new())));
    }
}
