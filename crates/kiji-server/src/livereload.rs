//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Path of the live reload WebSocket endpoint.
pub const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Full page reload
    Reload {
        /// Content file that changed, relative to the content root when possible
        path: String,
    },

    /// Connection established
    Connected,
}

/// Broadcasts reload messages to every connected client.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client script that connects back to the page's own host.
pub fn livereload_client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';

  const protocol = location.protocol === 'https:' ? 'wss:' : 'ws:';
  const url = protocol + '//' + location.host + '{LIVE_RELOAD_PATH}';
  let attempts = 0;

  function connect() {{
    const ws = new WebSocket(url);

    ws.onopen = function() {{
      if (attempts > 0) {{
        location.reload();
      }}
      attempts = 0;
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);
      if (msg.type === 'reload') {{
        console.log('[livereload] ' + msg.path + ' changed');
        location.reload();
      }}
    }};

    ws.onclose = function() {{
      if (attempts < 10) {{
        attempts++;
        setTimeout(connect, 1000 * attempts);
      }}
    }};
  }}

  connect();
}})();
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload {
            path: "2024/05/10_hello.mdx".to_string(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            ReloadMessage::Reload {
                path: "2024/05/10_hello.mdx".to_string()
            }
        );
    }

    #[test]
    fn send_without_clients_is_ignored() {
        let hub = ReloadHub::new();

        hub.send(ReloadMessage::Connected);

        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn serializes_messages() {
        let json = serde_json::to_string(&ReloadMessage::Reload {
            path: "a.mdx".to_string(),
        })
        .unwrap();

        assert_eq!(json, r#"{"type":"reload","path":"a.mdx"}"#);
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Connected).unwrap(),
            r#"{"type":"connected"}"#
        );
    }

    #[test]
    fn script_targets_endpoint() {
        let script = livereload_client_script();

        assert!(script.contains("'/__livereload'"));
        assert!(script.contains("location.host"));
    }
}
