/// Connection Gateway: owns the push-channel lifecycle and the full-refresh
/// cycle
///
/// Events are fed to the engine strictly in arrival order, with no batching
/// or reordering. A transport failure terminates the loop; reconnection is
/// not self-healing.
use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};
use crate::events::PushEvent;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, sleep};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

pub struct Gateway {
    engine: SyncEngine,
    push_url: String,
    refresh_interval: Duration,
    shutdown: Arc<RwLock<bool>>,
}

impl Gateway {
    pub fn new(engine: SyncEngine, push_url: String, refresh_interval: Duration) -> Self {
        Self {
            engine,
            push_url,
            refresh_interval,
            shutdown: Arc::new(RwLock::new(false)),
        }
    }

    /// Open the channel, run the initial refresh, then consume events until
    /// the channel closes or shutdown is signalled
    pub async fn run(&self) -> Result<()> {
        self.engine.refresh_all().await?;

        let (ws, _) = connect_async(self.push_url.as_str())
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        info!("push channel connected: {}", self.push_url);

        let refresh_handle = {
            let gateway = self.clone();
            tokio::spawn(async move { gateway.run_periodic_refresh().await })
        };

        let (mut sink, mut stream) = ws.split();
        loop {
            if *self.shutdown.read().await {
                break;
            }

            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => self.handle_frame(&text).await,
                    Some(Ok(WsMessage::Ping(data))) => {
                        if let Err(e) = sink.send(WsMessage::Pong(data)).await {
                            error!("push channel write error: {}", e);
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        info!("push channel closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("push channel error: {}", e);
                        break;
                    }
                    None => {
                        warn!("push channel stream ended");
                        break;
                    }
                },
                _ = sleep(Duration::from_millis(100)) => {
                    // Check shutdown periodically
                }
            }
        }

        *self.shutdown.write().await = true;
        let _ = refresh_handle.await;
        info!("gateway stopped");
        Ok(())
    }

    /// Narrow one raw frame into a typed event and reconcile it.
    /// Unrecognized payloads are dropped at this boundary.
    async fn handle_frame(&self, raw: &str) {
        match PushEvent::parse(raw) {
            Ok(event) => {
                debug!("push event: {:?}", event);
                if let Err(e) = self.engine.handle_event(event).await {
                    warn!("event reconciliation failed: {}", e);
                }
            }
            Err(e) => warn!("dropping unrecognized push payload: {}", e),
        }
    }

    /// Periodic full-snapshot refresh, complementing the initial one
    async fn run_periodic_refresh(&self) {
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately; the initial refresh already ran
        ticker.tick().await;

        loop {
            if *self.shutdown.read().await {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.engine.refresh_all().await {
                        warn!("periodic refresh failed: {}", e);
                    }
                }
                _ = sleep(Duration::from_millis(100)) => {}
            }
        }
    }

    /// Signal the gateway to stop after the current frame
    pub async fn shutdown(&self) {
        *self.shutdown.write().await = true;
    }
}

impl Clone for Gateway {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            push_url: self.push_url.clone(),
            refresh_interval: self.refresh_interval,
            shutdown: self.shutdown.clone(),
        }
    }
}
