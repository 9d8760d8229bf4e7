//! Channel subscriptions for database change notifications

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

use crate::config::ClientOptions;
use crate::error::Error;
use crate::postgrest::Filter;
use crate::realtime::message::{ChangePayload, ChannelEvent, RealtimeMessage};
use crate::realtime::RealtimeClient;

/// Row events a binding listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    All,
    Insert,
    Update,
    Delete,
}

impl ChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEvent::All => "*",
            ChangeEvent::Insert => "INSERT",
            ChangeEvent::Update => "UPDATE",
            ChangeEvent::Delete => "DELETE",
        }
    }
}

/// Database change listening configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresChanges {
    schema: String,
    table: String,
    event: ChangeEvent,
    filter: Option<Filter>,
}

impl PostgresChanges {
    /// Listen for every change on `table` in the `public` schema
    pub fn new(table: &str) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.to_string(),
            event: ChangeEvent::All,
            filter: None,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn event(mut self, event: ChangeEvent) -> Self {
        self.event = event;
        self
    }

    /// Restrict notifications server-side to rows matching `filter`
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Entry for `config.postgres_changes` in the join payload
    pub(crate) fn to_config(&self) -> Value {
        let mut config = json!({
            "event": self.event.as_str(),
            "schema": self.schema,
            "table": self.table,
        });
        if let Some(filter) = &self.filter {
            config["filter"] = Value::String(filter.to_string());
        }
        config
    }

    fn matches(&self, change: &ChangePayload) -> bool {
        let table_ok = change.table.as_deref().map_or(true, |t| t == self.table);
        let event_ok = match (self.event, change.event_type.as_deref()) {
            (ChangeEvent::All, _) | (_, None) => true,
            (event, Some(kind)) => event.as_str() == kind,
        };
        table_ok && event_ok
    }
}

type ChangeHandler = Arc<dyn Fn(ChangePayload) + Send + Sync>;

/// Builder for a channel and its change bindings
pub struct ChannelBuilder {
    client: RealtimeClient,
    topic: String,
    bindings: Vec<(PostgresChanges, ChangeHandler)>,
}

impl ChannelBuilder {
    pub(crate) fn new(client: &RealtimeClient, name: &str) -> Self {
        Self {
            client: client.clone(),
            topic: format!("realtime:{}", name),
            bindings: Vec::new(),
        }
    }

    /// The Phoenix topic for this channel
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Register a callback for database changes
    pub fn on_postgres_changes<F>(mut self, changes: PostgresChanges, callback: F) -> Self
    where
        F: Fn(ChangePayload) + Send + Sync + 'static,
    {
        let handler: ChangeHandler = Arc::new(callback);
        self.bindings.push((changes, handler));
        self
    }

    /// Payload of the `phx_join` message
    pub fn join_payload(&self) -> Value {
        let postgres_changes: Vec<Value> = self
            .bindings
            .iter()
            .map(|(changes, _)| changes.to_config())
            .collect();

        json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": postgres_changes,
            },
            "access_token": self.client.key,
        })
    }

    /// Connect and join the channel in a background task.
    ///
    /// Must be called from within a Tokio runtime. The returned
    /// [`Subscription`] keeps the channel alive; dropping it leaves the channel.
    pub fn subscribe(self) -> Result<Subscription, Error> {
        if self.bindings.is_empty() {
            return Err(Error::realtime("channel has no change bindings"));
        }
        if self.client.options.heartbeat_interval.is_zero() {
            return Err(Error::config("heartbeat interval must be non-zero"));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::realtime("subscribe must be called within a Tokio runtime"))?;

        let ws_url = self.client.websocket_url()?;
        let join_payload = self.join_payload();
        let closed = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let context = ChannelContext {
            ws_url,
            topic: self.topic.clone(),
            join_payload,
            bindings: self.bindings,
            options: self.client.options.clone(),
            closed: closed.clone(),
        };

        info!(topic = %self.topic, "subscribing to channel");
        let task = runtime.spawn(run_channel(context, shutdown_rx));

        Ok(Subscription {
            topic: self.topic,
            closed,
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }
}

/// Handle for a live channel subscription
pub struct Subscription {
    topic: String,
    closed: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Leave the channel. Changes received after this returns are not
    /// delivered; a callback that is already running may still finish.
    pub fn unsubscribe(mut self) {
        self.close();
    }

    /// Leave the channel and wait for the socket task to finish
    pub async fn unsubscribe_and_wait(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(topic = %self.topic, error = %e, "channel task ended abnormally");
            }
        }
    }

    fn close(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(topic = %self.topic, "unsubscribing from channel");
            let _ = self.shutdown.send(true);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

struct ChannelContext {
    ws_url: String,
    topic: String,
    join_payload: Value,
    bindings: Vec<(PostgresChanges, ChangeHandler)>,
    options: ClientOptions,
    closed: Arc<AtomicBool>,
}

enum SessionEnd {
    Shutdown,
    Disconnected,
}

#[derive(Default)]
struct RefCounter(u64);

impl RefCounter {
    fn next(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

async fn run_channel(context: ChannelContext, mut shutdown: watch::Receiver<bool>) {
    let mut attempts: u32 = 0;

    loop {
        if stop_requested(&shutdown) {
            break;
        }

        match run_session(&context, &mut shutdown).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::Disconnected) => {
                warn!(topic = %context.topic, "realtime connection lost");
                attempts = 0;
            }
            Err(e) => {
                warn!(topic = %context.topic, error = %e, "realtime connection failed");
            }
        }

        if !context.options.auto_reconnect || stop_requested(&shutdown) {
            break;
        }

        attempts += 1;
        if let Some(max) = context.options.max_reconnect_attempts {
            if attempts > max {
                error!(topic = %context.topic, attempts = max, "giving up on realtime reconnect");
                break;
            }
        }

        let delay = context.options.reconnect_delay(attempts);
        info!(topic = %context.topic, attempt = attempts, ?delay, "reconnecting");
        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown.changed() => {}
        }
    }

    debug!(topic = %context.topic, "channel task finished");
}

async fn run_session(
    context: &ChannelContext,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd, Error> {
    let ws_stream = tokio::select! {
        connected = connect_async(context.ws_url.as_str()) => connected?.0,
        _ = shutdown.changed() => return Ok(SessionEnd::Shutdown),
    };
    info!(topic = %context.topic, "realtime socket connected");

    // once connected, failures count as a lost connection
    match drive_session(context, ws_stream, shutdown).await {
        Ok(end) => Ok(end),
        Err(e) => {
            debug!(topic = %context.topic, error = %e, "realtime session failed");
            Ok(SessionEnd::Disconnected)
        }
    }
}

async fn drive_session(
    context: &ChannelContext,
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd, Error> {
    let (mut write, mut read) = ws_stream.split();
    let mut refs = RefCounter::default();

    let join_ref = refs.next();
    let join = RealtimeMessage::new(
        &context.topic,
        ChannelEvent::Join,
        context.join_payload.clone(),
        &join_ref,
    );
    write.send(Message::Text(join.to_text()?)).await?;

    let period = context.options.heartbeat_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let leave = RealtimeMessage::new(&context.topic, ChannelEvent::Leave, json!({}), &refs.next());
                if let Err(e) = write.send(Message::Text(leave.to_text()?)).await {
                    debug!(error = %e, "failed to send leave");
                }
                let _ = write.close().await;
                return Ok(SessionEnd::Shutdown);
            }
            _ = heartbeat.tick() => {
                let beat = RealtimeMessage::new("phoenix", ChannelEvent::Heartbeat, json!({}), &refs.next());
                trace!("sending heartbeat");
                write.send(Message::Text(beat.to_text()?)).await?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !context.handle_text(&text, &join_ref) {
                            return Ok(SessionEnd::Disconnected);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "close frame received");
                        return Ok(SessionEnd::Disconnected);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(SessionEnd::Disconnected),
                }
            }
        }
    }
}

impl ChannelContext {
    /// Returns false when the server closed the channel
    fn handle_text(&self, text: &str, join_ref: &str) -> bool {
        let message: RealtimeMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, raw = %text, "unparseable realtime message");
                return true;
            }
        };

        trace!(topic = %message.topic, event = ?message.event, "realtime message");
        if message.topic != self.topic {
            return true;
        }

        match message.event {
            event if event.is_change() => {
                self.dispatch(&message.payload);
                true
            }
            ChannelEvent::Reply if message.ref_str() == Some(join_ref) => {
                match message.reply_status() {
                    Some("ok") => info!(topic = %self.topic, "joined channel"),
                    status => warn!(
                        topic = %self.topic,
                        status = ?status,
                        response = %message.payload,
                        "channel join rejected"
                    ),
                }
                true
            }
            ChannelEvent::Error | ChannelEvent::Close => {
                warn!(topic = %self.topic, event = ?message.event, "channel closed by server");
                false
            }
            _ => true,
        }
    }

    /// Returns the number of handlers invoked
    fn dispatch(&self, payload: &Value) -> usize {
        let change = ChangePayload::from_payload(payload);
        debug!(topic = %self.topic, event_type = ?change.event_type, "change received");

        let mut invoked = 0;
        for (changes, handler) in &self.bindings {
            // checked per handler so a close during dispatch stops the rest
            if self.closed.load(Ordering::SeqCst) {
                break;
            }
            if changes.matches(&change) {
                handler(change.clone());
                invoked += 1;
            }
        }
        invoked
    }
}
