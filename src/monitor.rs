//! Command monitor translating MongoDB driver command events into tracing spans.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use mongodb::bson::Document;
use mongodb::event::command::CommandEvent;
use mongodb::event::EventHandler;
use mongodb::options::ServerAddress;
use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::Span;
use opentelemetry::trace::SpanKind;
use opentelemetry::trace::Status;
use opentelemetry::trace::Tracer;
use opentelemetry::Context;
use opentelemetry::KeyValue;
use slog::Logger;

use crate::conf::MonitorConf;
use crate::constants::DB_INSTANCE_KEY;
use crate::constants::DB_STATEMENT_KEY;
use crate::constants::DB_TYPE;
use crate::constants::DB_TYPE_KEY;
use crate::constants::DEFAULT_MONGO_PORT;
use crate::constants::PEER_HOSTNAME_KEY;
use crate::constants::PEER_PORT_KEY;
use crate::constants::RESOURCE_NAME_KEY;
use crate::constants::SERVICE_NAME_KEY;
use crate::metrics::COMMANDS_DURATION;
use crate::metrics::COMMANDS_ERR;
use crate::metrics::COMPLETIONS_UNMATCHED;
use crate::statement;

/// Subscribes to a MongoDB client's command events and emits spans for them.
///
/// Every started command opens a span as a child of the OpenTelemetry context
/// active at the time the command is issued. The matching succeeded or failed
/// event ends that span. Completions the monitor cannot match to an in-flight
/// command are ignored.
///
/// The monitor is a cheap handle and can be cloned freely; clones share the
/// in-flight command state.
#[derive(Clone)]
pub struct CommandMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    service_name: String,
    tracer_name: String,
    statement: bool,
    max_statement_length: Option<usize>,
    logger: Logger,
    in_flight: Mutex<HashMap<i32, BoxedSpan>>,
}

impl CommandMonitor {
    /// Start building a [`CommandMonitor`].
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    /// Build a [`CommandMonitor`] from loaded configuration.
    pub fn with_conf(conf: MonitorConf) -> CommandMonitor {
        MonitorBuilder::default().conf(conf).build()
    }

    /// Return the event handler to install on [`mongodb::options::ClientOptions`].
    pub fn event_handler(&self) -> EventHandler<CommandEvent> {
        let monitor = self.clone();
        EventHandler::callback(move |event| monitor.handle(event))
    }

    /// Process a single command event.
    ///
    /// Events are correlated through the driver generated request id: a started
    /// event registers a span under its request id and the completion event for
    /// the same request id ends it.
    pub fn handle(&self, event: CommandEvent) {
        match event {
            CommandEvent::Started(event) => self.start_span(
                event.request_id,
                &event.command_name,
                &event.db,
                &event.command,
                &event.connection.address,
            ),
            CommandEvent::Succeeded(event) => {
                self.finish_success(event.request_id, &event.command_name, event.duration)
            }
            CommandEvent::Failed(event) => self.finish_failure(
                event.request_id,
                &event.command_name,
                event.duration,
                &event.failure,
            ),
            _ => (),
        }
    }

    /// Open a span for a started command and register it as in flight.
    fn start_span(
        &self,
        request_id: i32,
        command_name: &str,
        db: &str,
        command: &Document,
        address: &ServerAddress,
    ) {
        let resource = self.resource_name(command_name);
        let (host, port) = peer_of(address);

        let mut attributes = vec![
            KeyValue::new(SERVICE_NAME_KEY, self.inner.service_name.clone()),
            KeyValue::new(RESOURCE_NAME_KEY, resource.clone()),
            KeyValue::new(PEER_HOSTNAME_KEY, host),
            KeyValue::new(DB_INSTANCE_KEY, db.to_string()),
            KeyValue::new(DB_TYPE_KEY, DB_TYPE),
        ];
        if let Some(port) = port {
            attributes.push(KeyValue::new(PEER_PORT_KEY, port));
        }
        if self.inner.statement {
            let statement = statement::render(command, self.inner.max_statement_length);
            attributes.push(KeyValue::new(DB_STATEMENT_KEY, statement));
        }

        // The new span is automatically a child of the active span and context.
        let tracer = opentelemetry::global::tracer(self.inner.tracer_name.clone());
        let mut builder = tracer
            .span_builder(resource)
            .with_attributes(attributes);
        builder.span_kind = Some(SpanKind::Client);
        let parent = Context::current();
        let span = tracer.build_with_context(builder, &parent);

        slog::debug!(
            self.inner.logger, "Started MongoDB command span";
            "op" => command_name, "request_id" => request_id
        );
        let replaced = self
            .inner
            .in_flight
            .lock()
            .expect("in_flight Mutex poisoned")
            .insert(request_id, span);
        if replaced.is_some() {
            // The replaced span is ended by the tracer when dropped.
            slog::debug!(
                self.inner.logger, "Replaced in-flight span for reused request id";
                "request_id" => request_id
            );
        }
    }

    /// End the span matching a succeeded command.
    fn finish_success(&self, request_id: i32, command_name: &str, duration: Duration) {
        COMMANDS_DURATION
            .with_label_values(&[command_name])
            .observe(duration.as_secs_f64());
        let span = self.remove(request_id, command_name);
        if let Some(mut span) = span {
            span.set_status(Status::Ok);
            span.end();
        }
    }

    /// End the span matching a failed command and record the error on it.
    fn finish_failure(
        &self,
        request_id: i32,
        command_name: &str,
        duration: Duration,
        error: &(dyn std::error::Error + 'static),
    ) {
        COMMANDS_DURATION
            .with_label_values(&[command_name])
            .observe(duration.as_secs_f64());
        COMMANDS_ERR.with_label_values(&[command_name]).inc();
        let span = self.remove(request_id, command_name);
        if let Some(mut span) = span {
            span.record_error(error);
            span.set_status(Status::error(error.to_string()));
            span.end();
        }
    }

    /// Take the in-flight span for a completion event, if one was registered.
    fn remove(&self, request_id: i32, command_name: &str) -> Option<BoxedSpan> {
        let span = self
            .inner
            .in_flight
            .lock()
            .expect("in_flight Mutex poisoned")
            .remove(&request_id);
        if span.is_none() {
            COMPLETIONS_UNMATCHED.inc();
            slog::debug!(
                self.inner.logger, "No in-flight span for completed command";
                "op" => command_name, "request_id" => request_id
            );
        }
        span
    }

    fn resource_name(&self, command_name: &str) -> String {
        format!("{}.{}", self.inner.service_name, command_name.to_lowercase())
    }
}

/// Extract the peer hostname and port reported on command spans.
///
/// TCP addresses without an explicit port report the MongoDB default port.
/// Other address forms (unix domain sockets) report their rendering as the
/// hostname and no port.
fn peer_of(address: &ServerAddress) -> (String, Option<String>) {
    match address {
        ServerAddress::Tcp { host, port } => {
            let port = port.unwrap_or(DEFAULT_MONGO_PORT);
            (host.clone(), Some(port.to_string()))
        }
        other => (other.to_string(), None),
    }
}

/// Builder for [`CommandMonitor`] instances.
pub struct MonitorBuilder {
    conf: MonitorConf,
    tracer_name: String,
    logger: Option<Logger>,
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        MonitorBuilder {
            conf: MonitorConf::default(),
            tracer_name: env!("CARGO_PKG_NAME").to_string(),
            logger: None,
        }
    }
}

impl MonitorBuilder {
    /// Replace the full monitor configuration.
    pub fn conf(mut self, conf: MonitorConf) -> Self {
        self.conf = conf;
        self
    }

    /// Set the service name reported on command spans.
    pub fn service_name<S: Into<String>>(mut self, service_name: S) -> Self {
        self.conf.service_name = service_name.into();
        self
    }

    /// Enable or disable the statement attribute on command spans.
    pub fn statement(mut self, statement: bool) -> Self {
        self.conf.statement = statement;
        self
    }

    /// Cap the rendered statement to this many bytes.
    pub fn max_statement_length(mut self, max_statement_length: usize) -> Self {
        self.conf.max_statement_length = Some(max_statement_length);
        self
    }

    /// Set the name under which the monitor obtains its tracer.
    pub fn tracer_name<S: Into<String>>(mut self, tracer_name: S) -> Self {
        self.tracer_name = tracer_name.into();
        self
    }

    /// Attach a logger for the monitor to report events to.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Finalise the builder into a [`CommandMonitor`].
    pub fn build(self) -> CommandMonitor {
        let logger = self
            .logger
            .unwrap_or_else(|| Logger::root(slog::Discard, slog::o!()));
        CommandMonitor {
            inner: Arc::new(MonitorInner {
                service_name: self.conf.service_name,
                tracer_name: self.tracer_name,
                statement: self.conf.statement,
                max_statement_length: self.conf.max_statement_length,
                logger,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }
}
