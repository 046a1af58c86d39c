//! Span attribute keys and fixed tags attached to MongoDB command spans.

/// Service name reported on command spans unless overridden by configuration.
pub const SERVICE_NAME: &str = "mongo";

/// Database type tag reported on every command span.
pub const DB_TYPE: &str = "mongo";

/// Port assumed when the server address does not carry one.
pub const DEFAULT_MONGO_PORT: u16 = 27017;

/// Attribute key for the service name.
pub const SERVICE_NAME_KEY: &str = "service.name";

/// Attribute key for the resource name (`<service>.<operation>`).
pub const RESOURCE_NAME_KEY: &str = "resource.name";

/// Attribute key for the hostname of the command's target server.
pub const PEER_HOSTNAME_KEY: &str = "peer.hostname";

/// Attribute key for the port of the command's target server.
pub const PEER_PORT_KEY: &str = "peer.port";

/// Attribute key for the rendered command document.
pub const DB_STATEMENT_KEY: &str = "db.statement";

/// Attribute key for the database the command runs against.
pub const DB_INSTANCE_KEY: &str = "db.instance";

/// Attribute key for the database type.
pub const DB_TYPE_KEY: &str = "db.type";
