//! MongoDB client configuration and initialisation.
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use mongodb::options::ClientOptions;
use mongodb::options::ServerAddress;
use mongodb::Client;

use crate::errors::ClientError;
use crate::monitor::CommandMonitor;

/// Name passed to MongoDB server from the client.
const MONGO_CLIENT_APP_NAME: &str = "otelmongo";

/// Server selection against a single local node fails fast.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_millis(500);

/// Connection settings for an instrumented MongoDB client.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ClientConf {
    /// Address of the MongoDB node to connect to.
    #[serde(default = "ClientConf::default_address")]
    pub address: String,

    /// Name the client reports to the MongoDB server.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Connection timeout, in seconds.
    #[serde(default)]
    pub connection_timeout: Option<u64>,

    /// Connect directly and exclusively to the configured node.
    #[serde(default = "ClientConf::default_direct")]
    pub direct: bool,
}

impl ClientConf {
    fn default_address() -> String {
        "localhost:27017".to_string()
    }

    fn default_direct() -> bool {
        true
    }
}

impl Default for ClientConf {
    fn default() -> Self {
        ClientConf {
            address: ClientConf::default_address(),
            app_name: None,
            connection_timeout: None,
            direct: ClientConf::default_direct(),
        }
    }
}

/// Create a new MongoDB client instrumented with the command monitor.
pub fn connect(conf: &ClientConf, monitor: &CommandMonitor) -> Result<Client> {
    let server = ServerAddress::parse(&conf.address)
        .with_context(|| ClientError::address_not_valid(&conf.address))?;
    let options = ClientOptions::builder()
        .app_name(
            conf.app_name
                .clone()
                .unwrap_or_else(|| MONGO_CLIENT_APP_NAME.to_string()),
        )
        .direct_connection(conf.direct)
        .hosts(vec![server])
        .server_selection_timeout(SERVER_SELECTION_TIMEOUT)
        .connect_timeout(conf.connection_timeout.map(Duration::from_secs))
        .command_event_handler(monitor.event_handler())
        .build();
    Client::with_options(options).context(ClientError::CreateFailed)
}

/// Create an instrumented MongoDB client from a full connection string.
pub async fn connect_with_uri(uri: &str, monitor: &CommandMonitor) -> Result<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .with_context(|| ClientError::address_not_valid(uri))?;
    options.command_event_handler = Some(monitor.event_handler());
    Client::with_options(options).context(ClientError::CreateFailed)
}
