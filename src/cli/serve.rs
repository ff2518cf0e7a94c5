use crate::{OrderdConfig, Result};

pub async fn run(port: Option<u16>) -> Result<()> {
    let mut config = OrderdConfig::load_default()?;
    if let Some(port) = port {
        config.port = port;
    }
    crate::server::start_server(config).await
}
