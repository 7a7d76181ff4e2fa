//! Server Config

use std::time::Duration;

use clap::Args;

/// Server runtime network settings.
#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8698")]
    pub port: u16,

    /// Seconds in-flight requests get to finish after a shutdown signal
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 30_u64)]
    pub shutdown_grace_seconds: u64,
}

impl ServerRuntimeConfig {
    /// `host:port` for the listener.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// How long graceful shutdown waits before dropping connections.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        server: ServerRuntimeConfig,
    }

    #[test]
    fn defaults_listen_on_every_interface() {
        let wrapper = Wrapper::parse_from(["redeem-json"]);

        assert_eq!(wrapper.server.socket_addr(), "0.0.0.0:8698");
        assert_eq!(wrapper.server.shutdown_grace(), Duration::from_secs(30));
    }

    #[test]
    fn shutdown_grace_is_configurable() {
        let wrapper = Wrapper::parse_from(["redeem-json", "--shutdown-grace-seconds", "5"]);

        assert_eq!(wrapper.server.shutdown_grace(), Duration::from_secs(5));
    }
}
