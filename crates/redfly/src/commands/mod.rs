//! Command dispatch: bridges CLI args -> plugin client / aggregator -> stdout.

pub mod device;
pub mod plugin;
pub mod util;

use std::sync::Arc;

use redfly_api::{PluginClient, PluginStatusProbe, ReqwestTransport, TokenCache};
use redfly_config::Config;
use redfly_core::{Aggregator, PlaintextPasswords};

use crate::cli::Command;
use crate::error::CliError;

type Probe = PluginStatusProbe<ReqwestTransport>;

/// Everything a command needs, wired from the loaded configuration.
pub struct Runtime {
    pub aggregator: Aggregator<ReqwestTransport, Probe>,
}

impl Runtime {
    pub fn build(config: &Config) -> Result<Self, CliError> {
        let transport = ReqwestTransport::new(&config.transport_config())?;
        let scheme = config.transport.scheme.clone();

        let probe = PluginStatusProbe::new(transport.clone(), config.status_polling())
            .with_scheme(scheme.clone());
        let client = PluginClient::new(
            transport,
            probe,
            Arc::new(TokenCache::new()),
            Arc::new(config.url_translation()),
        )
        .with_scheme(scheme);

        let inventory = config.inventory()?;
        let aggregator = Aggregator::new(client, Arc::new(inventory), Arc::new(PlaintextPasswords));
        Ok(Self { aggregator })
    }

    pub fn plugins(&self) -> &PluginClient<ReqwestTransport, Probe> {
        self.aggregator.plugins()
    }
}

/// Dispatch a plugin-bound command to its handler.
pub async fn dispatch(cmd: Command, runtime: &Runtime) -> Result<(), CliError> {
    match cmd {
        Command::Login { plugin } => plugin::login(runtime, &plugin).await,
        Command::Status { plugin } => plugin::status(runtime, &plugin).await,
        Command::Contact {
            plugin,
            path,
            request,
        } => plugin::contact(runtime, &plugin, &path, request).await,
        Command::Device { uuid, url, request } => {
            device::handle(runtime, uuid, url, request).await
        }
        // Handled before any runtime is built
        Command::ConfigPath => Ok(()),
    }
}
