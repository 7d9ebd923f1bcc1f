//! Plugin command handlers: login, status, contact.

use redfly_api::{ContactRequest, HealthCheck};

use crate::cli::RequestArgs;
use crate::error::CliError;

use super::{Runtime, util};

pub async fn login(runtime: &Runtime, plugin_id: &str) -> Result<(), CliError> {
    let plugin = runtime.aggregator.inventory().plugin(plugin_id)?;
    if runtime.plugins().login(&plugin).await.is_none() {
        return Err(CliError::SessionUnavailable {
            plugin_id: plugin.id,
        });
    }
    println!("Session created with plugin {plugin_id} (token cached)");
    Ok(())
}

pub async fn status(runtime: &Runtime, plugin_id: &str) -> Result<(), CliError> {
    let plugin = runtime.aggregator.inventory().plugin(plugin_id)?;
    if !runtime.plugins().health().is_alive(&plugin).await {
        return Err(CliError::PluginUnreachable {
            plugin_id: plugin.id,
        });
    }
    println!("{plugin_id}: alive");
    Ok(())
}

pub async fn contact(
    runtime: &Runtime,
    plugin_id: &str,
    path: &str,
    args: RequestArgs,
) -> Result<(), CliError> {
    let (method, body) = util::parse_request(args)?;
    let plugin = runtime.aggregator.inventory().plugin(plugin_id)?;

    let mut request = ContactRequest::new(plugin, method, path);
    if let Some(body) = body {
        request = request.with_body(body);
    }
    let request = runtime.plugins().authorize(request).await?;

    let prefix = format!("error while contacting plugin {plugin_id}: ");
    let outcome = runtime
        .plugins()
        .contact_with_retry(&request, &prefix)
        .await?;

    util::print_body(&outcome.text());
    Ok(())
}
