//! Device command handler.

use redfly_core::DeviceRequest;

use crate::cli::RequestArgs;
use crate::error::CliError;

use super::{Runtime, util};

pub async fn handle(
    runtime: &Runtime,
    uuid: String,
    url: String,
    args: RequestArgs,
) -> Result<(), CliError> {
    let (method, body) = util::parse_request(args)?;

    let mut request = DeviceRequest::get(uuid, url).with_method(method);
    if let Some(body) = body {
        request = request.with_body(body);
    }

    let response = runtime.aggregator.device_request(&request).await?;
    util::print_body(&response.body);
    Ok(())
}
