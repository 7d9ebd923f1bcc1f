//! Shared helpers for command handlers.

use reqwest::Method;
use serde_json::Value;

use crate::cli::RequestArgs;
use crate::error::CliError;

/// Parse `--method` and `--data`.
pub fn parse_request(args: RequestArgs) -> Result<(Method, Option<Value>), CliError> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
        CliError::Validation {
            field: "method".into(),
            reason: format!("'{}' is not an HTTP method", args.method),
        }
    })?;
    let body = args.data.as_deref().map(serde_json::from_str).transpose()?;
    Ok((method, body))
}

/// Print a plugin response, pretty when it is JSON.
pub fn print_body(text: &str) {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{text}"),
        },
        Err(_) => println!("{text}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn method_is_case_insensitive_and_data_parsed() {
        let (method, body) = parse_request(RequestArgs {
            method: "patch".into(),
            data: Some(r#"{"AssetTag":"x"}"#.into()),
        })
        .unwrap();
        assert_eq!(method, Method::PATCH);
        assert_eq!(body.unwrap()["AssetTag"], "x");
    }

    #[test]
    fn bad_json_is_rejected() {
        let err = parse_request(RequestArgs {
            method: "POST".into(),
            data: Some("{nope".into()),
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
    }
}
