//! Call command implementation

use colored::Colorize;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::output::json::format_json;
use credkeeper::error::{Error, Result};
use credkeeper::executor::RequestOptions;

/// Response as printed in JSON mode
#[derive(Debug, Serialize)]
struct CallOutput {
    status: u16,
    body: serde_json::Value,
}

/// Send one authorized request and print its body
pub async fn run(
    opts: &GlobalOptions,
    method: &str,
    target: &str,
    data: Option<&str>,
    headers: &[String],
) -> Result<()> {
    let options = build_options(method, data, headers)?;

    let ctx = CommandContext::new(opts).await?;
    let client = ctx.executor()?;
    let response = client.call(target, &options).await?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Other(format!("Failed to read response: {}", e)))?;
    let body = serde_json::from_str::<serde_json::Value>(&text).ok();

    match ctx.format {
        OutputFormat::Json => {
            let output = CallOutput {
                status: status.as_u16(),
                body: body.unwrap_or(serde_json::Value::String(text)),
            };
            println!("{}", format_json(&output)?);
        }
        OutputFormat::Pretty | OutputFormat::Table => {
            eprintln!("{} {}", "HTTP".dimmed(), status);
            match body {
                Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                None if !text.is_empty() => println!("{}", text),
                None => {}
            }
        }
    }

    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Other(format!("{} {} returned {}", options.method, target, status)))
    }
}

/// Turn command-line arguments into request options
fn build_options(method: &str, data: Option<&str>, headers: &[String]) -> Result<RequestOptions> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| Error::Other(format!("Invalid HTTP method: {}", method)))?;

    let mut options = RequestOptions::new(method);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        options = options.with_header(name, value);
    }
    if let Some(data) = data {
        options = options.with_json(serde_json::from_str(data)?);
    }
    Ok(options)
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| Error::Other(format!("Header must be 'Name: value', got '{}'", raw)))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| Error::Other(format!("Invalid header name '{}': {}", name.trim(), e)))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| Error::Other(format!("Invalid header value for '{}': {}", name, e)))?;
    Ok((name, value))
}
