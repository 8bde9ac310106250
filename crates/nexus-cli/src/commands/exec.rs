// crates/nexus-cli/src/commands/exec.rs
//
// `nexus exec <command> [args...]`: run a dashboard terminal command on the
// daemon and print the server-rendered text.

use serde::{Deserialize, Serialize};

use crate::api_client::ApiClient;
use crate::output::{format_json, OutputFormat};

#[derive(Debug, Serialize)]
pub struct ExecRequest<'a> {
    pub command: &'a str,
    pub args: &'a [String],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecResponse {
    pub output: String,
}

/// Run the exec command.
pub async fn run(
    command: &str,
    args: &[String],
    client: &ApiClient,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ExecRequest { command, args };
    let resp: ExecResponse = client.post("/api/cli/execute", &request).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => print!("{}", ensure_trailing_newline(&resp.output)),
    }
    Ok(())
}

fn ensure_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}
