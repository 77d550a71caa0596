//! Line-delimited JSON-RPC over stdin/stdout
//!
//! Stdout carries protocol messages only; logging must go to stderr.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::service::McpService;

/// Serve the process's stdin/stdout until EOF or cancellation
pub async fn serve_stdio(service: McpService, shutdown: CancellationToken) -> std::io::Result<()> {
    info!("Serving JSON-RPC over stdio");
    serve_lines(
        service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown,
    )
    .await
}

/// Process messages one line at a time, in order
pub async fn serve_lines<R, W>(
    service: McpService,
    reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Stdio transport received shutdown signal");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            debug!("Stdin closed");
            break;
        };

        if let Some(response) = service.handle_line(&line).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ToolContext;
    use observability::ToolMetrics;
    use provider::StaticProvider;
    use serde_json::Value;
    use std::sync::Arc;

    fn service() -> McpService {
        McpService::new(ToolContext::new(
            Arc::new(StaticProvider::new().with_price("SPY", 500.0)),
            ToolMetrics::new("stdio"),
        ))
    }

    #[tokio::test]
    async fn test_one_response_per_request_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_stock_price","arguments":{"symbol":"spy"}}}"#,
            "\n",
        );
        let mut output = Vec::new();

        serve_lines(
            service(),
            input.as_bytes(),
            &mut output,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(
            responses[1]["result"]["structuredContent"]["current_price"],
            500.0
        );
    }

    #[tokio::test]
    async fn test_stops_when_cancelled() {
        let (_client, server_side) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            serve_lines(service(), BufReader::new(server_side), Vec::new(), token),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
