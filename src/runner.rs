//! Interactive trading bot
//!
//! Reads commands line by line (`swap sol usdc 1.5`, `quote ...`, `tokens`)
//! and drives the plugin's actions. Symbols are resolved through the token
//! registry and human amounts are converted to base units before any
//! request is built.

use crate::actions::{
    ActionContext, ActionRequest, ActionResponse, OkxDexPlugin, QuoteInput, SwapInput,
};
use crate::amount::to_base_units;
use crate::{Error, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

const HELP: &str = "\
Available Commands:
  swap <from> <to> <amount>   - Execute a token swap
  quote <from> <to> <amount>  - Get a quote for a swap
  tokens                      - List available tokens
  help                        - Show this help message
  exit                        - Exit the bot

Example Usage:
  quote sol usdc 1.5          - Get quote for swapping 1.5 SOL to USDC
  swap sol usdc 1.5           - Swap 1.5 SOL to USDC
  quote usdc sol 100          - Get quote for swapping 100 USDC to SOL
  swap usdc sol 100           - Swap 100 USDC to SOL";

/// A parsed bot command; token arguments are symbols or mint addresses and
/// amounts are human-readable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Swap {
        from: String,
        to: String,
        amount: String,
    },
    Quote {
        from: String,
        to: String,
        amount: String,
    },
    Tokens,
    Help,
    Exit,
    Empty,
}

impl BotCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(BotCommand::Empty);
        };
        let args: Vec<&str> = parts.collect();

        match command.to_ascii_lowercase().as_str() {
            "swap" | "quote" => {
                let [from, to, amount] = args.as_slice() else {
                    return Err(Error::InvalidInput(format!(
                        "Usage: {} <from> <to> <amount>\nExample: {} sol usdc 1.5",
                        command, command
                    )));
                };
                let (from, to, amount) = (from.to_string(), to.to_string(), amount.to_string());
                if command.eq_ignore_ascii_case("swap") {
                    Ok(BotCommand::Swap { from, to, amount })
                } else {
                    Ok(BotCommand::Quote { from, to, amount })
                }
            }
            "tokens" => Ok(BotCommand::Tokens),
            "help" => Ok(BotCommand::Help),
            "exit" | "quit" => Ok(BotCommand::Exit),
            _ => Err(Error::InvalidInput(
                "Unknown command. Type 'help' for available commands.".to_string(),
            )),
        }
    }
}

/// Line-oriented front-end over [`OkxDexPlugin`]
pub struct TradingBot {
    plugin: OkxDexPlugin,
    context: ActionContext,
    slippage: String,
}

impl TradingBot {
    pub fn new(plugin: OkxDexPlugin, context: ActionContext) -> Self {
        let slippage = context.config.tokens.default_slippage_percent.clone();
        Self {
            plugin,
            context,
            slippage,
        }
    }

    /// Slippage percentage used for every quote and swap
    pub fn with_slippage(mut self, slippage: impl Into<String>) -> Self {
        self.slippage = slippage.into();
        self
    }

    /// Turn a trade command into a validated action request
    ///
    /// Returns `None` for commands that do not call an action.
    pub fn build_request(&self, command: &BotCommand) -> Result<Option<ActionRequest>> {
        let (from, to, amount, swap) = match command {
            BotCommand::Swap { from, to, amount } => (from, to, amount, true),
            BotCommand::Quote { from, to, amount } => (from, to, amount, false),
            BotCommand::Tokens => return Ok(Some(ActionRequest::Tokens)),
            _ => return Ok(None),
        };

        let registry = self.plugin.client().tokens();
        let from_token = registry.resolve(from)?;
        let to_token = registry.resolve(to)?;
        let base_amount = to_base_units(amount, from_token.decimals)?;

        let request = if swap {
            ActionRequest::Swap(SwapInput {
                from_token_address: from_token.address,
                to_token_address: to_token.address,
                amount: base_amount,
                slippage: self.slippage.clone(),
                auto_slippage: false,
                max_auto_slippage_percent: None,
            })
        } else {
            ActionRequest::Quote(QuoteInput {
                from_token_address: from_token.address,
                to_token_address: to_token.address,
                amount: base_amount,
                slippage: self.slippage.clone(),
            })
        };

        request.validate()?;
        Ok(Some(request))
    }

    /// Handle one input line; `None` means the session should end
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let command = match BotCommand::parse(line) {
            Ok(command) => command,
            Err(e) => return Some(user_message(&e)),
        };

        match command {
            BotCommand::Empty => Some(String::new()),
            BotCommand::Help => Some(HELP.to_string()),
            BotCommand::Exit => None,
            command => Some(match self.run_action(&command).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Bot command failed");
                    user_message(&e)
                }
            }),
        }
    }

    async fn run_action(&self, command: &BotCommand) -> Result<String> {
        let Some(request) = self.build_request(command)? else {
            return Ok(String::new());
        };

        if let BotCommand::Swap { from, to, amount } = command {
            info!(from = %from, to = %to, amount = %amount, "Executing swap from bot");
        }

        let is_tokens = matches!(request, ActionRequest::Tokens);
        let response = self.plugin.invoke(&self.context, request).await?;

        if is_tokens && response.is_success() {
            return Ok(self.render_tokens());
        }
        Ok(render_response(&response))
    }

    fn render_tokens(&self) -> String {
        let tokens = self.plugin.client().tokens().all();
        let mut out = format!("Available tokens ({}):", tokens.len());
        for token in tokens.iter().filter(|t| !t.symbol.is_empty()) {
            out.push_str(&format!(
                "\n  {:<10} {} ({} decimals)",
                token.symbol, token.address, token.decimals
            ));
        }
        out
    }

    /// Run the read-eval-print loop until `exit` or end of input
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(&mut output, "Welcome to the OKX DEX trading bot!").await?;
        write_line(&mut output, HELP).await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"\n> ").await.map_err(io_error)?;
            output.flush().await.map_err(io_error)?;

            let Some(line) = lines.next_line().await.map_err(io_error)? else {
                break;
            };

            match self.handle_line(&line).await {
                Some(text) if text.is_empty() => {}
                Some(text) => write_line(&mut output, &text).await?,
                None => {
                    write_line(&mut output, "Goodbye!").await?;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Run against the process's stdin and stdout
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.run(stdin, tokio::io::stdout()).await
    }
}

fn render_response(response: &ActionResponse) -> String {
    let mut out = String::new();
    if let Some(message) = &response.message {
        out.push_str(message);
    }
    if let Some(summary) = &response.summary {
        let pretty = serde_json::to_string_pretty(&summary.0)
            .unwrap_or_else(|_| Value::Null.to_string());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&pretty);
    }
    if let Some(details) = &response.details {
        out.push_str(&format!("\n({})", details));
    }
    out
}

fn user_message(err: &Error) -> String {
    match err {
        Error::InvalidInput(message) => message.clone(),
        other => format!("Error: {}", other),
    }
}

fn io_error(err: std::io::Error) -> Error {
    Error::Config(format!("terminal I/O failed: {}", err))
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await.map_err(io_error)?;
    output.write_all(b"\n").await.map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiCredentials, Config};
    use crate::okx::transport::StubTransport;
    use crate::okx::types::fixtures;
    use crate::okx::OkxDexClient;
    use crate::swap::SwapExecutor;
    use crate::tokens::{addresses, TokenRegistry};
    use std::sync::Arc;

    fn bot(stub: &Arc<StubTransport>) -> TradingBot {
        let client = Arc::new(OkxDexClient::new(
            Some(ApiCredentials::new("key", "secret", "pass", "project").unwrap()),
            stub.clone(),
            Arc::new(TokenRegistry::new()),
        ));
        let executor = SwapExecutor::new(client.clone(), None);
        let plugin = OkxDexPlugin::new(client, executor);
        TradingBot::new(plugin, ActionContext::new(Arc::new(Config::default())))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            BotCommand::parse("swap sol usdc 1.5").unwrap(),
            BotCommand::Swap {
                from: "sol".into(),
                to: "usdc".into(),
                amount: "1.5".into()
            }
        );
        assert_eq!(
            BotCommand::parse("  QUOTE usdc sol 100 ").unwrap(),
            BotCommand::Quote {
                from: "usdc".into(),
                to: "sol".into(),
                amount: "100".into()
            }
        );
        assert_eq!(BotCommand::parse("tokens").unwrap(), BotCommand::Tokens);
        assert_eq!(BotCommand::parse("").unwrap(), BotCommand::Empty);
        assert_eq!(BotCommand::parse("exit").unwrap(), BotCommand::Exit);
        assert!(BotCommand::parse("swap sol usdc").is_err());
        assert!(BotCommand::parse("bridge sol eth 1").is_err());
    }

    #[test]
    fn test_build_request_converts_symbols_and_amounts() {
        let stub = Arc::new(StubTransport::new());
        let bot = bot(&stub);

        let request = bot
            .build_request(&BotCommand::parse("quote sol usdc 1.5").unwrap())
            .unwrap()
            .unwrap();
        match request {
            ActionRequest::Quote(input) => {
                assert_eq!(input.from_token_address, addresses::WRAPPED_SOL);
                assert_eq!(input.to_token_address, addresses::USDC);
                assert_eq!(input.amount, "1500000000");
                assert_eq!(input.slippage, "0.5");
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let request = bot
            .build_request(&BotCommand::parse("swap usdc sol 100").unwrap())
            .unwrap()
            .unwrap();
        match request {
            ActionRequest::Swap(input) => assert_eq!(input.amount, "100000000"),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let stub = Arc::new(StubTransport::new());
        let bot = bot(&stub);

        let err = bot
            .build_request(&BotCommand::parse("quote doge usdc 1").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownToken(_)));

        let err = bot
            .build_request(&BotCommand::parse("quote usdc sol 0.0000001").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_quote_line() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(fixtures::sol_usdc_quote());
        let bot = bot(&stub);

        let text = bot.handle_line("quote sol usdc 1").await.unwrap();
        assert!(text.starts_with("Quote received: 1 SOL = 20.5 USDC"));
        assert_eq!(
            stub.requests()[0].query_param("amount").as_deref(),
            Some("1000000000")
        );
    }

    #[tokio::test]
    async fn test_swap_without_wallet_reports_error() {
        let stub = Arc::new(StubTransport::new());
        let bot = bot(&stub);

        let text = bot.handle_line("swap sol usdc 1").await.unwrap();
        assert!(text.starts_with("Error: Missing OKX credentials"));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_session() {
        let stub = Arc::new(StubTransport::new());
        let bot = bot(&stub);
        let input = std::io::Cursor::new(b"help\nfoo\nexit\nquote sol usdc 1\n".to_vec());
        let mut output = Vec::new();

        tokio_test::assert_ok!(bot.run(input, &mut output).await);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Unknown command"));
        assert!(text.trim_end().ends_with("Goodbye!"));
        // Nothing after exit is processed
        assert_eq!(stub.call_count(), 0);
    }
}
