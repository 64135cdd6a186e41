use std::io::{self, Read};

use clap::Args;
use serde_json::{Value, json};

use crate::app::Runtime;
use crate::chat::{ChatController, Message, Sender, Submission};
use crate::errors::CliError;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Prompt text
    pub prompt: Option<String>,
    /// Read prompt from stdin
    #[arg(long)]
    pub stdin: bool,
}

pub async fn handle(runtime: &Runtime, args: AskArgs) -> Result<(), CliError> {
    let prompt = resolve_prompt(&args)?;
    let mut controller = runtime.controller()?;
    runtime
        .output
        .print_verbose(&format!("Sending {} chars to Gemini...", prompt.chars().count()));

    let reply = ask(&mut controller, &prompt).await?;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json_report(controller.messages(), &reply))?;
    } else if reply.sender == Sender::System {
        runtime.output.print_result(&reply.content);
    }
    outcome(reply)
}

fn json_report(messages: &[Message], reply: &Message) -> Value {
    json!({
        "ok": reply.sender == Sender::System,
        "messages": messages,
    })
}

/// An error bubble becomes a non-zero exit. Its text is carried along for
/// human output; JSON output already holds it.
fn outcome(reply: Message) -> Result<(), CliError> {
    match reply.sender {
        Sender::System => Ok(()),
        _ => Err(CliError::Generation(reply.content)),
    }
}

/// Runs a single exchange and hands back the message it ended with.
async fn ask(controller: &mut ChatController, prompt: &str) -> Result<Message, CliError> {
    match controller.exchange(prompt).await {
        Submission::Dispatched(_) => controller
            .messages()
            .last()
            .cloned()
            .ok_or_else(|| CliError::Generic("No reply was recorded.".to_string())),
        Submission::Blank => Err(missing_prompt()),
        Submission::Busy => Err(CliError::Generic(
            "A request is already outstanding.".to_string(),
        )),
    }
}

fn resolve_prompt(args: &AskArgs) -> Result<String, CliError> {
    if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::Generic(format!("Failed reading stdin: {e}")))?;
        let trimmed = input.trim().to_string();
        if trimmed.is_empty() {
            return Err(CliError::Usage(
                "No prompt provided via stdin. Pipe text or pass a prompt argument.".to_string(),
            ));
        }
        return Ok(trimmed);
    }

    match &args.prompt {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(missing_prompt()),
    }
}

fn missing_prompt() -> CliError {
    CliError::Usage("Missing prompt. Use `gemchat ask \"...\"` or pass `--stdin`.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::controller::GENERATION_ERROR_TEXT;
    use crate::chat::testing::{Scripted, fail, ok};
    use crate::output::error_payload;

    #[test]
    fn prompt_argument_is_trimmed() {
        let args = AskArgs {
            prompt: Some("  hello \n".to_string()),
            stdin: false,
        };
        assert_eq!(resolve_prompt(&args).unwrap(), "hello");
    }

    #[test]
    fn blank_prompt_is_a_usage_error() {
        let args = AskArgs {
            prompt: Some("   ".to_string()),
            stdin: false,
        };
        assert!(matches!(resolve_prompt(&args), Err(CliError::Usage(_))));

        let args = AskArgs {
            prompt: None,
            stdin: false,
        };
        assert!(matches!(resolve_prompt(&args), Err(CliError::Usage(_))));
    }

    #[tokio::test]
    async fn ask_returns_formatted_reply() {
        let mut controller = ChatController::new(Scripted::with(vec![ok("## Hi\nthere")]));
        let reply = ask(&mut controller, "hello").await.unwrap();
        assert_eq!(reply.sender, Sender::System);
        assert_eq!(reply.content, "<h2>Hi</h2><br/>there");
        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn ask_surfaces_error_bubble() {
        let mut controller = ChatController::new(Scripted::with(vec![fail()]));
        let reply = ask(&mut controller, "hello").await.unwrap();
        assert_eq!(reply.sender, Sender::Error);
        assert_eq!(reply.content, GENERATION_ERROR_TEXT);
    }

    #[tokio::test]
    async fn failed_exchange_reports_once_in_json() {
        let mut controller = ChatController::new(Scripted::with(vec![fail()]));
        let reply = ask(&mut controller, "hello").await.unwrap();

        let report = json_report(controller.messages(), &reply);
        assert_eq!(report["ok"], false);
        assert_eq!(report["messages"].as_array().unwrap().len(), 2);
        assert_eq!(report["messages"][1]["sender"], "error");

        let err = outcome(reply).unwrap_err();
        assert!(matches!(err, CliError::Generation(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(error_payload(&err).is_none());
    }

    #[tokio::test]
    async fn successful_exchange_exits_cleanly() {
        let mut controller = ChatController::new(Scripted::with(vec![ok("hi")]));
        let reply = ask(&mut controller, "hello").await.unwrap();
        assert_eq!(json_report(controller.messages(), &reply)["ok"], true);
        assert!(outcome(reply).is_ok());
    }

    #[tokio::test]
    async fn ask_rejects_blank_prompt_without_calling_generator() {
        let script = Scripted::with(vec![]);
        let mut controller = ChatController::new(script.clone());
        assert!(matches!(
            ask(&mut controller, " \t").await,
            Err(CliError::Usage(_))
        ));
        assert!(script.prompts().is_empty());
    }
}
