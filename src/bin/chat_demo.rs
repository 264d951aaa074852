//! Terminal chat demo: type both sides of a conversation, watch per-message scam
//! signals, then ask the LLM for a conversation verdict.
//!
//! Commands: `s: <text>` (Sender), `r: <text>` (Receiver), `/llm [frequency]`,
//! `/reset`, `/quit`. Server from `API_BASE_URL` (default `http://127.0.0.1:8081`).

use safechatter::client::{self, ApiClient};
use safechatter::conversation::ChatTurn;
use safechatter::scoring::{ScoreRecord, DEFAULT_FLAG_THRESHOLD};
use safechatter::verdict::{ConversationInput, Verdict};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: s: <text> | r: <text> | /llm [frequency] | /reset | /quit";

#[derive(Default)]
struct ChatState {
    history: Vec<ChatTurn>,
    scores: Vec<ScoreRecord>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    safechatter::logging::init_tracing();

    let api = ApiClient::from_env()?;
    println!("safechatter demo against {}", api.base_url());
    println!("{HELP}");

    let mut state = ChatState::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(text) = line.strip_prefix("s:") {
            send(&api, &mut state, "Sender", text).await;
        } else if let Some(text) = line.strip_prefix("r:") {
            send(&api, &mut state, "Receiver", text).await;
        } else if let Some(rest) = line.strip_prefix("/llm") {
            let frequency = match rest.trim() {
                "" => 0,
                n => match n.parse::<i64>() {
                    Ok(f) => f,
                    Err(_) => {
                        println!("frequency must be an integer");
                        continue;
                    }
                },
            };
            run_verdict(&api, &state, frequency).await;
        } else if line == "/reset" {
            reset(&api, &mut state).await;
        } else if line == "/quit" {
            break;
        } else {
            println!("{HELP}");
        }
    }

    println!("bye");
    Ok(())
}

async fn send(api: &ApiClient, state: &mut ChatState, role: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        println!("(empty message ignored)");
        return;
    }

    match api.process(text, role, &state.history).await {
        Ok(resp) => {
            let flagged = client::signals(&resp, DEFAULT_FLAG_THRESHOLD);
            state.history = resp.updated_history;
            state.scores = resp.scores;

            println!("{}: {}", role.to_uppercase(), text);
            if flagged.is_empty() {
                println!("  ✅ No strong scam signals");
            } else {
                println!("  ⚠️ Potential signals: {}", flagged.join(", "));
            }
            print_scores(&state.scores);
            println!("  ⏱️ Prediction time: {:.2}s", resp.inference_time);
        }
        Err(e) => {
            // Keep history as it was; the message can be re-sent.
            println!("⚠️ API error: could not reach the classifier. Details: {e}");
            println!("  not sent: {role}: {text}");
        }
    }
}

async fn run_verdict(api: &ApiClient, state: &ChatState, frequency: i64) {
    if state.history.is_empty() {
        println!("Cannot run LLM on an empty conversation.");
        return;
    }

    let input = ConversationInput::from_turns(&state.history, frequency);
    match api.invoke_verdict(&input).await {
        Ok(verdict) => print_verdict(&verdict),
        Err(e) if e.is_parse_failure() => {
            println!("❌ Failed to parse LLM response: {e}");
            println!("Raw response:\n{}", e.raw().unwrap_or(""));
            println!("(no verdict)");
        }
        Err(e) => {
            println!("❌ LLM call failed: {e}");
            println!("(no verdict)");
        }
    }
}

async fn reset(api: &ApiClient, state: &mut ChatState) {
    if let Err(e) = api.reset().await {
        println!("⚠️ API error: could not reset conversation state on server. Details: {e}");
    }
    *state = ChatState::default();
    println!("conversation cleared");
}

fn print_scores(scores: &[ScoreRecord]) {
    for r in scores {
        println!("  {:<28} {:.3}", r.label.as_str(), r.score);
    }
}

fn print_verdict(v: &Verdict) {
    let tactics = if v.tactics.is_empty() {
        "None".to_string()
    } else {
        v.tactics
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Verdict: {}", v.label.as_str());
    println!("Confidence: {:.2}", v.confidence);
    println!("Traits: {tactics}");
}
