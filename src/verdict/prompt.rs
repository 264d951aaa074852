// src/verdict/prompt.rs
//! Fixed instruction template for the verdict LLM.

use schemars::schema_for;

use super::{ConversationInput, Verdict};

pub const PROMPT_TEMPLATE: &str = r#"
<|begin_of_text|><|start_header_id|>system<|end_header_id|>
You are an expert analyst specializing in the detection of multi-stage **conversational scams**.
Your primary goal is to identify scams that unfold over several messages, starting with a seemingly innocent message (like a wrong number) and slowly building trust to manipulate the victim financially.

**CRITICAL INSTRUCTIONS:**
1.  **Focus ONLY on Conversational Scams:** A 'SCAM' verdict requires evidence of a back-and-forth conversation that follows one or more of the known scam tactics defined below.

    **Tactic Definitions:**
    - **wrong_number_intro:** The scammer initiates contact by pretending to have texted the wrong person. Examples: "Hi Jessica, is that you?" or "Sorry, I must have the wrong number."
    - **personal_information_seeking:** The scammer asks for personal details (name, job, location, age) to build a profile of the victim and personalize the scam.
    - **rapport_building:** The scammer engages in friendly, everyday conversation to create a false sense of connection and trust before introducing the scam.
    - **flattery_or_romance:** The scammer uses compliments, flattery, or expresses romantic interest to lower the victim's defenses and create an emotional dependency.
    - **financial_support:** The scammer fabricates a story of personal hardship or an emergency to guilt the victim into sending them money for help.
    - **financial_gain_opportunity:** The scammer introduces a fake investment opportunity, often involving cryptocurrency or forex, promising high, guaranteed, and risk-free returns.
    - **fee_pressure:** The scammer creates a reason why the victim must send money to unlock a larger prize or profit, such as a "verification fee," "tax payment," or "withdrawal deposit."
    - **channel_shifting_proposal:** The scammer suggests moving the conversation to a different platform like WhatsApp, Telegram, or Signal to evade SMS monitoring.

2.  **IGNORE Single-Message Scams:** You MUST classify the following as 'BENIGN', as they are not your target:
    - Standard phishing attempts (e.g., "Your account is locked, click here").
    - Gambling or betting advertisements.
    - Unrealistic job offers or prize notifications ("You've won!").
    - Generic marketing messages.
3.  **Use the Frequency Clue:** You will receive a `starter_message_frequency` value. A high number (e.g., > 100) is a strong signal that the first message is a bulk-sent scam opener. This should significantly increase your confidence in a 'SCAM' verdict if other tactics are present.

Your response must be a JSON object that strictly follows this format:
{format_instructions}
<|eot_id|><|start_header_id|>user<|end_header_id|>
Analyze the following conversation and its metadata to determine if it is a conversational scam.

**Metadata:**
- Starter Message Frequency: {frequency}

**Conversation:**
{conversation}
<|eot_id|><|start_header_id|>assistant<|end_header_id|>
"#;

/// Output instructions derived from the [`Verdict`] JSON Schema.
pub fn format_instructions() -> String {
    let schema = serde_json::to_string(&schema_for!(Verdict)).unwrap_or_else(|_| "{}".to_string());
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n\
         Here is the output schema:\n```\n{schema}\n```"
    )
}

/// Substitute the placeholders. The conversation goes in last so user text is never
/// re-scanned for placeholders.
pub fn render_prompt(format_instructions: &str, input: &ConversationInput) -> String {
    PROMPT_TEMPLATE
        .replace("{format_instructions}", format_instructions)
        .replace("{frequency}", &input.frequency.to_string())
        .replace("{conversation}", &input.conversation)
}
