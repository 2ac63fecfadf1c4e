//! System prompt for the returns desk.

use chrono::NaiveDate;
use returns_core::ToolDefinition;

/// Build the system prompt for a conversation held on `today`.
///
/// Tool names are listed from the registry so the prompt never drifts from
/// what the model can actually call.
pub fn system_prompt(today: NaiveDate, tools: &[ToolDefinition], preamble: Option<&str>) -> String {
    let mut prompt = format!(
        "Today is {}. You are a customer support agent for an online store, \
         and you handle product returns.\n\n",
        today.format("%A, %B %-d, %Y")
    );

    if let Some(preamble) = preamble.map(str::trim).filter(|p| !p.is_empty()) {
        prompt.push_str(preamble);
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Work out what the customer needs, look up the facts with your tools, \
         and only then answer.\n\nTools:\n",
    );
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }

    prompt.push_str(
        "\nRules:\n\
         - Be polite and acknowledge the customer's situation.\n\
         - Never promise a refund before checking the order's eligibility.\n\
         - Quote concrete numbers: days since purchase, the 30-day window, refund amounts.\n\
         - If a return is not possible, say why and suggest what the customer can do instead, \
         such as a warranty claim or contacting the manufacturer.\n\
         - If an order id is not found, ask the customer to double-check it.\n\
         - Keep answers short.",
    );
    prompt
}
