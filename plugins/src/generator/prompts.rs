//! Prompt construction for the chat-completions generator.

use taskdeck_core::api::{AgentType, ChatMessage, ChatRole, GenerationKind, GenerationRequest};

const ACCOUNTANT_PROMPT: &str = "You are an expert AI accounting assistant. You specialize in:
- Tax preparation and planning
- Bookkeeping and financial record management
- Audit support and compliance
- Financial advisory and analysis
- Payroll processing
- Invoice management

Provide accurate, professional financial advice. Always note when users should consult a licensed CPA for complex matters.";

const LEGAL_PROMPT: &str = "You are an expert AI legal assistant. You specialize in:
- Contract review and analysis
- Legal research and case law
- Compliance and regulatory matters
- Intellectual property guidance
- Due diligence support

Provide thorough legal analysis. Always note that you are an AI assistant and recommend consulting a licensed attorney for legal decisions.";

const MEDICAL_PROMPT: &str = "You are an expert AI medical documentation assistant. You specialize in:
- Patient record organization and analysis
- Insurance claim processing
- Medical coding (ICD-10, CPT)
- Treatment plan documentation
- Appointment scheduling optimization

Provide accurate medical documentation support. Always note that medical decisions should be made by licensed healthcare professionals.";

const ARCHITECT_PROMPT: &str = "You are an expert AI architecture assistant. You specialize in:
- Drawing and blueprint review
- Building code compliance
- Project management support
- Material analysis and recommendations
- Cost estimation
- Permit documentation

Provide detailed architectural analysis and recommendations.";

const RESEARCHER_PROMPT: &str = "You are an expert AI research assistant. You specialize in:
- Market research and competitive analysis
- Data mining and synthesis
- Trend analysis and forecasting
- Report writing and documentation
- Citation management
- Literature review

Provide thorough, well-sourced research with proper citations when possible.";

const ANALYST_PROMPT: &str = "You are an expert AI data analyst. You specialize in:
- Data analysis and visualization recommendations
- Financial modeling
- Forecasting and predictive analysis
- KPI tracking and performance metrics
- Dashboard design recommendations
- Statistical analysis

Provide data-driven insights with clear explanations of methodology.";

pub fn system_prompt(agent_type: AgentType) -> &'static str {
    match agent_type {
        AgentType::Accountant => ACCOUNTANT_PROMPT,
        AgentType::Legal => LEGAL_PROMPT,
        AgentType::Medical => MEDICAL_PROMPT,
        AgentType::Architect => ARCHITECT_PROMPT,
        AgentType::Researcher => RESEARCHER_PROMPT,
        AgentType::Analyst => ANALYST_PROMPT,
    }
}

/// Focus list for an extraction type; unknown types use the general list.
pub fn extraction_focus(extraction_type: &str) -> &'static str {
    match extraction_type {
        "invoice" => {
            "Extract all invoice data including:
- Invoice number, date, due date
- Vendor/seller information
- Buyer/customer information
- Line items with descriptions, quantities, prices
- Subtotal, taxes, total amount
- Payment terms"
        }
        "contract" => {
            "Extract key contract information including:
- Parties involved
- Effective date and term
- Key obligations of each party
- Payment terms
- Termination clauses
- Important deadlines
- Liability and indemnification clauses"
        }
        "financial" => {
            "Extract financial data including:
- Revenue/income figures
- Expenses and costs
- Profit/loss calculations
- Key ratios and metrics
- Year-over-year comparisons
- Notable trends"
        }
        _ => {
            "Extract all important structured data including:
- Names, dates, and numbers
- Key entities and relationships
- Important figures and statistics
- Action items and deadlines"
        }
    }
}

/// Section outline for a report type; unknown types use the analysis outline.
pub fn report_outline(report_type: &str) -> &'static str {
    match report_type {
        "summary" => {
            "Generate a professional summary report including:
- Overview
- Main Points
- Key Takeaways
- Next Steps"
        }
        "comparison" => {
            "Generate a comparison report including:
- Items Being Compared
- Comparison Criteria
- Side-by-Side Analysis
- Pros and Cons
- Recommendation"
        }
        _ => {
            "Generate a comprehensive analysis report including:
- Executive Summary
- Key Findings
- Detailed Analysis
- Data Insights
- Recommendations
- Conclusion"
        }
    }
}

/// Sampling temperature per generation kind. Chat uses the configured value.
pub fn temperature_for(kind: &GenerationKind, chat_temperature: f32) -> f32 {
    match kind {
        GenerationKind::Summarize | GenerationKind::Answer { .. } => 0.3,
        GenerationKind::Extract { .. } => 0.2,
        GenerationKind::Report { .. } => 0.5,
        GenerationKind::Research { .. } => 0.6,
        GenerationKind::Chat { .. } => chat_temperature,
    }
}

/// Extraction, reports and research go to the detailed model; an empty
/// detailed model means everything uses `model`.
pub fn model_for<'a>(kind: &GenerationKind, model: &'a str, detailed_model: &'a str) -> &'a str {
    match kind {
        GenerationKind::Extract { .. }
        | GenerationKind::Report { .. }
        | GenerationKind::Research { .. }
            if !detailed_model.trim().is_empty() =>
        {
            detailed_model
        }
        _ => model,
    }
}

fn message(role: ChatRole, content: impl Into<String>) -> ChatMessage {
    ChatMessage {
        role,
        content: content.into(),
    }
}

/// Build the full message list sent to the chat-completions endpoint.
pub fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let system = system_prompt(request.agent_type);
    let content = &request.content;

    match &request.kind {
        GenerationKind::Summarize => vec![
            message(ChatRole::System, system),
            message(
                ChatRole::User,
                format!(
                    "Please provide a comprehensive summary of the following document. Include:
1. Main topics and key points
2. Important data, figures, or statistics
3. Key conclusions or recommendations
4. Any action items or next steps mentioned

Document content:
{content}"
                ),
            ),
        ],
        GenerationKind::Answer { question } => vec![
            message(ChatRole::System, system),
            message(
                ChatRole::User,
                format!(
                    "Based on the following document, please answer this question: \"{question}\"

If the answer cannot be found in the document, say so clearly.

Document content:
{content}"
                ),
            ),
        ],
        GenerationKind::Extract { extraction_type } => vec![
            message(ChatRole::System, system),
            message(
                ChatRole::User,
                format!(
                    "{}

Format the extracted data in a clear, structured format.

Document content:
{content}",
                    extraction_focus(extraction_type)
                ),
            ),
        ],
        GenerationKind::Report { report_type } => vec![
            message(ChatRole::System, system),
            message(
                ChatRole::User,
                format!(
                    "{}

Use professional formatting with clear sections and bullet points where appropriate.

Source data:
{content}",
                    report_outline(report_type)
                ),
            ),
        ],
        GenerationKind::Research { topic } => {
            let context = if content.is_empty() {
                String::new()
            } else {
                format!("Additional context: {content}")
            };
            vec![
                message(ChatRole::System, system),
                message(
                    ChatRole::User,
                    format!(
                        "Conduct thorough research on the following topic: \"{topic}\"

{context}

Please provide:
1. Overview of the topic
2. Key facts and information
3. Different perspectives or approaches
4. Current trends and developments
5. Potential implications or applications
6. Recommendations for further exploration

Note: Base your response on your training data. Acknowledge any limitations in your knowledge."
                    ),
                ),
            ]
        }
        GenerationKind::Chat { history, message: user_message } => {
            let mut system = system.to_string();
            if !content.is_empty() {
                system.push_str("\n\nYou have access to the following document for reference:\n");
                system.push_str(content);
            }
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(message(ChatRole::System, system));
            messages.extend(history.iter().cloned());
            messages.push(message(ChatRole::User, user_message.clone()));
            messages
        }
    }
}
