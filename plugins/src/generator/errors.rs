use taskdeck_core::api::{GenerationError, GenerationErrorKind};

const BODY_PREVIEW_LIMIT: usize = 512;

pub(crate) const MISSING_KEY_MESSAGE: &str =
    "OpenAI API key not configured. Please add your API key to the configuration (ai.api_key or TASKDECK_API_KEY).";

/// Raw facts about a failed call, before classification.
#[derive(Debug, Default, Clone)]
pub struct ApiFailure<'a> {
    pub status: Option<u16>,
    pub code: Option<&'a str>,
    pub message: &'a str,
}

/// Map a failed call onto one of the user-facing error kinds.
///
/// Checks run in a fixed order; the first match wins, so a 429 is reported
/// as an exhausted quota rather than a rate limit.
pub fn classify(failure: &ApiFailure<'_>) -> GenerationError {
    let msg = failure.message;
    let code = failure.code.unwrap_or_default();

    if msg.contains("quota")
        || msg.contains("exceeded")
        || msg.contains("insufficient_quota")
        || code == "insufficient_quota"
        || failure.status == Some(429)
    {
        return GenerationError::new(
            GenerationErrorKind::QuotaExceeded,
            "API quota exceeded. Please check your OpenAI billing settings.",
        )
        .with_details(
            "Your OpenAI account has reached its usage limit. Add payment method or upgrade your plan at platform.openai.com/billing",
        );
    }

    if msg.contains("invalid")
        || msg.contains("api_key")
        || msg.contains("Incorrect API key")
        || failure.status == Some(401)
    {
        return GenerationError::new(
            GenerationErrorKind::InvalidKey,
            "Invalid API key. Please check your OpenAI API key.",
        )
        .with_details(
            "Verify the configured API key and ensure it's active at platform.openai.com/api-keys",
        );
    }

    if msg.contains("rate") || msg.contains("limit") {
        return rate_limited();
    }

    if msg.contains("network") || msg.contains("ECONNREFUSED") {
        return network();
    }

    let message = if msg.trim().is_empty() {
        "An unexpected error occurred"
    } else {
        msg
    };
    GenerationError::new(GenerationErrorKind::Unknown, message)
        .with_details("Please try again or contact support if the issue persists.")
}

fn rate_limited() -> GenerationError {
    GenerationError::new(
        GenerationErrorKind::RateLimited,
        "Rate limit reached. Please wait a moment and try again.",
    )
    .with_details("Too many requests in a short time. The system will retry automatically.")
}

fn network() -> GenerationError {
    GenerationError::new(
        GenerationErrorKind::Network,
        "Network error. Please check your internet connection.",
    )
    .with_details("Unable to reach OpenAI servers. Check your connection and try again.")
}

/// Transport-level failure from reqwest.
///
/// Connect and timeout failures are network errors outright; anything else
/// goes through the message-based classification.
pub(crate) fn from_reqwest(err: &reqwest::Error) -> GenerationError {
    if err.is_connect() || err.is_timeout() {
        return network();
    }
    let message = err.to_string();
    classify(&ApiFailure {
        status: err.status().map(|s| s.as_u16()),
        code: None,
        message: &message,
    })
}

/// Failure reported in a non-2xx response body.
///
/// OpenAI-style bodies look like `{"error": {"message": ..., "code": ...}}`;
/// other bodies are classified on a preview of their text.
pub(crate) fn from_status(status: u16, body: &str) -> GenerationError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| preview_body(body));
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str());

    classify(&ApiFailure {
        status: Some(status),
        code,
        message: &message,
    })
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}
