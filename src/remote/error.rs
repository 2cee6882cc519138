use std::fmt;

/// Categorized remote service errors with actionable guidance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection-level failures (DNS, refused, timed out)
    Network(String),
    /// Missing, invalid or revoked API key
    Authentication(String),
    /// Project or resource does not exist on the service
    NotFound(String),
    /// Service answered with an unexpected status
    Server {
        /// HTTP status code
        status: u16,
        /// Condensed response body
        message: String,
    },
    /// Service answered 2xx but the payload could not be understood
    InvalidResponse(String),
}

impl RemoteError {
    /// Categorize a non-success HTTP response
    #[must_use]
    pub fn from_status(operation: &str, status: u16, body: &str) -> Self {
        let detail = extract_meaningful_message(body);
        match status {
            401 | 403 => Self::Authentication(format!("{operation}: {detail}")),
            404 => Self::NotFound(format!("{operation}: {detail}")),
            408 | 502..=504 => Self::Network(format!("{operation}: HTTP {status} - {detail}")),
            _ => Self::Server {
                status,
                message: format!("{operation}: {detail}"),
            },
        }
    }

    /// Categorize a transport error reported by the HTTP client
    #[must_use]
    pub fn from_transport(operation: &str, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(operation, status.as_u16(), &err.to_string());
        }
        if err.is_decode() {
            return Self::InvalidResponse(format!("{operation}: {err}"));
        }
        Self::Network(format!("{operation}: {err}"))
    }

    /// Get a user-friendly error message with suggestions
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Check your internet connection\n\
                 - Verify remote.api_url with 'patchwise config remote.api_url'\n\
                 - Try again in a moment"
            ),
            Self::Authentication(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Run 'patchwise login --api-key <KEY>' to store a valid key\n\
                 - Check that PATCHWISE_API_KEY is not set to a stale value"
            ),
            Self::NotFound(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Check project_id in .patchwise.toml\n\
                 - Run 'patchwise init --force' to link the directory again"
            ),
            Self::Server { status, message } => {
                format!("{message}\n\nThe service answered with HTTP {status}.")
            }
            Self::InvalidResponse(msg) => format!(
                "{msg}\n\nThe service returned a response this client does not understand."
            ),
        }
    }

    /// Check if this error type is transient and might succeed on retry
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network Error",
            Self::Authentication(_) => "Authentication Error",
            Self::NotFound(_) => "Not Found",
            Self::Server { .. } => "Server Error",
            Self::InvalidResponse(_) => "Invalid Response",
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for RemoteError {}

/// Condense a response body to its first few non-empty lines
fn extract_meaningful_message(body: &str) -> String {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect();

    if lines.is_empty() {
        return "No error details available".to_string();
    }

    lines.join(" | ")
}
