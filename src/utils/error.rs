use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundingError {
    #[error("Funding entry not found: {id}")]
    NotFound { id: String },

    #[error("Malformed record identifier: {id}")]
    InvalidIdentifier { id: String },

    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Transport,
    Authentication,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FundingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidIdentifier { .. }
            | Self::Validation { .. }
            | Self::MissingRequiredFields { .. } => ErrorCategory::Validation,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Transport(_) | Self::Api { .. } => ErrorCategory::Transport,
            Self::ConfigValidation { .. }
            | Self::InvalidConfigValue { .. }
            | Self::Url(_) => ErrorCategory::Configuration,
            Self::Io(_) | Self::Serialization(_) | Self::Csv(_) | Self::Zip(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Transport failures and server-side (5xx) errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { id } => format!("No funding entry exists with id {}", id),
            Self::InvalidIdentifier { id } => format!("'{}' is not a valid funding entry id", id),
            Self::Unauthorized { .. } => "You need to log in before changing funding entries".to_string(),
            Self::MissingRequiredFields { fields } => {
                format!("Please fill in the required fields: {}", fields.join(", "))
            }
            Self::Validation { message } => message.clone(),
            Self::Transport(_) | Self::Api { .. } => {
                "Failed to reach the funding service. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::NotFound => "Run `list` to see the ids of existing funding entries",
            ErrorCategory::Validation => "Check the record fields (Name, Technology, Total Funding are required)",
            ErrorCategory::Authentication => "Run `login` and pass the token with --token or FUNDING_API_TOKEN",
            ErrorCategory::Transport => "Check that the API is reachable and retry",
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::Storage => "Check the output path permissions and free disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, FundingError>;
