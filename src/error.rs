//! Error types for route53-ddns.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for route53-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// Every way a run can fail. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// A required setting is missing or unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The IP discovery endpoint could not be reached or did not answer with a body.
    #[error("IP discovery endpoint unreachable: {0}")]
    DiscoveryUnreachable(String),

    /// The IP discovery endpoint answered with something that is not a dotted-quad.
    #[error("IP discovery returned malformed content: {0:?}")]
    DiscoveryMalformed(String),

    /// Route 53 refused the change.
    #[error("Route 53 rejected the change ({code}): {message}")]
    ProviderRejected { code: String, message: String },

    /// The AWS credentials are missing or were not accepted.
    #[error("Invalid AWS credentials: {0}")]
    CredentialsInvalid(String),

    /// Anything else that went wrong while talking to Route 53.
    #[error("Unexpected Route 53 failure: {0}")]
    ProviderUnexpected(String),

    /// A required directory could not be created.
    #[error("Directory \"{}\" was not created: {source}", path.display())]
    FilesystemSetupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DdnsError {
    /// Create a provider rejection error.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Short category label used as the headline of the terminal log entry.
    ///
    /// `None` means the underlying message is logged on its own.
    pub fn headline(&self) -> Option<&'static str> {
        match self {
            DdnsError::DiscoveryUnreachable(_) => Some("Connection Error"),
            DdnsError::DiscoveryMalformed(_) => Some("Service Error"),
            DdnsError::ProviderRejected { .. } => Some("Route53 Exception"),
            DdnsError::CredentialsInvalid(_) => Some("Credentials Exception"),
            DdnsError::ProviderUnexpected(_)
            | DdnsError::Config(_)
            | DdnsError::FilesystemSetupFailed { .. }
            | DdnsError::Io(_) => None,
        }
    }

    /// The underlying message without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            DdnsError::Config(msg)
            | DdnsError::DiscoveryUnreachable(msg)
            | DdnsError::CredentialsInvalid(msg)
            | DdnsError::ProviderUnexpected(msg) => msg.clone(),
            DdnsError::DiscoveryMalformed(body) => format!("unexpected response {:?}", body),
            DdnsError::ProviderRejected { code, message } => format!("{}: {}", code, message),
            DdnsError::FilesystemSetupFailed { .. } | DdnsError::Io(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headlines() {
        assert_eq!(
            DdnsError::DiscoveryUnreachable("refused".into()).headline(),
            Some("Connection Error")
        );
        assert_eq!(
            DdnsError::DiscoveryMalformed("abc".into()).headline(),
            Some("Service Error")
        );
        assert_eq!(
            DdnsError::rejected("InvalidChangeBatch", "bad").headline(),
            Some("Route53 Exception")
        );
        assert_eq!(
            DdnsError::CredentialsInvalid("expired".into()).headline(),
            Some("Credentials Exception")
        );
        assert_eq!(DdnsError::ProviderUnexpected("boom".into()).headline(), None);
    }

    #[test]
    fn test_detail_keeps_provider_message() {
        let err = DdnsError::rejected("NoSuchHostedZone", "No hosted zone found with ID: Z1");
        assert_eq!(err.detail(), "NoSuchHostedZone: No hosted zone found with ID: Z1");
    }

    #[test]
    fn test_filesystem_error_names_directory() {
        let err = DdnsError::FilesystemSetupFailed {
            path: PathBuf::from("/srv/ddns/cache"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Directory \"/srv/ddns/cache\" was not created"));
    }
}
