//! Route 53 record updates over the REST API.

mod sigv4;
#[cfg(test)]
mod tests;

use crate::config::{AwsConfig, RecordTarget};
use crate::detector::PublicAddress;
use crate::error::{DdnsError, Result};
use serde::Deserialize;

const API_VERSION: &str = "2013-04-01";
const SERVICE: &str = "route53";
const CONTENT_TYPE: &str = "application/xml";
const CHANGE_COMMENT: &str = "Dynamic DNS";

/// AWS error codes that mean the credentials themselves were not accepted.
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "IncompleteSignature",
    "MissingAuthenticationToken",
    "ExpiredToken",
    "UnrecognizedClientException",
    "InvalidSignatureException",
];

/// Static key pair plus optional session token.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    fn check(&self) -> Result<()> {
        if self.access_key.trim().is_empty() || self.secret_key.trim().is_empty() {
            return Err(DdnsError::CredentialsInvalid(
                "access key and secret key must both be provided".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Outcome of an accepted change batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeInfo {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct ChangeResponse {
    #[serde(rename = "ChangeInfo")]
    change_info: ChangeInfo,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Error")]
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct InvalidChangeBatch {
    #[serde(rename = "Messages")]
    messages: Messages,
}

#[derive(Debug, Deserialize)]
struct Messages {
    #[serde(rename = "Message", default)]
    message: Vec<String>,
}

/// Resolve the API endpoint and signing region for a configured region.
///
/// Route 53 is a global service with one endpoint per partition.
pub fn partition_endpoint(region: &str) -> (&'static str, &'static str) {
    if region.starts_with("cn-") {
        ("https://route53.amazonaws.com.cn", "cn-northwest-1")
    } else if region.starts_with("us-gov-") {
        ("https://route53.us-gov.amazonaws.com", "us-gov-west-1")
    } else {
        ("https://route53.amazonaws.com", "us-east-1")
    }
}

/// Route 53 API client.
pub struct Route53Client {
    client: reqwest::Client,
    credentials: Credentials,
    signing_region: String,
    base_url: String,
}

impl Route53Client {
    /// Create a client from AWS settings.
    pub fn new(aws: &AwsConfig) -> Self {
        let (endpoint, signing_region) = partition_endpoint(&aws.region);
        let credentials = Credentials::new(aws.access_key.clone(), aws.secret_key.clone())
            .with_session_token(aws.session_token.clone());
        let base_url = aws
            .endpoint_url
            .clone()
            .unwrap_or_else(|| endpoint.to_string());

        Self::with_base_url(credentials, signing_region.to_string(), base_url)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(credentials: Credentials, signing_region: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            signing_region,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// UPSERT the target's `A` record so it holds exactly `address`.
    pub async fn upsert_a_record(
        &self,
        target: &RecordTarget,
        address: &PublicAddress,
    ) -> Result<ChangeInfo> {
        self.credentials.check()?;

        let path = format!(
            "/{}/hostedzone/{}/rrset/",
            API_VERSION,
            sigv4::uri_encode(&target.zone_id)
        );
        let url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| DdnsError::ProviderUnexpected(format!("invalid endpoint: {}", e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(DdnsError::ProviderUnexpected(format!(
                    "endpoint {} has no host",
                    self.base_url
                )))
            }
        };

        let body = change_batch_xml(target, address);
        let signed = sigv4::sign(
            &sigv4::SigningParams {
                access_key: &self.credentials.access_key,
                secret_key: &self.credentials.secret_key,
                session_token: self.credentials.session_token.as_deref(),
                region: &self.signing_region,
                service: SERVICE,
                time: chrono::Utc::now(),
            },
            &sigv4::SignableRequest {
                method: "POST",
                host: &host,
                path: url.path(),
                content_type: CONTENT_TYPE,
                payload: body.as_bytes(),
            },
        );

        tracing::debug!(
            zone = %target.zone_id,
            record = %target.record_name,
            "Submitting UPSERT {} {} -> {}",
            target.record_type(),
            target.record_name,
            address
        );

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| DdnsError::ProviderUnexpected(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DdnsError::ProviderUnexpected(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        let parsed: ChangeResponse = serde_xml_rs::from_str(&text).map_err(|e| {
            DdnsError::ProviderUnexpected(format!("unreadable change response: {}", e))
        })?;

        tracing::debug!(
            change = %parsed.change_info.id,
            status = %parsed.change_info.status,
            "Change accepted"
        );
        Ok(parsed.change_info)
    }
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> DdnsError {
    if let Ok(response) = serde_xml_rs::from_str::<ErrorResponse>(body) {
        let ErrorBody { code, message } = response.error;
        if CREDENTIAL_ERROR_CODES.contains(&code.as_str()) {
            return DdnsError::CredentialsInvalid(format!("{}: {}", code, message));
        }
        return DdnsError::rejected(code, message);
    }

    if let Ok(batch) = serde_xml_rs::from_str::<InvalidChangeBatch>(body) {
        return DdnsError::rejected("InvalidChangeBatch", batch.messages.message.join("; "));
    }

    DdnsError::ProviderUnexpected(format!("HTTP {}: {}", status, body.trim()))
}

fn change_batch_xml(target: &RecordTarget, address: &PublicAddress) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<ChangeResourceRecordSetsRequest xmlns="https://route53.amazonaws.com/doc/2013-04-01/">"#,
            "<ChangeBatch>",
            "<Comment>{comment}</Comment>",
            "<Changes><Change>",
            "<Action>UPSERT</Action>",
            "<ResourceRecordSet>",
            "<Name>{name}</Name>",
            "<Type>{record_type}</Type>",
            "<TTL>{ttl}</TTL>",
            "<ResourceRecords><ResourceRecord><Value>{value}</Value></ResourceRecord></ResourceRecords>",
            "</ResourceRecordSet>",
            "</Change></Changes>",
            "</ChangeBatch>",
            "</ChangeResourceRecordSetsRequest>"
        ),
        comment = CHANGE_COMMENT,
        name = xml_escape(&target.record_name),
        record_type = target.record_type(),
        ttl = target.ttl(),
        value = xml_escape(address.as_str()),
    )
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
