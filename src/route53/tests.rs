//! Route 53 client tests with HTTP mocking.

use super::{partition_endpoint, Credentials, Route53Client};
use crate::config::RecordTarget;
use crate::detector::PublicAddress;
use crate::error::DdnsError;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANGE_PATH: &str = "/2013-04-01/hostedzone/Z123/rrset/";

const ACCEPTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ChangeResourceRecordSetsResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <ChangeInfo>
    <Id>/change/C2682N5HXP0BZ4</Id>
    <Status>PENDING</Status>
    <SubmittedAt>2026-10-19T12:00:00.000Z</SubmittedAt>
    <Comment>Dynamic DNS</Comment>
  </ChangeInfo>
</ChangeResourceRecordSetsResponse>"#;

fn client(base_url: String) -> Route53Client {
    Route53Client::with_base_url(
        Credentials::new("AKIDEXAMPLE", "secret"),
        "us-east-1".to_string(),
        base_url,
    )
}

fn target() -> RecordTarget {
    RecordTarget::new("Z123", "home.example.com.")
}

fn address(raw: &str) -> PublicAddress {
    PublicAddress::parse(raw).unwrap()
}

fn aws_error(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<ErrorResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <Error><Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error>
  <RequestId>b25f48e8-84fd-11e6-80d9-574e0c4664cb</RequestId>
</ErrorResponse>"#,
        code, message
    )
}

#[tokio::test]
async fn test_upsert_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHANGE_PATH))
        .and(header("Content-Type", "application/xml"))
        .and(header_exists("Authorization"))
        .and(header_exists("X-Amz-Date"))
        .and(body_string_contains("<Action>UPSERT</Action>"))
        .and(body_string_contains("<Name>home.example.com.</Name>"))
        .and(body_string_contains("<Type>A</Type>"))
        .and(body_string_contains("<TTL>300</TTL>"))
        .and(body_string_contains("<Value>10.0.0.2</Value>"))
        .and(body_string_contains("<Comment>Dynamic DNS</Comment>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let change = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await
        .unwrap();

    assert_eq!(change.id, "/change/C2682N5HXP0BZ4");
    assert_eq!(change.status, "PENDING");
}

#[tokio::test]
async fn test_single_request_per_upsert() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED))
        .mount(&mock_server)
        .await;

    client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(body.matches("<Change>").count(), 1);
    assert_eq!(body.matches("<ResourceRecord>").count(), 1);
}

#[tokio::test]
async fn test_session_token_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("X-Amz-Security-Token", "session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Route53Client::with_base_url(
        Credentials::new("AKIDEXAMPLE", "secret")
            .with_session_token(Some("session-token".to_string())),
        "us-east-1".to_string(),
        mock_server.uri(),
    );

    client
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_change_batch_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHANGE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"<?xml version="1.0"?>
<InvalidChangeBatch xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <Messages><Message>RRSet with DNS name home.example.com. is not permitted in zone example.org.</Message></Messages>
  <RequestId>3a1c5e2f-0000-0000-0000-000000000000</RequestId>
</InvalidChangeBatch>"#,
        ))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await;

    match result {
        Err(DdnsError::ProviderRejected { code, message }) => {
            assert_eq!(code, "InvalidChangeBatch");
            assert!(message.contains("is not permitted in zone"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_zone_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(aws_error("NoSuchHostedZone", "No hosted zone found with ID: Z123")),
        )
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await;

    match result {
        Err(DdnsError::ProviderRejected { code, .. }) => assert_eq!(code, "NoSuchHostedZone"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string(aws_error(
            "InvalidClientTokenId",
            "The security token included in the request is invalid.",
        )))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await;

    match result {
        Err(DdnsError::CredentialsInvalid(msg)) => {
            assert!(msg.contains("security token included in the request is invalid"))
        }
        other => panic!("expected credentials error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_credentials_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = Route53Client::with_base_url(
        Credentials::new("", "secret"),
        "us-east-1".to_string(),
        mock_server.uri(),
    );

    let result = client.upsert_a_record(&target(), &address("10.0.0.2")).await;

    assert!(matches!(result, Err(DdnsError::CredentialsInvalid(_))));
}

#[tokio::test]
async fn test_unparsable_failure_is_unexpected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await;

    assert!(matches!(result, Err(DdnsError::ProviderUnexpected(_))));
}

#[tokio::test]
async fn test_unreadable_success_is_unexpected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .upsert_a_record(&target(), &address("10.0.0.2"))
        .await;

    assert!(matches!(result, Err(DdnsError::ProviderUnexpected(_))));
}

#[test]
fn test_partition_endpoints() {
    assert_eq!(
        partition_endpoint("eu-west-1"),
        ("https://route53.amazonaws.com", "us-east-1")
    );
    assert_eq!(
        partition_endpoint("cn-north-1"),
        ("https://route53.amazonaws.com.cn", "cn-northwest-1")
    );
    assert_eq!(
        partition_endpoint("us-gov-east-1"),
        ("https://route53.us-gov.amazonaws.com", "us-gov-west-1")
    );
}

#[test]
fn test_change_batch_escapes_name() {
    let body = super::change_batch_xml(
        &RecordTarget::new("Z123", "a&b.example.com."),
        &address("1.2.3.4"),
    );
    assert!(body.contains("<Name>a&amp;b.example.com.</Name>"));
    assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
}
