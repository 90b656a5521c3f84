//! Integration tests for niceday-client.
//!
//! Uses wiremock to mock HTTP responses from niceday-api.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{NaiveDate, TimeZone, Utc};
use niceday_client::{
    ClientConfig, Error, Frequency, NicedayClient, RecurrenceRule, ReminderMargin, Tracker,
    TrackerStatus, USER_PROFILE_KEYS, total_quantity,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// FIXTURES
// =============================================================================

fn mock_user_data() -> Value {
    json!({
        "id": 12345,
        "networks": [{
            "networkMemberId": 123456,
            "networkId": 112233,
            "role": "patient",
            "createdAt": "2021-04-28T10:53:44.438Z",
            "isActive": true,
            "deletedAt": null,
            "deletedBy": null
        }],
        "userProfile": {
            "firstName": "Test",
            "lastName": "McTesterson",
            "bio": "",
            "location": "Pyteststad",
            "birthDate": "1894-01-22",
            "gender": "MALE",
            "image": null,
            "preferredLanguage": "en",
            "settings": {"app": {"version": 1, "settings": {"appOpenedCount": 10}}}
        },
        "user": {
            "username": "test.test@test.nl",
            "email": "test.test@test.nl",
            "isActive": true,
            "dateJoined": "2020-05-13T18:49:12.025Z",
            "isPublic": true,
            "hashId": "testtesttest",
            "id": 12345
        }
    })
}

async fn client_for(server: &MockServer) -> NicedayClient {
    NicedayClient::with_config(&ClientConfig::new(server.uri())).unwrap()
}

// =============================================================================
// PROFILE
// =============================================================================

#[tokio::test]
async fn test_get_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_user_data()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let profile = client.get_profile(12345).await.unwrap();

    for key in USER_PROFILE_KEYS {
        assert!(profile.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(profile.first_name.as_deref(), Some("Test"));
    assert_eq!(profile.gender.as_deref(), Some("MALE"));

    let as_json = serde_json::to_value(&profile).unwrap();
    assert!(as_json.get("id").is_none());
    assert!(as_json.get("userProfile").is_none());
}

#[tokio::test]
async fn test_user_data_keeps_everything() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_user_data()))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let data = client.user_data(12345).await.unwrap();

    assert_eq!(data.id, Some(json!(12345)));
    assert_eq!(
        data.networks.as_ref().and_then(Value::as_array).map(Vec::len),
        Some(1)
    );
    assert_eq!(data.user.as_ref().unwrap()["username"], "test.test@test.nl");
    assert_eq!(
        data.user_profile.as_ref().unwrap()["preferredLanguage"],
        "en"
    );
}

#[tokio::test]
async fn test_get_profile_with_reshaped_networks() {
    let mock_server = MockServer::start().await;

    let mut body = mock_user_data();
    body["networks"] = json!({"112233": {"role": "patient"}});
    body["user"] = json!("test.test@test.nl");
    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let profile = client.get_profile(12345).await.unwrap();
    assert_eq!(profile.last_name.as_deref(), Some("McTesterson"));

    let data = client.user_data(12345).await.unwrap();
    assert!(data.networks.unwrap().is_object());
    assert_eq!(data.user, Some(json!("test.test@test.nl")));
}

#[tokio::test]
async fn test_user_data_not_an_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([mock_user_data()])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    match client.get_profile(12345).await.unwrap_err() {
        Error::UnexpectedData(msg) => assert!(msg.contains("\"userProfile\"")),
        other => panic!("Expected UnexpectedData error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_profile_missing_user_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    match client.get_profile(1).await.unwrap_err() {
        Error::UnexpectedData(msg) => assert!(msg.contains("userProfile")),
        other => panic!("Expected UnexpectedData error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_profile_missing_key() {
    let mock_server = MockServer::start().await;
    let mut data = mock_user_data();
    data["userProfile"].as_object_mut().unwrap().remove("gender");

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    match client.get_profile(12345).await.unwrap_err() {
        Error::UnexpectedData(msg) => assert!(msg.contains("\"gender\"")),
        other => panic!("Expected UnexpectedData error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Unauthorized error",
            "details": {"body": "token expired"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    match client.get_profile(12345).await.unwrap_err() {
        Error::Server(msg) => assert_eq!(
            msg,
            "'Unauthorized error' response from niceday server. Details provided: token expired"
        ),
        other => panic!("Expected Server error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "The requested resource could not be found"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.user_data(99).await.unwrap_err();
    assert!(matches!(err, Error::Server(_)));
    assert!(err.to_string().starts_with("'The requested resource could not be found'"));
}

#[tokio::test]
async fn test_non_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.user_data(12345).await.unwrap_err();
    assert!(matches!(err, Error::NotJson));
    assert_eq!(err.to_string(), "The niceday-api did not return JSON.");
}

#[tokio::test]
async fn test_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userdata/12345"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.user_data(12345).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    match err {
        Error::Status { body, url, .. } => {
            assert_eq!(body, "boom");
            assert!(url.ends_with("/userdata/12345"));
        }
        other => panic!("Expected Status error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_niceday_api_unreachable() {
    // Nothing listens on port 1.
    let config = ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1);
    let client = NicedayClient::with_config(&config).unwrap();

    let err = client.get_profile(12345).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)), "got {:?}", err);
    assert_eq!(err.status(), None);
    assert!(err.to_string().starts_with("HTTP error:"));
}

// =============================================================================
// MESSAGES
// =============================================================================

#[tokio::test]
async fn test_post_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/"))
        .and(body_json(json!({"recipient_id": 38527, "text": "Hello world"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let ack = client.post_message(38527, "Hello world").await.unwrap();

    assert_eq!(ack.status, 200);
    assert_eq!(ack.body, Some(json!({"status": "ok"})));
}

#[tokio::test]
async fn test_post_message_empty_body_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let ack = client.post_message(1, "hi").await.unwrap();
    assert_eq!(ack.status, 204);
    assert!(ack.body.is_none());
}

#[tokio::test]
async fn test_post_blank_message_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.post_message(1, "   ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// =============================================================================
// TRACKERS
// =============================================================================

#[tokio::test]
async fn test_set_user_tracker_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usertrackers/statuses"))
        .and(body_json(json!({
            "userId": 38527,
            "trackerStatuses": [{"trackerId": 1, "isEnabled": true}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let ack = client
        .set_user_tracker_statuses(38527, &[TrackerStatus::for_tracker(Tracker::Smoking, true)])
        .await
        .unwrap();
    assert_eq!(ack.status, 200);
}

#[tokio::test]
async fn test_get_smoking_tracker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usertrackers/smoking/38527"))
        .and(query_param("startTime", "2021-10-01T01:01:01Z"))
        .and(query_param("endTime", "2022-02-10T01:01:01Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "startTime": "2021-11-01T09:00:00.000Z",
                "endTime": "2021-11-01T09:00:00.000Z",
                "value": {"quantity": 1}
            },
            {
                "startTime": "2021-11-02T09:00:00.000Z",
                "endTime": "2021-11-02T09:00:00.000Z",
                "value": {"quantity": 2}
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let entries = client
        .get_smoking_tracker(
            38527,
            Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap(),
            Utc.with_ymd_and_hms(2022, 2, 10, 1, 1, 1).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].quantity(), 1);
    assert_eq!(total_quantity(&entries), 3);
}

#[tokio::test]
async fn test_get_smoking_tracker_float_quantities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usertrackers/smoking/38527"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"startTime": "2021-11-01T09:00:00.000Z", "value": {"quantity": 1.0}},
            {"startTime": "2021-11-02T09:00:00.000Z", "value": {"quantity": 2.0}}
        ])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let entries = client
        .get_smoking_tracker(
            38527,
            Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap(),
            Utc.with_ymd_and_hms(2022, 2, 10, 1, 1, 1).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(entries[0].quantity(), 1);
    assert_eq!(total_quantity(&entries), 3);
}

#[tokio::test]
async fn test_get_smoking_tracker_rejects_reversed_range() {
    let client = NicedayClient::new("http://127.0.0.1:1");
    let err = client
        .get_smoking_tracker(
            1,
            Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// =============================================================================
// REMINDERS
// =============================================================================

fn daily_rule() -> RecurrenceRule {
    let day = |d| {
        NaiveDate::from_ymd_opt(2022, 5, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    };
    RecurrenceRule::new(Frequency::Daily, day(12)).until(day(13))
}

#[tokio::test]
async fn test_set_tracker_reminder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usertrackers/reminder"))
        .and(body_json(json!({
            "userId": "12345",
            "recurringSchedule": {
                "title": "This is a tracker",
                "schedule_type": "tracker_smoking",
                "recurring_expression": {
                    "margin": {"before": 0, "after": 60},
                    "reminder_enabled": true,
                    "reminder_margin": [{"before": 0, "after": 60}],
                    "rrule": "DTSTART:20220512T000000\nRRULE:FREQ=DAILY;UNTIL=20220513T000000"
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let ack = client
        .set_tracker_reminder(12345, Tracker::Smoking, "This is a tracker", &daily_rule())
        .await
        .unwrap();
    assert_eq!(ack.body, Some(json!({"id": "abc"})));
}

#[tokio::test]
async fn test_set_tracker_reminder_custom_margin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usertrackers/reminder"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .set_tracker_reminder_with_margin(
            12345,
            Tracker::Smoking,
            "Evening check",
            &daily_rule(),
            ReminderMargin {
                before: 15,
                after: 30,
            },
        )
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["recurringSchedule"]["recurring_expression"]["margin"],
        json!({"before": 15, "after": 30})
    );
    assert_eq!(
        body["recurringSchedule"]["recurring_expression"]["reminder_margin"],
        json!([{"before": 15, "after": 30}])
    );
}

#[tokio::test]
async fn test_set_tracker_reminder_rejects_invalid_rule() {
    let client = NicedayClient::new("http://127.0.0.1:1");
    let rule = daily_rule().interval(0);
    let err = client
        .set_tracker_reminder(1, Tracker::Smoking, "title", &rule)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = client
        .set_tracker_reminder(1, Tracker::Smoking, "", &daily_rule())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// =============================================================================
// ERROR TYPE TESTS
// =============================================================================

#[tokio::test]
async fn test_smoking_tracker_wrong_shape_is_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usertrackers/smoking/38527"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client
        .get_smoking_tracker(
            38527,
            Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap(),
            Utc.with_ymd_and_hms(2022, 2, 10, 1, 1, 1).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got {:?}", err);
    assert!(err.to_string().starts_with("JSON error: invalid type: map, expected a sequence"));
}

#[test]
fn test_error_display_status() {
    let err = Error::Status {
        status: 404,
        url: "http://localhost:8080/userdata/1".to_string(),
        body: "not found".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "HTTP status 404 from http://localhost:8080/userdata/1: not found"
    );
    let err = Error::UnexpectedData("expected key \"gender\"".to_string());
    assert_eq!(
        err.to_string(),
        "Unexpected data from niceday-api: expected key \"gender\""
    );
}
