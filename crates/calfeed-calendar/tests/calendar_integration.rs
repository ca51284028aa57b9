//! Integration tests for the calendar feeds using wiremock.
//!
//! Each test points a [`Service`] at a mock server that serves the Atom
//! feeds under `/calendar`.

use calfeed_calendar::acl::{NO_ROLE, READ_ROLE};
use calfeed_calendar::{Calendar, CalendarAttributes, CalendarError, EmbedOptions, Scope, Service, ServiceConfig};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWN_CALENDARS: &str = "/calendar/feeds/default/owncalendars/full";
const ALL_CALENDARS: &str = "/calendar/feeds/default/allcalendars/full";

/// Service against the mock server with ACL checks switched off.
fn service(server: &MockServer) -> Service {
    let config = ServiceConfig {
        base_url: format!("{}/calendar", server.uri()),
        check_public: false,
    };
    Service::new(config, "secret-token")
}

/// Service that also reads each calendar's ACL feed.
fn checking_service(server: &MockServer) -> Service {
    Service::new(
        ServiceConfig::with_base_url(format!("{}/calendar", server.uri())),
        "secret-token",
    )
}

/// Helper to create a calendar entry
fn calendar_entry(server: &MockServer, id: &str, title: &str, summary: &str) -> String {
    format!(
        r##"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gCal="http://schemas.google.com/gCal/2005" xmlns:gd="http://schemas.google.com/g/2005">
  <id>http://www.google.com/calendar/feeds/default/calendars/{id}</id>
  <title type="text">{title}</title>
  <summary type="text">{summary}</summary>
  <link rel="edit" type="application/atom+xml" href="{uri}{own}/{id}"/>
  <gCal:timezone value="America/New_York"/>
  <gCal:hidden value="false"/>
  <gCal:color value="#0D7813"/>
  <gCal:selected value="true"/>
  <gd:where valueString=""/>
</entry>"##,
        id = id,
        title = title,
        summary = summary,
        uri = server.uri(),
        own = OWN_CALENDARS,
    )
}

fn feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gCal="http://schemas.google.com/gCal/2005" xmlns:gd="http://schemas.google.com/g/2005">
  <title>Calendars</title>
  {}
</feed>"#,
        entries.join("\n")
    )
}

fn acl_feed(role: &str) -> String {
    format!(
        r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gAcl="http://schemas.google.com/acl/2007">
  <entry>
    <gAcl:scope type="user" value="owner@example.com"/>
    <gAcl:role value="http://schemas.google.com/gCal/2005#owner"/>
  </entry>
  <entry>
    <gAcl:scope type="default"/>
    <gAcl:role value="{}"/>
  </entry>
</feed>"#,
        role
    )
}

fn atom(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/atom+xml")
        .set_body_string(body)
}

async fn mount_listing(server: &MockServer, entries: &[String]) {
    Mock::given(method("GET"))
        .and(path(OWN_CALENDARS))
        .respond_with(atom(feed(entries)))
        .mount(server)
        .await;
}

async fn load_team(server: &MockServer, service: &Service) -> Calendar {
    let mut calendar = Calendar::new(service);
    calendar
        .load(&calendar_entry(server, "team", "Soccer Team", "Weekend games"))
        .await
        .unwrap();
    calendar
}

#[tokio::test]
async fn test_list_calendars() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[
            calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games"),
            calendar_entry(&mock_server, "work", "Work", "Meetings"),
        ],
    )
    .await;

    let service = service(&mock_server);
    let calendars = service.calendars().await.unwrap();

    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].id(), Some("team"));
    assert_eq!(calendars[0].title(), Some("Soccer Team"));
    assert_eq!(calendars[0].timezone(), Some("America/New_York"));
    assert!(calendars[0].exists());
    assert_eq!(calendars[1].id(), Some("work"));
    assert_eq!(
        calendars[1].event_feed(),
        Some(format!("{}/calendar/feeds/work/private/full", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_requests_carry_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(OWN_CALENDARS))
        .and(header("authorization", "GoogleLogin auth=secret-token"))
        .respond_with(atom(feed(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let calendars = service(&mock_server).calendars().await.unwrap();
    assert!(calendars.is_empty());
}

#[tokio::test]
async fn test_listing_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(OWN_CALENDARS))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = service(&mock_server).calendars().await;
    let err = result.unwrap_err();
    assert!(matches!(err, CalendarError::TokenExpired));
    assert!(err.should_refresh_token());
}

#[tokio::test]
async fn test_find_by_title_and_summary() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[
            calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games"),
            calendar_entry(&mock_server, "work", "Work", "Meetings"),
            calendar_entry(&mock_server, "kids", "Kids", "soccer practice"),
        ],
    )
    .await;
    let service = service(&mock_server);

    let all = Calendar::find(&service, Some("Soccer"), Scope::All).await.unwrap();
    let ids: Vec<_> = all.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![Some("team"), Some("kids")]);

    let first = Calendar::find(&service, Some("Soccer"), Scope::First).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id(), Some("team"));

    let none = Calendar::find(&service, Some("Chess"), Scope::All).await.unwrap();
    assert!(none.is_empty());
    assert!(Calendar::find_first(&service, "Chess").await.unwrap().is_none());
}

#[tokio::test]
async fn test_listing_skips_entries_without_id() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[
            calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games"),
            "<entry><title>Orphan</title></entry>".to_string(),
            calendar_entry(&mock_server, "work", "Work", "Meetings"),
        ],
    )
    .await;
    let service = service(&mock_server);

    let calendars = service.calendars().await.unwrap();
    let ids: Vec<_> = calendars.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![Some("team"), Some("work")]);

    let found = Calendar::find(&service, Some("soccer"), Scope::All).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some("team"));

    let mut calendar = load_team(&mock_server, &service).await;
    assert!(calendar.reload().await.unwrap());
}

#[tokio::test]
async fn test_find_exact_id_wins() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[
            calendar_entry(&mock_server, "work", "Work", "Meetings"),
            calendar_entry(&mock_server, "team", "Work Soccer", "work league"),
        ],
    )
    .await;
    let service = service(&mock_server);

    let found = Calendar::find(&service, Some("team"), Scope::All).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title(), Some("Work Soccer"));

    let by_id = Calendar::find_by_id(&service, "work").await.unwrap().unwrap();
    assert_eq!(by_id.title(), Some("Work"));
    assert!(Calendar::find_by_id(&service, "wor").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_from_all_calendars() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/team", ALL_CALENDARS)))
        .respond_with(atom(calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games")))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let calendar = Calendar::get(&service, "team").await.unwrap().unwrap();
    assert_eq!(calendar.title(), Some("Soccer Team"));

    assert!(Calendar::get(&service, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_query_all_calendars() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ALL_CALENDARS))
        .and(query_param("q", "soccer team"))
        .respond_with(atom(feed(&[calendar_entry(
            &mock_server,
            "team",
            "Soccer Team",
            "Weekend games",
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let found = Calendar::query(&service(&mock_server), "soccer team").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some("team"));
}

#[tokio::test]
async fn test_save_creates_calendar() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(OWN_CALENDARS))
        .and(header("content-type", "application/atom+xml"))
        .and(body_string_contains("Book Club"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(calendar_entry(&mock_server, "club", "Book Club", "Monthly")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let attributes = CalendarAttributes {
        title: Some("Book Club".to_string()),
        summary: Some("Monthly".to_string()),
        ..CalendarAttributes::default()
    };
    let mut calendar = Calendar::with_attributes(&service, attributes);

    assert!(calendar.save().await.unwrap());
    assert!(calendar.exists());
    assert_eq!(calendar.id(), Some("club"));
    assert!(calendar.edit_feed().unwrap().ends_with("/owncalendars/full/club"));
    assert!(calendar.event_feed().is_some());
}

#[tokio::test]
async fn test_save_create_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(OWN_CALENDARS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut calendar = Calendar::new(&service(&mock_server));
    calendar.set_title("Doomed");

    let result = calendar.save().await;
    assert!(matches!(result, Err(CalendarError::SaveFailed(_))));
    assert!(!calendar.exists());
    assert!(calendar.id().is_none());
}

#[tokio::test]
async fn test_save_create_with_unreadable_response_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(OWN_CALENDARS))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>oops"))
        .mount(&mock_server)
        .await;

    let mut calendar = Calendar::new(&service(&mock_server));
    let result = calendar.save().await;
    assert!(matches!(result, Err(CalendarError::SaveFailed(_))));
    assert!(!calendar.exists());
}

#[tokio::test]
async fn test_save_updates_existing_calendar() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/team", OWN_CALENDARS)))
        .and(body_string_contains("Renamed Team"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;
    calendar.set_title("Renamed Team");

    assert!(calendar.save().await.unwrap());
    assert_eq!(calendar.title(), Some("Renamed Team"));
}

#[tokio::test]
async fn test_save_update_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/team", OWN_CALENDARS)))
        .respond_with(ResponseTemplate::new(409))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;

    assert!(!calendar.save().await.unwrap());
    assert!(calendar.exists());
}

#[tokio::test]
async fn test_delete_clears_calendar() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/team", OWN_CALENDARS)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;

    assert!(calendar.delete().await.unwrap());
    assert!(!calendar.exists());
    assert!(calendar.id().is_none());
    assert!(calendar.title().is_none());
    assert!(calendar.event_feed().is_none());
    assert!(!calendar.is_public());
}

#[tokio::test]
async fn test_delete_rejected_leaves_calendar() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/team", OWN_CALENDARS)))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;

    assert!(!calendar.delete().await.unwrap());
    assert!(calendar.exists());
    assert_eq!(calendar.id(), Some("team"));
    assert_eq!(calendar.title(), Some("Soccer Team"));
}

#[tokio::test]
async fn test_load_reads_public_acl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/acl/full"))
        .respond_with(atom(acl_feed(READ_ROLE)))
        .mount(&mock_server)
        .await;

    let service = checking_service(&mock_server);
    let calendar = load_team(&mock_server, &service).await;

    assert!(calendar.is_public());
    assert!(calendar.is_editable());
}

#[tokio::test]
async fn test_load_reads_private_acl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/acl/full"))
        .respond_with(atom(acl_feed(NO_ROLE)))
        .mount(&mock_server)
        .await;

    let service = checking_service(&mock_server);
    let calendar = load_team(&mock_server, &service).await;

    assert!(!calendar.is_public());
    assert!(calendar.is_editable());
}

#[tokio::test]
async fn test_forbidden_acl_marks_calendar_read_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/acl/full"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let service = checking_service(&mock_server);
    let calendar = load_team(&mock_server, &service).await;

    assert!(calendar.exists());
    assert!(!calendar.is_public());
    assert!(!calendar.is_editable());
}

#[tokio::test]
async fn test_acl_without_default_rule_keeps_public_flag() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games")],
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/acl/full"))
        .respond_with(atom(acl_feed(READ_ROLE)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/acl/full"))
        .respond_with(atom(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gAcl="http://schemas.google.com/acl/2007">
  <entry>
    <gAcl:scope type="user" value="owner@example.com"/>
    <gAcl:role value="http://schemas.google.com/gCal/2005#owner"/>
  </entry>
</feed>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let service = checking_service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;
    assert!(calendar.is_public());

    assert!(calendar.reload().await.unwrap());
    assert!(calendar.is_public());
    assert!(calendar.is_editable());
}

#[tokio::test]
async fn test_unreachable_acl_feed_does_not_fail_load() {
    let mock_server = MockServer::start().await;
    let entry = calendar_entry(&mock_server, "team", "Soccer Team", "Weekend games");

    // nothing listens on port 1
    let service = Service::new(
        ServiceConfig::with_base_url("http://127.0.0.1:1/calendar"),
        "secret-token",
    );
    let mut calendar = Calendar::new(&service);

    calendar.load(&entry).await.unwrap();
    assert!(calendar.exists());
    assert_eq!(calendar.id(), Some("team"));
    assert!(!calendar.is_public());
    assert!(!calendar.is_editable());
}

#[tokio::test]
async fn test_set_public_writes_default_rule() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/calendar/feeds/team/acl/full/default"))
        .and(body_string_contains(READ_ROLE))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;

    assert!(calendar.set_public(true).await.unwrap());
    assert!(calendar.is_public());
    // already public, still written
    assert!(calendar.set_public(true).await.unwrap());
}

#[tokio::test]
async fn test_set_public_rejected_keeps_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/calendar/feeds/team/acl/full/default"))
        .and(body_string_contains("value=\"none\""))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/calendar/feeds/team/acl/full/default"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;
    assert!(calendar.set_public(true).await.unwrap());

    assert!(!calendar.set_public(false).await.unwrap());
    assert!(calendar.is_public());
}

#[tokio::test]
async fn test_events_skip_malformed_entries() {
    let mock_server = MockServer::start().await;

    let events = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005">
  <entry>
    <id>http://www.google.com/calendar/feeds/team/private/full/evt1</id>
    <title type="text">Practice</title>
    <gd:when startTime="2024-03-02T09:00:00.000Z" endTime="2024-03-02T10:00:00.000Z"/>
  </entry>
  <entry>
    <title type="text">No id here</title>
  </entry>
  <entry>
    <id>http://www.google.com/calendar/feeds/team/private/full/evt3</id>
    <title type="text">Tournament</title>
    <gd:when startTime="2024-03-09" endTime="2024-03-10"/>
  </entry>
</feed>"#;

    Mock::given(method("GET"))
        .and(path("/calendar/feeds/team/private/full"))
        .respond_with(atom(events.to_string()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);
    let calendar = load_team(&mock_server, &service).await;

    let feed = calendar.events().await.unwrap();
    assert!(!feed.is_complete());
    assert_eq!(feed.skipped.len(), 1);
    assert_eq!(feed.skipped[0].index, 1);

    let titles: Vec<_> = feed.events.iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec![Some("Practice"), Some("Tournament")]);
    assert!(feed.events[1].all_day());
    assert_eq!(feed.events[0].calendar_id(), Some("team"));

    // not cached
    let again = calendar.events().await.unwrap();
    assert_eq!(again.events.len(), 2);
}

#[tokio::test]
async fn test_events_require_saved_calendar() {
    let mock_server = MockServer::start().await;
    let calendar = Calendar::new(&service(&mock_server));

    let result = calendar.events().await;
    assert!(matches!(result, Err(CalendarError::MissingId)));
}

#[tokio::test]
async fn test_reload_picks_up_remote_changes() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[calendar_entry(&mock_server, "team", "Soccer Team (renamed)", "Spring season")],
    )
    .await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;
    calendar.set_title("Local edit");

    assert!(calendar.reload().await.unwrap());
    assert_eq!(calendar.title(), Some("Soccer Team (renamed)"));
    assert_eq!(calendar.summary(), Some("Spring season"));
}

#[tokio::test]
async fn test_reload_of_vanished_calendar() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, &[calendar_entry(&mock_server, "work", "Work", "Meetings")]).await;

    let service = service(&mock_server);
    let mut calendar = load_team(&mock_server, &service).await;

    assert!(!calendar.reload().await.unwrap());
    assert_eq!(calendar.title(), Some("Soccer Team"));
}

#[tokio::test]
async fn test_iframe_for_loaded_calendar() {
    let mock_server = MockServer::start().await;
    let service = service(&mock_server);
    let calendar = load_team(&mock_server, &service).await;

    let options = EmbedOptions::default().merge([("mode", "MONTH")]);
    let iframe = calendar.to_iframe(&options).unwrap();

    assert!(iframe.contains(&format!("{}/calendar/embed?src=team&amp;mode=MONTH", mock_server.uri())));
}
