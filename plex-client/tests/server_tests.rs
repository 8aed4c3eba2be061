//! HTTP-level tests for the Plex client against a mock server

use mockito::{Matcher, Server, ServerGuard};
use rstest::rstest;

use plex_client::{
    ClientOptions, Device, MediaKind, MediaServer, PlaybackCommand, PlexError, PlexServer, PlexTv,
};

const ROOT: &str = r#"{"MediaContainer": {
    "size": 0,
    "friendlyName": "Basement",
    "machineIdentifier": "srv-1",
    "version": "1.40.0"
}}"#;

const SESSIONS: &str = r#"{"MediaContainer": {"size": 2, "Metadata": [
    {
        "sessionKey": "12",
        "type": "episode",
        "title": "Pilot",
        "grandparentTitle": "Show",
        "parentTitle": "Season 2",
        "parentIndex": 2,
        "index": 5,
        "duration": 1800000,
        "viewOffset": 900000,
        "thumb": "/library/metadata/100/thumb/1",
        "User": {"id": "1", "title": "alice"},
        "Player": {
            "address": "10.0.0.20",
            "machineIdentifier": "tv-1",
            "title": "Living Room",
            "platform": "Android",
            "product": "Plex for Android (TV)",
            "device": "SHIELD",
            "state": "playing"
        }
    },
    {
        "sessionKey": 13,
        "type": "track",
        "title": "Song",
        "Player": {"machineIdentifier": "phone-1", "title": "Phone", "state": "paused"}
    }
]}}"#;

const CLIENTS: &str = r#"{"MediaContainer": {"size": 1, "Server": [
    {
        "name": "Living Room",
        "host": "10.0.0.20",
        "address": "10.0.0.20",
        "port": 32500,
        "machineIdentifier": "tv-1",
        "product": "Plex for Android (TV)",
        "protocolCapabilities": "timeline,playback,navigation"
    }
]}}"#;

fn options_for(server: &ServerGuard) -> ClientOptions {
    ClientOptions {
        client_identifier: "test-client".to_string(),
        plex_tv_url: server.url(),
        ..Default::default()
    }
}

fn connected(server: &mut ServerGuard) -> PlexServer {
    server
        .mock("GET", "/")
        .match_header("x-plex-token", "tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ROOT)
        .create();

    PlexServer::connect_with(&server.url(), "tok", options_for(server)).unwrap()
}

#[test]
fn test_connect_reads_server_identity() {
    let mut server = Server::new();
    let plex = connected(&mut server);

    assert_eq!(plex.info().friendly_name, "Basement");
    assert_eq!(plex.info().machine_identifier, "srv-1");
    assert_eq!(plex.url(), server.url().trim_end_matches('/'));
}

#[test]
fn test_connect_with_rejected_token() {
    let mut server = Server::new();
    server.mock("GET", "/").with_status(401).create();

    let result = PlexServer::connect_with(&server.url(), "bad", options_for(&server));
    assert!(matches!(result, Err(PlexError::Unauthorized)));
}

#[test]
fn test_connect_to_unreachable_host_is_transport_error() {
    let result = PlexServer::connect_with("http://127.0.0.1:1", "tok", ClientOptions::default());
    let err = result.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {:?}", err);
}

#[test]
fn test_sessions_are_decoded() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/status/sessions")
        .with_status(200)
        .with_body(SESSIONS)
        .create();

    let sessions = plex.sessions().unwrap();
    assert_eq!(sessions.len(), 2);

    let episode = &sessions[0];
    assert_eq!(episode.session_key, "12");
    assert_eq!(episode.kind, MediaKind::Episode);
    assert_eq!(episode.grandparent_title.as_deref(), Some("Show"));
    assert_eq!(episode.parent_index, Some(2));
    assert_eq!(episode.index, Some(5));
    assert_eq!(episode.duration, Some(1_800_000));
    assert_eq!(episode.view_offset, Some(900_000));
    assert_eq!(episode.player.machine_identifier, "tv-1");
    assert_eq!(episode.player.state, "playing");
    assert_eq!(episode.usernames(), vec!["alice"]);
    assert_eq!(
        episode.thumb_url,
        Some(format!("{}/library/metadata/100/thumb/1?X-Plex-Token=tok", server.url()))
    );

    let track = &sessions[1];
    assert_eq!(track.session_key, "13");
    assert_eq!(track.kind, MediaKind::Track);
    assert!(track.thumb_url.is_none());
    assert!(track.user.is_none());
}

#[test]
fn test_empty_sessions_container() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/status/sessions")
        .with_status(200)
        .with_body(r#"{"MediaContainer": {"size": 0}}"#)
        .create();

    assert!(plex.sessions().unwrap().is_empty());
}

#[test]
fn test_malformed_sessions_body_is_parse_error() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/status/sessions")
        .with_status(200)
        .with_body("<MediaContainer/>")
        .create();

    assert!(matches!(plex.sessions(), Err(PlexError::Parse(_))));
}

#[test]
fn test_clients_are_decoded() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/clients")
        .with_status(200)
        .with_body(CLIENTS)
        .create();

    let clients = plex.clients().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].title, "Living Room");
    assert_eq!(clients[0].base_url().as_deref(), Some("http://10.0.0.20:32500"));
    assert!(clients[0].supports("playback"));
}

#[rstest]
#[case(PlaybackCommand::Play, "/player/playback/play", "type", "video")]
#[case(PlaybackCommand::Pause, "/player/playback/pause", "type", "video")]
#[case(PlaybackCommand::SkipPrevious, "/player/playback/skipPrevious", "type", "video")]
#[case(PlaybackCommand::SetVolume(50), "/player/playback/setParameters", "volume", "50")]
#[case(PlaybackCommand::SeekTo { offset_ms: 900_000 }, "/player/playback/seekTo", "offset", "900000")]
fn test_send_command(
    #[case] command: PlaybackCommand,
    #[case] path: &str,
    #[case] param: &str,
    #[case] value: &str,
) {
    let mut server = Server::new();
    let plex = connected(&mut server);
    let mock = server
        .mock("GET", path)
        .match_header("x-plex-target-client-identifier", "tv-1")
        .match_header("x-plex-token", "tok")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded(param.to_string(), value.to_string()),
            Matcher::UrlEncoded("commandID".to_string(), "1".to_string()),
        ]))
        .with_status(200)
        .create();

    let client = plex_client::Client::new("tv-1", "Living Room", server.url());
    plex.send(&client, command).unwrap();
    mock.assert();
}

#[test]
fn test_command_ids_increase() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    let first = server
        .mock("GET", "/player/playback/stop")
        .match_query(Matcher::UrlEncoded("commandID".to_string(), "1".to_string()))
        .with_status(200)
        .create();
    let second = server
        .mock("GET", "/player/playback/stop")
        .match_query(Matcher::UrlEncoded("commandID".to_string(), "2".to_string()))
        .with_status(200)
        .create();

    let client = plex_client::Client::new("tv-1", "Living Room", server.url());
    plex.send(&client, PlaybackCommand::Stop).unwrap();
    plex.send(&client, PlaybackCommand::Stop).unwrap();
    first.assert();
    second.assert();
}

#[test]
fn test_volume_above_range_is_rejected() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    let client = plex_client::Client::new("tv-1", "Living Room", server.url());

    let result = plex.send(&client, PlaybackCommand::SetVolume(101));
    assert!(matches!(result, Err(PlexError::InvalidParameter(_))));
}

#[test]
fn test_connect_device_uses_first_reachable_connection() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/resources")
        .match_header("x-plex-token", "device-token")
        .with_status(200)
        .create();

    let device: Device = serde_json::from_value(serde_json::json!({
        "name": "Bedroom",
        "clientIdentifier": "bed-1",
        "provides": "client,player",
        "accessToken": "device-token",
        "connections": [
            {"uri": "http://127.0.0.1:1", "local": false, "relay": true},
            {"uri": server.url(), "local": true, "relay": false}
        ]
    }))
    .unwrap();

    let client = plex.connect_device(&device).unwrap();
    assert_eq!(client.machine_identifier, "bed-1");
    assert_eq!(client.base_url(), Some(server.url()));
}

#[test]
fn test_connect_device_without_client_capability() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    let device = Device {
        name: "NAS".to_string(),
        client_identifier: "nas".to_string(),
        provides: "server".to_string(),
        ..Default::default()
    };

    assert!(matches!(
        plex.connect_device(&device),
        Err(PlexError::NotControllable(_))
    ));
}

#[test]
fn test_account_devices() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server
        .mock("GET", "/api/v2/user")
        .with_status(200)
        .with_body(r#"{"id": 1, "uuid": "u-1", "username": "alice"}"#)
        .create();
    server
        .mock("GET", "/api/v2/resources")
        .match_query(Matcher::UrlEncoded("includeHttps".to_string(), "1".to_string()))
        .with_status(200)
        .with_body(
            r#"[
                {"name": "Bedroom", "clientIdentifier": "bed-1", "provides": "client,player", "connections": []},
                {"name": "Basement", "clientIdentifier": "srv-1", "provides": "server", "connections": []}
            ]"#,
        )
        .create();

    let devices = MediaServer::account_devices(&plex).unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices[0].has_capability("client"));
    assert!(!devices[1].has_capability("client"));
}

#[test]
fn test_unlinked_account() {
    let mut server = Server::new();
    let plex = connected(&mut server);
    server.mock("GET", "/api/v2/user").with_status(401).create();

    assert!(matches!(plex.account(), Err(PlexError::NotLinked(_))));
}

#[test]
fn test_pin_round_trip() {
    let mut server = Server::new();
    server
        .mock("POST", "/api/v2/pins")
        .match_header("x-plex-client-identifier", "test-client")
        .with_status(201)
        .with_body(r#"{"id": 42, "code": "ABCD", "authToken": null}"#)
        .create();
    server
        .mock("GET", "/api/v2/pins/42")
        .with_status(200)
        .with_body(r#"{"id": 42, "code": "ABCD", "authToken": "account-token"}"#)
        .create();

    let plex_tv = PlexTv::new(options_for(&server));
    let pin = plex_tv.request_pin().unwrap();
    assert_eq!(pin.code, "ABCD");
    assert_eq!(plex_tv.check_pin(&pin).unwrap().as_deref(), Some("account-token"));
}

#[test]
fn test_pin_not_yet_linked() {
    let mut server = Server::new();
    server
        .mock("GET", "/api/v2/pins/7")
        .with_status(200)
        .with_body(r#"{"id": 7, "code": "WXYZ", "authToken": null}"#)
        .create();

    let plex_tv = PlexTv::new(options_for(&server));
    let pin = plex_client::Pin { id: 7, code: "WXYZ".to_string(), auth_token: None };
    assert_eq!(plex_tv.check_pin(&pin).unwrap(), None);
}
