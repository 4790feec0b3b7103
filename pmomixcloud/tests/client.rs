//! Integration tests for the Mixcloud client

use pmomixcloud::{LikedItem, MixcloudClient};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> MixcloudClient {
    MixcloudClient::builder()
        .client_id("cid")
        .api_base(server.uri())
        .api_v2_base(format!("{}/v2", server.uri()))
        .build()
        .unwrap()
}

fn track_json(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "duration": 1200,
        "user": {"username": "dj", "avatar_url": "http://img/avatar.jpg"},
        "stream_url": format!("https://stream.mixcloud.com/{}.m4a", id),
        "permalink_url": format!("https://www.mixcloud.com/dj/{}/", id)
    })
}

async fn mount_track(server: &MockServer, id: u64, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/tracks/{}.json", id)))
        .and(query_param("client_id", "cid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json(id, title)))
        .mount(server)
        .await;
}

fn sorted_names(tracks: &[pmomixcloud::Track]) -> Vec<String> {
    let mut names: Vec<String> = tracks.iter().map(|t| t.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_get_track() {
    let server = MockServer::start().await;
    mount_track(&server, 1, "One").await;

    let client = client(&server);
    let track = client.get_track("1", false).await.unwrap();

    assert_eq!(track.name, "One");
    assert_eq!(track.uri, "mixcloud:song/One.1");
    assert_eq!(track.length, 1200);
    assert_eq!(track.artists[0].name, "dj");

    let streamable = client.get_track("1", true).await.unwrap();
    assert_eq!(
        streamable.uri,
        "https://stream.mixcloud.com/1.m4a?client_id=cid"
    );
}

#[tokio::test]
async fn test_get_track_not_found_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/404.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "NotFound", "message": "gone"}
        })))
        .mount(&server)
        .await;

    assert!(client(&server).get_track("404", false).await.is_none());
}

#[tokio::test]
async fn test_get_track_malformed_json_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/7.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(client(&server).get_track("7", false).await.is_none());
}

#[tokio::test]
async fn test_get_track_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json(1, "One")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.get_track("1", false).await;
    let second = client.get_track("1", false).await;
    assert_eq!(first, second);
    assert_eq!(client.cache().stats().await.tracks_count, 1);
}

#[tokio::test]
async fn test_get_track_failures_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/9.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.get_track("9", false).await.is_none());
    assert!(client.get_track("9", false).await.is_none());
}

#[tokio::test]
async fn test_resolve_tracks_drops_missing() {
    let server = MockServer::start().await;
    mount_track(&server, 1, "One").await;
    mount_track(&server, 3, "Three").await;

    Mock::given(method("GET"))
        .and(path("/tracks/2.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tracks = client(&server).resolve_tracks(["1", "2", "3"]).await;
    assert_eq!(sorted_names(&tracks), vec!["One", "Three"]);
}

#[tokio::test]
async fn test_resolve_tracks_times_out_slow_units() {
    let server = MockServer::start().await;
    mount_track(&server, 1, "One").await;

    Mock::given(method("GET"))
        .and(path("/tracks/2.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json(2, "Slow"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = MixcloudClient::builder()
        .client_id("cid")
        .api_base(server.uri())
        .track_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let tracks = client.resolve_tracks(["1", "2"]).await;
    assert_eq!(sorted_names(&tracks), vec!["One"]);
}

#[tokio::test]
async fn test_resolve_tracks_cancelled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/1.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json(1, "One"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let tracks = client.resolve_tracks_with_cancel(["1"], &token).await;
    assert!(tracks.is_empty());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_search_sends_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks.json"))
        .and(query_param("q", "jazz mix"))
        .and(query_param("filter", "streamable"))
        .and(query_param("order", "hotness"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [track_json(1, "Jazz 1"), {"title": "no id"}, track_json(2, "Jazz 2")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = client(&server).search("jazz mix").await.unwrap();
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Jazz 1", "Jazz 2"]);
}

#[tokio::test]
async fn test_get_user_stream() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"cloudcasts": [
                    {"key": "/dj/first/", "name": "First", "user": {"name": "DJ"}},
                    {"key": "/dj/nameless/"}
                ]},
                {"title": "no cloudcasts here"},
                {"cloudcasts": [
                    {"key": "/dj/second/", "name": "Second", "audio_length": 60}
                ]}
            ]
        })))
        .mount(&server)
        .await;

    let tracks = client(&server).get_user_stream().await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].name, "First");
    assert_eq!(tracks[0].track_no, Some(1));
    assert_eq!(tracks[1].name, "Second");
    assert_eq!(tracks[1].track_no, Some(3));
    assert_eq!(tracks[1].length, 60);
}

#[tokio::test]
async fn test_get_sets_and_set() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/playlists.json"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 7, "title": "Chill", "tracks": [track_json(1, "A"), track_json(2, "B")]},
                {"title": "no id"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlists/7.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "title": "Chill", "tracks": [track_json(1, "A")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let sets = client.get_sets().await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].name, "Chill");
    assert_eq!(sets[0].id, "7");
    assert_eq!(sets[0].tracks.len(), 2);

    let tracks = client.get_set("7").await.unwrap();
    assert_eq!(tracks.len(), 1);
    // Second call is served from the cache
    assert_eq!(client.get_set("7").await.unwrap(), tracks);
}

#[tokio::test]
async fn test_followings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/followings.json"))
        .and(query_param("limit", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 11, "username": "alice"}, {"username": "no id"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/11/tracks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([track_json(4, "Alice mix")])))
        .mount(&server)
        .await;

    let client = client(&server);
    let users = client.get_followings().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "alice");

    let tracks = client.get_following_tracks("11").await.unwrap();
    assert_eq!(tracks[0].name, "Alice mix");
}

#[tokio::test]
async fn test_explore() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/explore/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "music": [
                {"urn": "urn:category:house", "title": "House"},
                "urn:category:deep-techno"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/explore/urn:category:deep-techno"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [{"id": 1}, {"id": 2}, {"title": "no id"}]
        })))
        .mount(&server)
        .await;

    mount_track(&server, 1, "One").await;
    mount_track(&server, 2, "Two").await;

    let client = client(&server);
    let categories = client.get_explore().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].title, "House");
    assert_eq!(categories[1].title, "Deep Techno");

    let tracks = client.get_explore_tracks("1").await.unwrap();
    assert_eq!(sorted_names(&tracks), vec!["One", "Two"]);

    assert!(client.get_explore_tracks("5").await.unwrap_err().is_not_found());
    assert!(client.get_explore_tracks("abc").await.is_err());
}

#[tokio::test]
async fn test_groups() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/groups.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "name": "Jazz Lovers"}
        ])))
        .mount(&server)
        .await;

    let mut entry = track_json(1, "A track");
    entry["kind"] = json!("track");
    let mut other = track_json(2, "A playlist");
    other["kind"] = json!("playlist");

    Mock::given(method("GET"))
        .and(path("/groups/5/tracks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry, other])))
        .mount(&server)
        .await;

    let client = client(&server);
    let groups = client.get_groups().await.unwrap();
    assert_eq!(groups[0].name, "Jazz Lovers");
    assert_eq!(groups[0].id, "5");

    let tracks = client.get_group_tracks("5").await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "A track");

    assert!(client.get_group_tracks("not-a-number").await.is_err());
}

#[tokio::test]
async fn test_user_liked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/e1/me/likes.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"track": track_json(3, "Liked")},
                {"playlist": {"id": 8, "title": "Fav set"}},
                {"track": null},
                {}
            ]
        })))
        .mount(&server)
        .await;

    let items = client(&server).get_user_liked().await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], LikedItem::Track(track) if track.name == "Liked"));
    assert_eq!(
        items[1],
        LikedItem::Playlist {
            title: "Fav set".into(),
            id: "8".into()
        }
    );
}

#[tokio::test]
async fn test_listing_errors_propagate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/playlists.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/groups.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"type": "OAuthException", "message": "token required"}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.get_sets().await.is_err());
    assert!(client.get_groups().await.is_err());
}

#[tokio::test]
async fn test_resolve_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resolve.json"))
        .and(query_param("url", "https://www.mixcloud.com/dj/show/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "/dj/show/", "name": "The Show", "url": "https://www.mixcloud.com/dj/show/"
        })))
        .mount(&server)
        .await;

    let track = client(&server)
        .resolve_url("https://www.mixcloud.com/dj/show/")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(track.name, "The Show");
    assert!(track.uri.starts_with("mixcloud:song/The Show."));
}

#[tokio::test]
async fn test_cloudcast_key_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dj/late.night/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "/dj/late.night/",
            "name": "Late Night",
            "stream_url": "https://stream.mixcloud.com/late.m4a"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let id = pmomixcloud::uri::encode_cloudcast_key("/dj/late.night/");

    let track = client.get_track(&id, false).await.unwrap();
    assert_eq!(track.name, "Late Night");
    assert_eq!(pmomixcloud::parse_track_uri(&track), Some(id.as_str()));

    let streamable = client.get_track(&id, true).await.unwrap();
    assert_eq!(
        streamable.uri,
        "https://stream.mixcloud.com/late.m4a?client_id=cid"
    );
}

#[tokio::test]
async fn test_can_be_streamed() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/stream/ok.m4a"))
        .and(query_param("client_id", "cid"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://cdn.example.com/ok.m4a"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/stream/gone.m4a"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    let ok = format!("{}/stream/ok.m4a", server.uri());
    assert!(client.can_be_streamed(&ok).await);
    assert!(client.can_be_streamed(&ok).await);
    assert!(!client.can_be_streamed(&format!("{}/stream/gone.m4a", server.uri())).await);
}

#[tokio::test]
async fn test_oauth_header() {
    use wiremock::matchers::header;

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/groups.json"))
        .and(header("Authorization", "OAuth secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = MixcloudClient::builder()
        .client_id("cid")
        .api_base(server.uri())
        .auth_token("secret")
        .build()
        .unwrap();

    assert!(client.get_groups().await.unwrap().is_empty());
}
