/// API integration tests
/// Tests complete HTTP request/response cycles against both storage backends
mod common;

use axum::http::{Method, StatusCode};
use common::{fixtures, TestApp};
use playlister_core::{Backend, DatabaseManager};
use serde_json::json;

/// Run each scenario once per backend
macro_rules! api_tests {
    ($($name:ident),* $(,)?) => {
        mod document {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::TestApp::new(super::Backend::Document).await).await;
                }
            )*
        }

        mod relational {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::TestApp::new(super::Backend::Relational).await).await;
                }
            )*
        }
    };
}

api_tests!(
    health_reports_backend,
    register_login_and_update_profile,
    register_rejects_bad_input,
    login_failure_is_uniform,
    logged_in_and_logout,
    protected_routes_require_session,
    song_catalog_lifecycle,
    song_validation_errors,
    playlist_lifecycle_syncs_catalog_counts,
    playlist_rejects_non_owner,
    playlist_missing_ids,
    playlist_search_filters_and_sorts,
    malformed_bodies_are_json_bad_requests,
);

fn song_body(title: &str, artist: &str, year: i32) -> serde_json::Value {
    json!({ "title": title, "artist": artist, "year": year, "youTubeId": "dQw4w9WgXcQ" })
}

async fn health_reports_backend(app: TestApp) {
    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["backend"], app.db.backend().to_string());
}

async fn register_login_and_update_profile(app: TestApp) {
    let registered = app
        .post(
            "/auth/register",
            json!({
                "userName": fixtures::TEST_USER_NAME,
                "email": fixtures::TEST_EMAIL,
                "password": fixtures::TEST_PASSWORD,
                "passwordVerify": fixtures::TEST_PASSWORD,
            }),
            None,
        )
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body["success"], true);
    assert_eq!(registered.body["user"]["email"], fixtures::TEST_EMAIL);
    assert!(registered.body["user"].get("passwordHash").is_none());
    assert!(registered.session_cookie.is_none(), "registration does not log in");

    let login = app
        .post(
            "/auth/login",
            json!({ "email": "A@X.com", "password": fixtures::TEST_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.session_cookie.expect("session cookie");

    // Email changes are ignored
    let updated = app
        .put(
            "/auth/update",
            json!({ "userName": "Bee", "email": "other@x.com" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["user"]["userName"], "Bee");
    assert_eq!(updated.body["user"]["email"], fixtures::TEST_EMAIL);

    // New password takes effect
    let changed = app
        .put(
            "/auth/update",
            json!({ "password": "newpassword1", "passwordVerify": "newpassword1" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    let old = app
        .post(
            "/auth/login",
            json!({ "email": fixtures::TEST_EMAIL, "password": fixtures::TEST_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .post(
            "/auth/login",
            json!({ "email": fixtures::TEST_EMAIL, "password": "newpassword1" }),
            None,
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

async fn register_rejects_bad_input(app: TestApp) {
    let missing = app
        .post("/auth/register", json!({ "email": "a@x.com" }), None)
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["success"], false);
    assert_eq!(missing.body["errorMessage"], "Please enter all required fields.");

    let short = app
        .post(
            "/auth/register",
            json!({ "userName": "A", "email": "a@x.com", "password": "short", "passwordVerify": "short" }),
            None,
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let mismatch = app
        .post(
            "/auth/register",
            json!({ "userName": "A", "email": "a@x.com", "password": "pw12345678", "passwordVerify": "pw87654321" }),
            None,
        )
        .await;
    assert_eq!(mismatch.body["errorMessage"], "Please enter the same password twice.");

    app.register_and_login("A", "a@x.com", fixtures::TEST_PASSWORD)
        .await;
    let duplicate = app
        .post(
            "/auth/register",
            json!({
                "userName": "Other",
                "email": "A@X.COM",
                "password": fixtures::TEST_PASSWORD,
                "passwordVerify": fixtures::TEST_PASSWORD,
            }),
            None,
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["errorMessage"],
        "An account with this email address already exists."
    );
}

async fn login_failure_is_uniform(app: TestApp) {
    app.register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let wrong_password = app
        .post(
            "/auth/login",
            json!({ "email": fixtures::TEST_EMAIL, "password": "wrongpassword" }),
            None,
        )
        .await;
    let unknown_email = app
        .post(
            "/auth/login",
            json!({ "email": "nobody@x.com", "password": fixtures::TEST_PASSWORD }),
            None,
        )
        .await;

    for res in [wrong_password, unknown_email] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["errorMessage"], "Wrong email or password provided.");
        assert!(res.session_cookie.is_none());
    }
}

async fn logged_in_and_logout(app: TestApp) {
    let anonymous = app.get("/auth/loggedIn", None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["loggedIn"], false);

    let garbage = app.get("/auth/loggedIn", Some("token=not-a-jwt")).await;
    assert_eq!(garbage.body["loggedIn"], false);

    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;
    let status = app.get("/auth/loggedIn", Some(&cookie)).await;
    assert_eq!(status.body["loggedIn"], true);
    assert_eq!(status.body["user"]["email"], fixtures::TEST_EMAIL);

    let logout = app.get("/auth/logout", Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.session_cookie.as_deref(), Some("token="));
}

async fn protected_routes_require_session(app: TestApp) {
    let create_song = app
        .post("/songs", song_body("X", "Y", 2000), None)
        .await;
    assert_eq!(create_song.status, StatusCode::UNAUTHORIZED);
    assert_eq!(create_song.body["success"], false);

    let playlists = app.get("/store/playlists", None).await;
    assert_eq!(playlists.status, StatusCode::UNAUTHORIZED);

    let update = app
        .put("/auth/update", json!({ "userName": "Bee" }), Some("token=forged"))
        .await;
    assert_eq!(update.status, StatusCode::UNAUTHORIZED);

    // A valid token for an account that no longer exists
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;
    let user = app
        .db
        .find_user_by_email(fixtures::TEST_EMAIL)
        .await
        .unwrap()
        .unwrap();
    app.db.delete_user(&user.id).await.unwrap();
    let orphaned = app.get("/store/playlistpairs", Some(&cookie)).await;
    assert_eq!(orphaned.status, StatusCode::UNAUTHORIZED);
}

async fn song_catalog_lifecycle(app: TestApp) {
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let created = app
        .post("/songs", song_body("X", "Y", 2000), Some(&cookie))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["song"]["listens"], 0);
    let id = created.body["song"]["_id"].as_str().unwrap().to_string();

    // Same natural key, different case, year as a string
    let duplicate = app
        .post(
            "/songs",
            json!({ "title": "x", "artist": "y", "year": "2000", "youTubeId": "other" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["success"], false);

    let exists = app
        .get("/songs/check/exists?title=x&artist=Y&year=2000", None)
        .await;
    assert_eq!(exists.body["exists"], true);

    for _ in 0..2 {
        let res = app.post(&format!("/songs/{id}/listen"), json!({}), None).await;
        assert_eq!(res.status, StatusCode::OK);
    }
    let fetched = app.get(&format!("/songs/{id}"), None).await;
    assert_eq!(fetched.body["song"]["listens"], 2);

    app.post("/songs", song_body("Abba", "Z", 1975), Some(&cookie))
        .await;
    let listed = app.get("/songs?sortBy=title&sortOrder=desc", None).await;
    let titles: Vec<&str> = listed.body["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["X", "Abba"]);

    let searched = app.get("/songs?search=abb", None).await;
    assert_eq!(searched.body["songs"].as_array().unwrap().len(), 1);

    let stats = app.get("/songs/stats", None).await;
    assert_eq!(stats.body["stats"]["totalSongs"], 2);
    assert_eq!(stats.body["stats"]["mostListened"]["title"], "X");

    let renamed = app
        .put(&format!("/songs/{id}"), json!({ "title": "X2" }), Some(&cookie))
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["song"]["title"], "X2");
    assert_eq!(renamed.body["song"]["listens"], 2);

    let deleted = app.delete(&format!("/songs/{id}"), Some(&cookie)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Song deleted successfully");

    let gone = app.get(&format!("/songs/{id}"), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["errorMessage"], "Song not found");
}

async fn song_validation_errors(app: TestApp) {
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let missing = app
        .post("/songs", json!({ "title": "X", "artist": "Y" }), Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body["errorMessage"],
        "Title, artist, year, and YouTube ID are required"
    );

    let early = app
        .post("/songs", song_body("X", "Y", 1850), Some(&cookie))
        .await;
    assert_eq!(early.status, StatusCode::BAD_REQUEST);

    let check = app.get("/songs/check/exists?title=X", None).await;
    assert_eq!(check.status, StatusCode::BAD_REQUEST);
    assert_eq!(check.body["errorMessage"], "Title, artist, and year are required");

    let bad_sort = app.get("/songs?sortBy=color", None).await;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

    let listen_missing = app.post("/songs/999999/listen", json!({}), None).await;
    assert_eq!(listen_missing.status, StatusCode::NOT_FOUND);
}

async fn playlist_lifecycle_syncs_catalog_counts(app: TestApp) {
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;
    let song = app
        .post("/songs", song_body("X", "Y", 2000), Some(&cookie))
        .await;
    let song_id = song.body["song"]["_id"].as_str().unwrap().to_string();

    let created = app
        .post(
            "/store/playlist",
            json!({ "name": "Road trip", "songs": [{ "title": "x", "artist": "y", "year": 2000, "youTubeId": "dQw4w9WgXcQ" }] }),
            Some(&cookie),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["playlist"]["ownerEmail"], fixtures::TEST_EMAIL);
    let playlist_id = created.body["playlist"]["_id"].as_str().unwrap().to_string();

    let counted = app.get(&format!("/songs/{song_id}"), None).await;
    assert_eq!(counted.body["song"]["playlistCount"], 1);

    let fetched = app
        .get(&format!("/store/playlist/{playlist_id}"), Some(&cookie))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["playlist"]["name"], "Road trip");

    let pairs = app.get("/store/playlistpairs", Some(&cookie)).await;
    assert_eq!(pairs.status, StatusCode::OK);
    assert_eq!(pairs.body["idNamePairs"][0]["_id"], playlist_id.as_str());
    assert_eq!(pairs.body["idNamePairs"][0]["name"], "Road trip");

    let updated = app
        .put(
            &format!("/store/playlist/{playlist_id}"),
            json!({ "playlist": { "name": "Commute", "songs": [] } }),
            Some(&cookie),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Playlist updated!");

    let uncounted = app.get(&format!("/songs/{song_id}"), None).await;
    assert_eq!(uncounted.body["song"]["playlistCount"], 0);

    let deleted = app
        .delete(&format!("/store/playlist/{playlist_id}"), Some(&cookie))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let owner = app
        .db
        .find_user_by_email(fixtures::TEST_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(owner.playlists.is_empty());

    let none_left = app.get("/store/playlistpairs", Some(&cookie)).await;
    assert_eq!(none_left.status, StatusCode::NOT_FOUND);
}

async fn playlist_rejects_non_owner(app: TestApp) {
    let owner = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;
    let intruder = app
        .register_and_login("B", fixtures::OTHER_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let created = app
        .post("/store/playlist", json!({ "name": "Mine" }), Some(&owner))
        .await;
    let id = created.body["playlist"]["_id"].as_str().unwrap().to_string();
    let uri = format!("/store/playlist/{id}");

    let read = app.get(&uri, Some(&intruder)).await;
    assert_eq!(read.status, StatusCode::BAD_REQUEST);
    assert_eq!(read.body["errorMessage"], "authentication error");

    let write = app
        .put(&uri, json!({ "name": "Theirs" }), Some(&intruder))
        .await;
    assert_eq!(write.status, StatusCode::BAD_REQUEST);

    let delete = app.delete(&uri, Some(&intruder)).await;
    assert_eq!(delete.status, StatusCode::BAD_REQUEST);

    let intact = app.get(&uri, Some(&owner)).await;
    assert_eq!(intact.status, StatusCode::OK);
    assert_eq!(intact.body["playlist"]["name"], "Mine");
}

async fn playlist_missing_ids(app: TestApp) {
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let read = app.get("/store/playlist/424242", Some(&cookie)).await;
    assert_eq!(read.status, StatusCode::BAD_REQUEST);
    assert_eq!(read.body["errorMessage"], "Playlist not found");

    let write = app
        .put("/store/playlist/424242", json!({ "name": "N" }), Some(&cookie))
        .await;
    assert_eq!(write.status, StatusCode::NOT_FOUND);

    let delete = app.delete("/store/playlist/424242", Some(&cookie)).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let unnamed = app
        .post("/store/playlist", json!({ "songs": [] }), Some(&cookie))
        .await;
    assert_eq!(unnamed.status, StatusCode::BAD_REQUEST);
}

async fn playlist_search_filters_and_sorts(app: TestApp) {
    let a = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;
    let b = app
        .register_and_login("B", fixtures::OTHER_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    for name in ["beta", "Alpha"] {
        app.post("/store/playlist", json!({ "name": name }), Some(&a))
            .await;
    }
    app.post("/store/playlist", json!({ "name": "gamma 100%" }), Some(&b))
        .await;

    let sorted = app
        .get("/store/playlists?sortBy=name&sortOrder=asc", Some(&a))
        .await;
    assert_eq!(sorted.status, StatusCode::OK);
    let names: Vec<&str> = sorted.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma 100%"]);

    let owned = app
        .get(&format!("/store/playlists?owner={}", fixtures::OTHER_EMAIL), Some(&a))
        .await;
    assert_eq!(owned.body["data"].as_array().unwrap().len(), 1);

    let literal = app.get("/store/playlists?search=0%25", Some(&a)).await;
    assert_eq!(literal.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(literal.body["data"][0]["name"], "gamma 100%");
}

async fn malformed_bodies_are_json_bad_requests(app: TestApp) {
    let cookie = app
        .register_and_login("A", fixtures::TEST_EMAIL, fixtures::TEST_PASSWORD)
        .await;

    let missing = app
        .request_raw(Method::POST, "/store/playlist", None, Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["success"], false);
    assert_eq!(missing.body["errorMessage"], "Expected a JSON request body");

    let mistyped = app
        .post("/store/playlist", json!({ "name": 5 }), Some(&cookie))
        .await;
    assert_eq!(mistyped.status, StatusCode::BAD_REQUEST);
    assert_eq!(mistyped.body["success"], false);
    assert!(mistyped.body["errorMessage"].is_string());

    let garbage = app
        .request_raw(
            Method::POST,
            "/store/playlist",
            Some(("application/json", "{\"name\": ".to_string())),
            Some(&cookie),
        )
        .await;
    assert_eq!(garbage.status, StatusCode::BAD_REQUEST);
    assert_eq!(garbage.body["success"], false);

    let bad_year = app
        .post(
            "/songs",
            json!({ "title": "X", "artist": "Y", "year": true, "youTubeId": "z" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(bad_year.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_year.body["success"], false);

    // Nothing was stored
    let pairs = app.get("/store/playlistpairs", Some(&cookie)).await;
    assert_eq!(pairs.status, StatusCode::NOT_FOUND);
}
