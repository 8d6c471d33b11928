use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use reelrank::{
    AppState,
    config::Config,
    db,
    models::NewMovie,
    router,
    store::MovieStore,
    tmdb::TmdbClient,
};

/// App wired to a fresh in-memory database. Most paths never touch TMDB;
/// the end-to-end tests point `tmdb_base_url` at a local stub.
async fn test_app() -> (Router, MovieStore) {
    test_app_with_tmdb("http://127.0.0.1:9").await
}

async fn test_app_with_tmdb(tmdb_base_url: &str) -> (Router, MovieStore) {
    let config = Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        tmdb_access_token: "test-token".to_string(),
        tmdb_base_url: tmdb_base_url.to_string(),
        tmdb_image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
        tmdb_rps: 4,
        database_url: "sqlite::memory:".to_string(),
    };

    let conn = db::connect_and_migrate(&config.database_url).await.unwrap();
    let store = MovieStore::new(conn);

    let tmdb = TmdbClient::new(
        reqwest::Client::new(),
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state =
        Arc::new(AppState { config: Arc::new(config), store: store.clone(), tmdb: Arc::new(tmdb) });
    (router(state), store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Serves canned TMDB search and detail responses on an ephemeral port.
/// Movie 27205 has a full payload; 64956 is missing its poster.
async fn spawn_tmdb_stub() -> String {
    use axum::{Json, extract::Path, routing::get as get_route};

    let stub = Router::new()
        .route(
            "/search/movie",
            get_route(|| async {
                Json(serde_json::json!({
                    "page": 1,
                    "results": [
                        {
                            "id": 27205,
                            "title": "Inception",
                            "release_date": "2010-07-16",
                            "overview": "A thief who steals corporate secrets."
                        },
                        {
                            "id": 64956,
                            "title": "Inception: The Cobol Job",
                            "release_date": "2010-12-07",
                            "overview": ""
                        }
                    ],
                    "total_pages": 1,
                    "total_results": 2
                }))
            }),
        )
        .route(
            "/movie/{id}",
            get_route(|Path(id): Path<i32>| async move {
                if id == 27205 {
                    Json(serde_json::json!({
                        "title": "Inception",
                        "release_date": "2010-07-16",
                        "overview": "A thief who steals corporate secrets.",
                        "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg"
                    }))
                } else {
                    Json(serde_json::json!({
                        "title": "Inception: The Cobol Job",
                        "release_date": "2010-12-07",
                        "overview": "",
                        "poster_path": null
                    }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{addr}")
}

fn sample(title: &str, year: i32) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        year,
        description: format!("About {title}."),
        img_url: format!("https://image.tmdb.org/t/p/w500/{}.jpg", title.replace(' ', "-")),
    }
}

#[tokio::test]
async fn index_lists_movies_highest_rank_first() {
    let (app, store) = test_app().await;

    let low = store.insert(sample("Slow Burn", 1998)).await.unwrap();
    let high = store.insert(sample("The Favourite", 2018)).await.unwrap();
    store.update_review(low.id, 5.0, "Fine.".to_string()).await.unwrap();
    store.update_review(high.id, 9.0, "Loved it.".to_string()).await.unwrap();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    let favourite = body.find("The Favourite").unwrap();
    let slow_burn = body.find("Slow Burn").unwrap();
    assert!(favourite < slow_burn, "higher-rated movie should render first");
    assert!(body.contains("#2"));
    assert!(body.contains("#1"));
}

#[tokio::test]
async fn add_redirects_to_search_results() {
    let (app, _store) = test_app().await;

    let response = app.oneshot(post_form("/add", "title=The+Matrix")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/search_results/The%20Matrix"
    );
}

#[tokio::test]
async fn add_with_blank_title_rerenders_form() {
    let (app, _store) = test_app().await;

    let response = app.oneshot(post_form("/add", "title=++")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Movie title is required"));
}

#[tokio::test]
async fn edit_updates_rating_and_review() {
    let (app, store) = test_app().await;
    let movie = store.insert(sample("Inception", 2010)).await.unwrap();

    let uri = format!("/edit/{}", movie.id);
    let response = app
        .oneshot(post_form(&uri, "rating=9.5&review=Mind-bending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let updated = store.get(movie.id).await.unwrap();
    assert_eq!(updated.rating, Some(9.5));
    assert_eq!(updated.review.as_deref(), Some("Mind-bending"));
}

#[tokio::test]
async fn edit_with_bad_rating_rerenders_form() {
    let (app, store) = test_app().await;
    let movie = store.insert(sample("Inception", 2010)).await.unwrap();

    let uri = format!("/edit/{}", movie.id);
    let response = app.oneshot(post_form(&uri, "rating=ten&review=Great")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Rating must be a number"));

    assert_eq!(store.get(movie.id).await.unwrap().rating, None);
}

#[tokio::test]
async fn missing_records_get_404() {
    let (app, _store) = test_app().await;

    let edit = app.clone().oneshot(get("/edit/999")).await.unwrap();
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);

    let update = app
        .clone()
        .oneshot(post_form("/edit/999", "rating=5&review=ghost"))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = app.oneshot(get("/delete/999")).await.unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_results_list_candidates() {
    let tmdb = spawn_tmdb_stub().await;
    let (app, _store) = test_app_with_tmdb(&tmdb).await;

    let response = app.oneshot(get("/search_results/Inception")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Inception"));
    assert!(body.contains("(2010)"));
    assert!(body.contains("/add_movie/27205"));
}

#[tokio::test]
async fn selecting_candidate_inserts_and_redirects_to_edit() {
    let tmdb = spawn_tmdb_stub().await;
    let (app, store) = test_app_with_tmdb(&tmdb).await;

    let response = app.oneshot(get("/add_movie/27205")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let id: i32 = location.strip_prefix("/edit/").unwrap().parse().unwrap();

    let movie = store.get(id).await.unwrap();
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.year, 2010);
    assert_eq!(movie.description, "A thief who steals corporate secrets.");
    assert_eq!(
        movie.img_url,
        "https://image.tmdb.org/t/p/w500/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg"
    );
    assert_eq!(movie.rating, None);
    assert_eq!(movie.review, None);
}

#[tokio::test]
async fn candidate_without_poster_is_bad_gateway() {
    let tmdb = spawn_tmdb_stub().await;
    let (app, store) = test_app_with_tmdb(&tmdb).await;

    let response = app.oneshot(get("/add_movie/64956")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_lookup_is_bad_gateway() {
    let (app, _store) = test_app().await;

    let response = app.oneshot(get("/search_results/Inception")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn delete_then_edit_is_404() {
    let (app, store) = test_app().await;
    let movie = store.insert(sample("Gone Girl", 2014)).await.unwrap();

    let response = app.clone().oneshot(get(&format!("/delete/{}", movie.id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let response = app.oneshot(get(&format!("/edit/{}", movie.id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
