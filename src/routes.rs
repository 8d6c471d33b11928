use std::sync::Arc;

use axum::{
    extract::{Form, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    AppState,
    error::AppResult,
    models::{AddForm, EditForm, NewMovie, rank_by_rating},
    templates,
};

pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = state.store.list_all().await?;
    let ranked = rank_by_rating(movies);
    Ok(Html(templates::index_page(&ranked)))
}

pub async fn add_form() -> Html<String> {
    Html(templates::add_page(None))
}

pub async fn add_submit(Form(form): Form<AddForm>) -> Response {
    match form.validated_title() {
        Ok(title) => {
            Redirect::to(&format!("/search_results/{}", urlencoding::encode(title)))
                .into_response()
        },
        Err(message) => Html(templates::add_page(Some(message))).into_response(),
    }
}

pub async fn search_results(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> AppResult<Html<String>> {
    debug!(title = %title, "searching");
    let candidates = state.tmdb.search(&title).await?;
    Ok(Html(templates::select_page(&title, &candidates)))
}

pub async fn select_candidate(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<i32>,
) -> AppResult<Redirect> {
    let details = state.tmdb.get_details(tmdb_id).await?;
    let new = NewMovie::from_details(&details, &state.config.tmdb_image_base_url)?;

    let movie = state.store.insert(new).await?;
    debug!(id = movie.id, title = %movie.title, "added movie");

    Ok(Redirect::to(&format!("/edit/{}", movie.id)))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let movie = state.store.get(id).await?;
    Ok(Html(templates::edit_page(&movie, None)))
}

pub async fn edit_submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Form(form): Form<EditForm>,
) -> AppResult<Response> {
    let movie = state.store.get(id).await?;

    match form.validated() {
        Ok((rating, review)) => {
            state.store.update_review(movie.id, rating, review.to_string()).await?;
            Ok(Redirect::to("/").into_response())
        },
        Err(message) => Ok(Html(templates::edit_page(&movie, Some(message))).into_response()),
    }
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.store.delete(id).await?;
    debug!(id = id, "deleted movie");
    Ok(Redirect::to("/"))
}
