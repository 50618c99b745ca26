//! Public pages: home, news, complaint form.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use super::form::Submission;
use super::{with_store, AppState, ServerError};
use crate::model::{self, sort_newest_first, Complaint, ComplaintForm};
use crate::views::{Page, COMPLAINT_REQUIRED_MESSAGE, HOME_NEWS_LIMIT};

pub(crate) async fn home(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let news = with_store(&state, |store| {
        let mut news = store.news().read()?;
        sort_newest_first(&mut news);
        news.truncate(HOME_NEWS_LIMIT);
        Ok(news)
    })
    .await?;
    Ok(Html(Page::Home { news: &news }.render()))
}

pub(crate) async fn news_list(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let news = with_store(&state, |store| {
        let mut news = store.news().read()?;
        sort_newest_first(&mut news);
        Ok(news)
    })
    .await?;
    Ok(Html(Page::NewsList { news: &news }.render()))
}

pub(crate) async fn news_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServerError> {
    // Slugs are not unique; the first item in file order wins.
    let item = with_store(&state, move |store| {
        Ok(store.news().read()?.into_iter().find(|n| n.slug == slug))
    })
    .await?;

    Ok(match item {
        Some(item) => Html(Page::NewsDetail { item: &item }.render()).into_response(),
        None => not_found().await,
    })
}

pub(crate) async fn complaint_form() -> Html<String> {
    Html(Page::ComplaintForm { error: None }.render())
}

pub(crate) async fn submit_complaint(
    State(state): State<AppState>,
    Submission(form): Submission<ComplaintForm>,
) -> Result<Response, ServerError> {
    let Some(complaint) = Complaint::from_form(form, model::now()) else {
        let page = Page::ComplaintForm {
            error: Some(COMPLAINT_REQUIRED_MESSAGE),
        };
        return Ok((StatusCode::BAD_REQUEST, Html(page.render())).into_response());
    };

    let id = complaint.id.clone();
    let category = complaint.category.clone();
    with_store(&state, move |store| {
        store.complaints().update(|all| {
            all.push(complaint);
            Some(())
        })
    })
    .await?;

    info!(complaint_id = %id, category = %category, "Complaint received");
    Ok(Html(Page::ComplaintSuccess.render()).into_response())
}

pub(crate) async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(Page::NotFound.render())).into_response()
}
