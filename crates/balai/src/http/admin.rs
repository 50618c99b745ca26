//! Admin panel handlers. Authentication happens in [`super::auth`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use super::form::Submission;
use super::{redirect_to_dashboard, with_store, AppState, ServerError};
use crate::model::{self, sort_newest_first, NewsForm, NewsItem, StatusForm};
use crate::views::Page;

pub(crate) async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let (news, complaints) = with_store(&state, |store| {
        let mut news = store.news().read()?;
        let mut complaints = store.complaints().read()?;
        sort_newest_first(&mut news);
        sort_newest_first(&mut complaints);
        Ok((news, complaints))
    })
    .await?;

    Ok(Html(
        Page::Dashboard {
            news: &news,
            complaints: &complaints,
        }
        .render(),
    ))
}

pub(crate) async fn create_news(
    State(state): State<AppState>,
    Submission(form): Submission<NewsForm>,
) -> Result<Response, ServerError> {
    let Some(item) = NewsItem::from_form(form, model::now()) else {
        return Ok((StatusCode::BAD_REQUEST, "Judul dan isi wajib diisi.").into_response());
    };

    let slug = item.slug.clone();
    with_store(&state, move |store| {
        store.news().update(|all| {
            all.push(item);
            Some(())
        })
    })
    .await?;

    info!(slug = %slug, "News item published");
    Ok(redirect_to_dashboard())
}

pub(crate) async fn update_complaint_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Submission(form): Submission<StatusForm>,
) -> Result<Response, ServerError> {
    let lookup_id = id.clone();
    let status = with_store(&state, move |store| {
        store.complaints().update(|all| {
            let complaint = all.iter_mut().find(|c| c.id == lookup_id)?;
            complaint.apply_status(&form.status, model::now());
            Some(complaint.status.clone())
        })
    })
    .await?;

    let Some(status) = status else {
        return Ok((StatusCode::NOT_FOUND, "Pengaduan tidak ditemukan.").into_response());
    };

    info!(complaint_id = %id, status = %status, "Complaint status updated");
    Ok(redirect_to_dashboard())
}
