use crate::errors::AppError;
use crate::favorites::FavoritesStore;
use crate::models::{
    Coupon, Direction, FavoritesResponse, RemoveResponse, StatusQuery, StatusResponse,
    ToggleRequest, ToggleResponse,
};
use crate::render::{CardOptions, CardRenderer, Container};
use crate::state::AppState;
use crate::storage::persist_storage;
use crate::ui::{Page, render_page};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Html,
};
use tracing::info;

fn listing_renderer() -> CardRenderer {
    CardRenderer::new(CardOptions::default())
}

fn favorites_renderer() -> CardRenderer {
    CardRenderer::new(CardOptions {
        show_remove_favorite: true,
        ..CardOptions::default()
    })
}

fn favorite_coupons(state: &AppState, store: &dyn FavoritesStore) -> Vec<Coupon> {
    store
        .favorite_ids()
        .iter()
        .filter_map(|id| state.find_coupon(id).cloned())
        .collect()
}

fn requested_id(payload: &ToggleRequest) -> Result<&str, AppError> {
    let id = payload.discount_id.trim();
    if id.is_empty() {
        return Err(AppError::bad_request("discount_id is required"));
    }
    Ok(id)
}

fn lookup<'a>(state: &'a AppState, id: &str) -> Result<&'a Coupon, AppError> {
    state
        .find_coupon(id)
        .ok_or_else(|| AppError::not_found(format!("discount {id} not found")))
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let storage = state.storage.lock().await;
    let mut listener = state.sync.clone();
    let mut container = Container::new("coupon-list");
    listing_renderer().render_cards(&mut container, &state.coupons, &*storage, &mut listener);
    Html(render_page(Page::Listing, &container))
}

pub async fn favorites_page(State(state): State<AppState>) -> Html<String> {
    let storage = state.storage.lock().await;
    let coupons = favorite_coupons(&state, &*storage);
    let mut listener = state.sync.clone();
    let mut container = Container::new("favorites-list");
    favorites_renderer().render_cards(&mut container, &coupons, &*storage, &mut listener);
    Html(render_page(Page::Favorites, &container))
}

pub async fn get_coupons(State(state): State<AppState>) -> Json<Vec<Coupon>> {
    Json(state.coupons.as_ref().clone())
}

pub async fn get_favorites(State(state): State<AppState>) -> Json<FavoritesResponse> {
    let storage = state.storage.lock().await;
    Json(FavoritesResponse {
        favorites: storage.favorite_ids(),
    })
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let id = requested_id(&payload)?;
    let coupon = lookup(&state, id)?;
    let credentials = state.credentials(&headers);

    let _serial = state.toggles.lock().await;
    let (mut card, direction) = {
        let storage = state.storage.lock().await;
        let card = listing_renderer().render(coupon, &*storage);
        (card, Direction::toggling(storage.is_favorite(id)))
    };

    let update = state.sync.settle(id, direction, &credentials).await?;

    let outcome = {
        let mut storage = state.storage.lock().await;
        let outcome = state.sync.finish_toggle(update, &mut *storage, &mut card);
        persist_storage(&state.data_path, &storage).await?;
        outcome
    };

    info!(
        discount_id = %outcome.discount_id,
        is_favorite = outcome.is_favorite,
        source = ?outcome.source,
        "favorite toggled"
    );
    Ok(Json(ToggleResponse {
        discount_id: outcome.discount_id,
        is_favorite: outcome.is_favorite,
        source: outcome.source,
        message: outcome.message,
        card_html: card.to_html(),
    }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<RemoveResponse>, AppError> {
    let id = requested_id(&payload)?;
    let credentials = state.credentials(&headers);

    let _serial = state.toggles.lock().await;
    let update = state
        .sync
        .settle(id, Direction::Remove, &credentials)
        .await?;

    let outcome = {
        let mut storage = state.storage.lock().await;
        let coupons = favorite_coupons(&state, &*storage);
        let mut container = Container::new("favorites-list");
        favorites_renderer().render_cards(&mut container, &coupons, &*storage, &mut ());
        let outcome = state.sync.finish_removal(update, &mut *storage, &mut container);
        persist_storage(&state.data_path, &storage).await?;
        outcome
    };

    info!(discount_id = %outcome.discount_id, remaining = outcome.remaining, "favorite removed");
    Ok(Json(RemoveResponse {
        discount_id: outcome.discount_id,
        remaining: outcome.remaining,
        message: outcome.message,
    }))
}

pub async fn favorite_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    let coupon = lookup(&state, &id)?;
    let credentials = state.credentials(&headers);
    let renderer = match query.view.as_deref() {
        Some("favorites") => favorites_renderer(),
        _ => listing_renderer(),
    };

    let mut card = {
        let storage = state.storage.lock().await;
        renderer.render(coupon, &*storage)
    };
    let is_favorite = state.sync.check_favorite_status(&mut card, &credentials).await?;

    Ok(Json(StatusResponse {
        discount_id: id,
        is_favorite,
        card_html: card.to_html(),
    }))
}
