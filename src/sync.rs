use crate::client::{Credentials, FavoritesClient};
use crate::config::AuthFallback;
use crate::dom::Element;
use crate::errors::{ClientError, SyncError};
use crate::favorites::FavoritesStore;
use crate::models::Direction;
use crate::render::{CardMountListener, Container, no_results};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const HEART_ACTIVE_COLOR: &str = "#ff0000";
pub const HEART_IDLE_COLOR: &str = "#ccc";

/// Where a settled change was accepted. `LocalOnly` means the backend
/// refused the caller as unauthenticated and only the local store changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Backend,
    LocalOnly,
}

/// A change the backend has settled that has not touched the local store yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledUpdate {
    pub discount_id: String,
    pub direction: Direction,
    pub source: UpdateSource,
    pub message: String,
}

impl SettledUpdate {
    pub fn is_favorite(&self) -> bool {
        self.direction == Direction::Add
    }

    pub fn apply<S: FavoritesStore + ?Sized>(&self, store: &mut S) {
        match self.direction {
            Direction::Add => store.add_favorite(&self.discount_id),
            Direction::Remove => store.remove_favorite(&self.discount_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub discount_id: String,
    pub is_favorite: bool,
    pub source: UpdateSource,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub discount_id: String,
    pub remaining: usize,
    pub message: String,
}

/// Reconciles a card (or a bare favorite button) with `is_favorite`.
/// Returns false when nothing on the card could be patched.
pub fn sync_card_view(card: &mut Element, is_favorite: bool) -> bool {
    let mut patched = false;

    if let Some(heart) = card.by_class_mut("like-icon") {
        if is_favorite {
            heart.add_class("favorite-active");
            heart.set_style("color", HEART_ACTIVE_COLOR);
            heart.set_attr("title", "Remove from Favorites");
        } else {
            heart.remove_class("favorite-active");
            heart.set_style("color", HEART_IDLE_COLOR);
            heart.set_attr("title", "Add to Favorites");
        }
        patched = true;
    }

    if let Some(button) = card.by_class_mut("fav-btn") {
        if is_favorite {
            button.add_class("favorited");
            button.add_class("btn-danger");
            button.remove_class("btn-outline-primary");
        } else {
            button.remove_class("favorited");
            button.remove_class("btn-danger");
            button.add_class("btn-outline-primary");
        }
        patched = true;
    }

    let (from, to) = if is_favorite {
        ("Add", "Remove")
    } else {
        ("Remove", "Add")
    };
    if let Some(label) = card.by_class_mut("fav-btn-text") {
        label.set_text(to);
        patched = true;
    } else if let Some(span) = card.find_mut(&|element| {
        element.tag == "span"
            && !element.has_class("like-icon")
            && element.element_children().next().is_none()
            && element.text_content().contains(from)
    }) {
        let text = span.text_content().replacen(from, to, 1);
        span.set_text(text);
        patched = true;
    }

    if !patched {
        warn!(
            discount_id = card_id(card).unwrap_or_default(),
            "no favorite control found to update"
        );
    }
    patched
}

pub fn card_id(card: &Element) -> Option<&str> {
    card.find(&|element| element.has_attr("data-discount-id"))
        .and_then(|element| element.get_attr("data-discount-id"))
}

/// Drives favorite toggles between the local store, card views, and the
/// backend. The view only changes once the backend call has settled.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    client: FavoritesClient,
    fallback: AuthFallback,
}

impl Synchronizer {
    pub fn new(client: FavoritesClient, fallback: AuthFallback) -> Self {
        Self { client, fallback }
    }

    /// Syncs a freshly inserted card from local state, once.
    pub fn mount(&self, card: &mut Element, store: &dyn FavoritesStore) -> bool {
        let Some(id) = card_id(card).map(str::to_string) else {
            return false;
        };
        match card.by_class("fav-btn") {
            Some(button) if !button.has_attr("data-initialized") => {}
            _ => return false,
        }
        sync_card_view(card, store.is_favorite(&id));
        if let Some(button) = card.by_class_mut("fav-btn") {
            button.set_attr("data-initialized", "true");
        }
        true
    }

    /// Page-ready pass over every card under `root`.
    pub fn initialize(&self, root: &mut Element, store: &dyn FavoritesStore) -> usize {
        let mut mounted = 0;
        root.visit_mut(&mut |element| {
            if element.has_class("discount-card") && self.mount(element, store) {
                mounted += 1;
            }
        });
        mounted
    }

    pub async fn toggle<S: FavoritesStore + ?Sized>(
        &self,
        store: &mut S,
        card: &mut Element,
        credentials: &Credentials,
    ) -> Result<ToggleOutcome, SyncError> {
        let id = card_id(card).ok_or(SyncError::MissingId)?.to_string();
        let direction = Direction::toggling(store.is_favorite(&id));
        let update = self.settle(&id, direction, credentials).await?;
        Ok(self.finish_toggle(update, store, card))
    }

    /// Applies a settled toggle to the store and patches `card` to match.
    pub fn finish_toggle<S: FavoritesStore + ?Sized>(
        &self,
        update: SettledUpdate,
        store: &mut S,
        card: &mut Element,
    ) -> ToggleOutcome {
        update.apply(store);
        sync_card_view(card, update.is_favorite());
        ToggleOutcome {
            is_favorite: update.is_favorite(),
            discount_id: update.discount_id,
            source: update.source,
            message: update.message,
        }
    }

    /// Favorites-list removal: drops the card from `container` once the
    /// backend agrees, falling back to the placeholder when none remain.
    pub async fn remove_from_list<S: FavoritesStore + ?Sized>(
        &self,
        store: &mut S,
        container: &mut Container,
        discount_id: &str,
        credentials: &Credentials,
    ) -> Result<RemoveOutcome, SyncError> {
        let update = self
            .settle(discount_id, Direction::Remove, credentials)
            .await?;
        Ok(self.finish_removal(update, store, container))
    }

    pub fn finish_removal<S: FavoritesStore + ?Sized>(
        &self,
        update: SettledUpdate,
        store: &mut S,
        container: &mut Container,
    ) -> RemoveOutcome {
        update.apply(store);
        let discount_id = update.discount_id.as_str();
        let removed = container.root.remove_children(&|element| {
            element.has_class("favorite-item")
                && element.get_attr("data-discount-id") == Some(discount_id)
        });
        if removed == 0 {
            warn!(discount_id, "could not find favorite card to remove");
        }
        let remaining = container.cards().len();
        if remaining == 0 && container.root.by_class("no-results").is_none() {
            container.root.push(no_results());
        }

        RemoveOutcome {
            discount_id: update.discount_id,
            remaining,
            message: update.message,
        }
    }

    /// Forces the card into the backend's answer. On failure the view is
    /// left as it was.
    pub async fn check_favorite_status(
        &self,
        card: &mut Element,
        credentials: &Credentials,
    ) -> Result<bool, SyncError> {
        let id = card_id(card).ok_or(SyncError::MissingId)?.to_string();
        match self.client.check_favorite(&id, credentials).await {
            Ok(is_favorite) => {
                sync_card_view(card, is_favorite);
                Ok(is_favorite)
            }
            Err(err) => {
                warn!(discount_id = %id, "error checking favorite status: {err}");
                Err(err.into())
            }
        }
    }

    /// Calls the backend for one change without touching any local state.
    /// Under the `local` policy a 401 still settles, as a local-only change.
    pub async fn settle(
        &self,
        id: &str,
        direction: Direction,
        credentials: &Credentials,
    ) -> Result<SettledUpdate, SyncError> {
        let fallback_message = match direction {
            Direction::Add => "Added to favorites!",
            Direction::Remove => "Removed from favorites!",
        };

        let (source, message) = match self
            .client
            .toggle_remote_favorite(id, direction, credentials)
            .await
        {
            Ok(ack) => (
                UpdateSource::Backend,
                ack.message.unwrap_or_else(|| fallback_message.to_string()),
            ),
            Err(ClientError::Unauthorized { .. }) if self.fallback == AuthFallback::Local => {
                info!(discount_id = id, "updated local favorites (not logged in)");
                (UpdateSource::LocalOnly, fallback_message.to_string())
            }
            Err(err) => {
                warn!(discount_id = id, ?direction, "error updating favorites: {err}");
                return Err(err.into());
            }
        };

        Ok(SettledUpdate {
            discount_id: id.to_string(),
            direction,
            source,
            message,
        })
    }
}

impl CardMountListener for Synchronizer {
    fn card_mounted(&mut self, card: &mut Element, store: &dyn FavoritesStore) {
        self.mount(card, store);
    }
}
