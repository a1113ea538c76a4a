//! Coupon cards as detached element trees, and batch rendering into a
//! container that owns the delegated show-more binding.

use crate::dom::Element;
use crate::favorites::FavoritesStore;
use crate::models::Coupon;
use crate::sync::sync_card_view;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

pub const TRUNCATE_AT: usize = 250;

pub const FIXED_PRICE_LABEL: &str = "מחיר סופי";
pub const PERCENTAGE_LABEL: &str = "% הנחה";
pub const SHOW_MORE_LABEL: &str = "הצג עוד";
pub const SHOW_LESS_LABEL: &str = "הצג פחות";
pub const EXPIRED_LABEL: &str = "פג תוקף";
pub const NO_RESULTS_TEXT: &str = "No discounts found at the moment.";

const FIXED_TYPES: &[&str] = &["fixed_amount", "fixed_price", "amount", "fixed"];
const PERCENTAGE_TYPES: &[&str] = &["percentage", "%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceStyle {
    pub label: &'static str,
    pub color: &'static str,
}

pub fn price_style(type_name: &str) -> PriceStyle {
    if FIXED_TYPES.contains(&type_name) {
        PriceStyle {
            label: FIXED_PRICE_LABEL,
            color: "#007bff",
        }
    } else if PERCENTAGE_TYPES.contains(&type_name) {
        PriceStyle {
            label: PERCENTAGE_LABEL,
            color: "#28a745",
        }
    } else {
        PriceStyle {
            label: "",
            color: "#6c757d",
        }
    }
}

/// Short and full spans plus a toggle link once `text` exceeds
/// [`TRUNCATE_AT`] characters.
pub fn show_more(text: &str, id_prefix: &str) -> Vec<Element> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= TRUNCATE_AT {
        return vec![Element::new("span").text(text)];
    }
    let short: String = text.chars().take(TRUNCATE_AT).collect();
    vec![
        Element::new("span")
            .attr("id", format!("{id_prefix}-short"))
            .text(format!("{short}...")),
        Element::new("span")
            .attr("id", format!("{id_prefix}-full"))
            .style("display", "none")
            .text(text),
        Element::new("a")
            .class("show-more-link")
            .attr("href", "#")
            .attr("data-id", id_prefix)
            .text(SHOW_MORE_LABEL),
    ]
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.date());
        }
    }
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Strings shorter than 8 characters or that fail to parse never expire.
pub fn is_expired(valid_until: &str, today: NaiveDate) -> bool {
    if valid_until.chars().count() < 8 {
        return false;
    }
    parse_date(valid_until).is_some_and(|date| date < today)
}

pub fn secure_link(url: Option<&str>) -> Option<&str> {
    let url = url?.trim();
    url.to_lowercase().starts_with("https").then_some(url)
}

#[derive(Debug, Clone)]
pub struct CardOptions {
    pub show_favorite_controls: bool,
    pub show_remove_favorite: bool,
    pub card_class: String,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            show_favorite_controls: true,
            show_remove_favorite: false,
            card_class: String::new(),
        }
    }
}

/// Notified synchronously after each card is appended to a container.
pub trait CardMountListener {
    fn card_mounted(&mut self, card: &mut Element, store: &dyn FavoritesStore);
}

impl CardMountListener for () {
    fn card_mounted(&mut self, _card: &mut Element, _store: &dyn FavoritesStore) {}
}

#[derive(Debug, Clone)]
pub struct CardRenderer {
    options: CardOptions,
    today: NaiveDate,
}

impl CardRenderer {
    pub fn new(options: CardOptions) -> Self {
        Self {
            options,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn render(&self, coupon: &Coupon, store: &dyn FavoritesStore) -> Element {
        render_card(
            coupon,
            &self.options,
            store.is_favorite(&coupon.discount_id),
            self.today,
        )
    }

    /// Returns how many cards were mounted.
    pub fn render_cards(
        &self,
        container: &mut Container,
        coupons: &[Coupon],
        store: &dyn FavoritesStore,
        listener: &mut dyn CardMountListener,
    ) -> usize {
        container.root.clear();
        if coupons.is_empty() {
            container.root.push(no_results());
            return 0;
        }

        for coupon in coupons {
            container.root.push(self.render(coupon, store));
            if let Some(card) = container.root.last_element_mut() {
                listener.card_mounted(card, store);
            }
        }
        container.delegate("click", "show-more-link");
        coupons.len()
    }
}

pub fn no_results() -> Element {
    Element::new("div")
        .class("no-results")
        .child(Element::new("i").class("bi bi-emoji-frown"))
        .child(Element::new("p").text(NO_RESULTS_TEXT))
}

pub fn render_card(
    coupon: &Coupon,
    options: &CardOptions,
    is_favorite: bool,
    today: NaiveDate,
) -> Element {
    let id = coupon.discount_id.as_str();
    let price = price_style(coupon.type_name());

    let mut card = Element::new("div")
        .class("discount-card")
        .class(&options.card_class)
        .attr("data-discount-id", id);
    if options.show_remove_favorite {
        card.add_class("favorite-item");
    }

    let mut meta = Element::new("span").class("discount-meta");
    if let Some(valid_until) = coupon.valid_until.as_deref().filter(|value| !value.is_empty()) {
        let mut item = Element::new("span")
            .class("meta-item")
            .child(Element::new("i").class("bi bi-calendar-event"))
            .text(format!(" בתוקף עד: {valid_until}"));
        if is_expired(valid_until, today) {
            item.push(Element::new("div").class("expired-label").text(EXPIRED_LABEL));
        }
        meta.push(item);
    }
    if let Some(limit) = coupon.usage_limit.filter(|limit| *limit != 0) {
        meta.push(
            Element::new("span")
                .class("meta-item")
                .child(Element::new("i").class("bi bi-ticket-perforated"))
                .text(format!(" כמות הנחות שנותרה: {limit}")),
        );
    }

    let details = Element::new("div")
        .class("discount-details-col")
        .child(
            Element::new("h4")
                .class("discount-title")
                .text(coupon.title.as_str())
                .child(meta),
        )
        .child(
            Element::new("div")
                .class("desc-block")
                .child(Element::new("strong").text("תיאור:"))
                .child(Element::new("div").children(show_more(&coupon.description, &format!("desc-{id}")))),
        )
        .child(
            Element::new("div")
                .class("terms-block")
                .child(Element::new("strong").text("תנאים והגבלות:"))
                .child(Element::new("div").children(show_more(
                    &coupon.terms_and_conditions,
                    &format!("terms-{id}"),
                ))),
        );

    card.push(
        Element::new("div")
            .class("discount-flex-row")
            .child(
                Element::new("div").class("discount-image-col").child(
                    Element::new("img")
                        .attr("src", coupon.image_link.as_str())
                        .attr("alt", coupon.title.as_str()),
                ),
            )
            .child(details),
    );

    let mut bottom = Element::new("div").class("discount-bottom-row").child(
        Element::new("div")
            .class("price-type-col")
            .child(
                Element::new("span")
                    .class("price-label-big")
                    .style("background", price.color)
                    .text(price.label),
            )
            .child(Element::new("span").class("price-value-big").text(coupon.price_text())),
    );
    if let Some(code) = coupon.coupon_code.as_deref().filter(|code| !code.is_empty()) {
        bottom.push(
            Element::new("div")
                .class("copy-code-btn")
                .attr("data-code", code)
                .text("Copy Code Coupon"),
        );
    }
    if let Some(link) = secure_link(coupon.provider_link.as_deref()) {
        bottom.push(
            Element::new("a")
                .class("site-link-btn provider-link-btn")
                .attr("href", link)
                .attr("target", "_blank")
                .text("Go To Provider"),
        );
    }
    if let Some(link) = secure_link(coupon.discount_link.as_deref()) {
        bottom.push(
            Element::new("a")
                .class("site-link-btn")
                .attr("href", link)
                .attr("target", "_blank")
                .text("Discount Link"),
        );
    }
    if options.show_favorite_controls {
        let mut button = Element::new("button")
            .class("fav-btn btn btn-outline-primary")
            .attr("type", "button")
            .attr("data-discount-id", id)
            .child(Element::new("span").class("fav-btn-text").text("Add"))
            .child(
                Element::new("span")
                    .class("like-icon")
                    .attr("data-discount-id", id)
                    .text("\u{2764}"),
            )
            .child(Element::new("span").text("Favorites"));
        if options.show_remove_favorite {
            button.set_attr("data-remove-on-unfavorite", "true");
        }
        bottom.push(Element::new("div").class("like-icon-col").child(button));
    }
    card.push(bottom);
    card.push(Element::new("hr"));

    if options.show_favorite_controls {
        sync_card_view(&mut card, is_favorite);
    }
    card
}

/// The element cards are rendered into, with its delegated listeners.
#[derive(Debug, Clone)]
pub struct Container {
    pub root: Element,
    delegations: Vec<(&'static str, &'static str)>,
}

impl Container {
    pub fn new(id: &str) -> Self {
        Self {
            root: Element::new("div").attr("id", id),
            delegations: Vec::new(),
        }
    }

    fn delegate(&mut self, event: &'static str, class: &'static str) {
        if !self.is_delegated(event, class) {
            self.delegations.push((event, class));
        }
    }

    pub fn is_delegated(&self, event: &str, class: &str) -> bool {
        self.delegations
            .iter()
            .any(|(bound_event, bound_class)| *bound_event == event && *bound_class == class)
    }

    pub fn delegation_count(&self) -> usize {
        self.delegations.len()
    }

    pub fn cards(&self) -> Vec<&Element> {
        self.root.all_by_class("discount-card")
    }

    /// Click on the show-more link with `data-id`. Returns false when the
    /// click had no effect (no delegated binding, or no such link).
    pub fn click_show_more(&mut self, data_id: &str) -> bool {
        if !self.is_delegated("click", "show-more-link") {
            return false;
        }
        let short_id = format!("{data_id}-short");
        let full_id = format!("{data_id}-full");
        let Some(collapsed) = self.root.by_id(&short_id).map(|short| !short.is_hidden()) else {
            return false;
        };

        if let Some(short) = self.root.by_id_mut(&short_id) {
            if collapsed {
                short.set_style("display", "none");
            } else {
                short.remove_style("display");
            }
        }
        if let Some(full) = self.root.by_id_mut(&full_id) {
            if collapsed {
                full.remove_style("display");
            } else {
                full.set_style("display", "none");
            }
        }
        if let Some(link) = self.root.find_mut(&|element| {
            element.has_class("show-more-link") && element.get_attr("data-id") == Some(data_id)
        }) {
            link.set_text(if collapsed { SHOW_LESS_LABEL } else { SHOW_MORE_LABEL });
        }
        true
    }
}
