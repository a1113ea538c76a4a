use crate::render::Container;
use maud::{DOCTYPE, PreEscaped, html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Listing,
    Favorites,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Page::Listing => "Coupons",
            Page::Favorites => "My Favorites",
        }
    }

    fn subtitle(self, count: usize) -> String {
        match self {
            Page::Listing => format!("{count} discounts available"),
            Page::Favorites => format!("Total Favorites: {count}"),
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Page::Listing => "listing",
            Page::Favorites => "favorites",
        }
    }
}

pub fn render_page(page: Page, container: &Container) -> String {
    let count = container.cards().len();
    let markup = html! {
        (DOCTYPE)
        html lang="he" dir="rtl" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title()) }
                link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css";
                style { (PreEscaped(CSS)) }
            }
            body {
                main data-page=(page.slug()) {
                    header {
                        h1 { (page.title()) }
                        p.subtitle #subtitle { (page.subtitle(count)) }
                        nav {
                            a href="/" { "Coupons" }
                            " · "
                            a href="/favorites" { "My Favorites" }
                        }
                    }
                    (container.root)
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    };
    markup.into_string()
}

const CSS: &str = r#"
  :root {
    --ink: #2b2a28;
    --muted: #6c757d;
    --card: #ffffff;
    --accent: #ff6b6b;
  }

  * {
    box-sizing: border-box;
  }

  body {
    margin: 0;
    background: #f6f7fb;
    color: var(--ink);
    font-family: "Segoe UI", "Arial", sans-serif;
    padding: 32px 18px 48px;
  }

  main {
    width: min(960px, 100%);
    margin: 0 auto;
    display: grid;
    gap: 24px;
  }

  header h1 {
    margin: 0;
  }

  .subtitle {
    margin: 4px 0 0;
    color: var(--muted);
  }

  nav a {
    color: var(--accent);
    font-weight: 600;
    text-decoration: none;
  }

  .discount-card {
    background: var(--card);
    border-radius: 12px;
    padding: 20px;
    box-shadow: 0 8px 24px rgba(0, 0, 0, 0.06);
    margin-bottom: 16px;
  }

  .discount-flex-row {
    display: flex;
    gap: 20px;
    flex-wrap: wrap;
  }

  .discount-image-col img {
    max-width: 400px;
    max-height: 400px;
    border-radius: 8px;
  }

  .discount-details-col {
    flex: 1;
    min-width: 240px;
  }

  .meta-item {
    display: inline-block;
    margin-inline-start: 12px;
    font-size: 0.85rem;
    color: var(--muted);
  }

  .expired-label {
    color: #dc3545;
    font-weight: 700;
  }

  .discount-bottom-row {
    display: flex;
    align-items: center;
    gap: 16px;
    flex-wrap: wrap;
    margin-top: 12px;
  }

  .price-label-big {
    color: white;
    padding: 3px 9px;
    border-radius: 16px;
    font-weight: bold;
    display: inline-block;
  }

  .price-value-big {
    font-size: 1.4rem;
    font-weight: 700;
    margin-inline-start: 6px;
  }

  .copy-code-btn,
  .site-link-btn {
    border: 1px solid #ddd;
    border-radius: 6px;
    padding: 6px 12px;
    cursor: pointer;
    color: inherit;
    text-decoration: none;
  }

  .copy-code-btn.copied {
    background: #28a745;
    color: white;
  }

  .fav-btn {
    display: flex;
    align-items: center;
    gap: 4px;
    font-weight: 500;
    color: var(--accent);
    direction: ltr;
    border: none;
    background: none;
    padding: 8px 12px;
    border-radius: 6px;
    cursor: pointer;
  }

  .like-icon {
    font-size: 1.5em;
    margin: 0 4px;
  }

  .no-results {
    text-align: center;
    color: var(--muted);
    padding: 48px 0;
  }

  .success-message {
    position: fixed;
    top: 20px;
    right: 20px;
    background: #28a745;
    color: white;
    padding: 12px 20px;
    border-radius: 8px;
    font-weight: bold;
    z-index: 10000;
    box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
    animation: slideIn 0.3s ease-out;
  }

  @keyframes slideIn {
    from { transform: translateX(100%); opacity: 0; }
    to { transform: translateX(0); opacity: 1; }
  }
"#;

const SCRIPT: &str = r#"
  const container = document.querySelector('main > div');
  const page = document.querySelector('main').dataset.page;
  const subtitleEl = document.getElementById('subtitle');

  const showSuccessMessage = (message) => {
    const existing = document.querySelector('.success-message');
    if (existing) {
      existing.remove();
    }
    const note = document.createElement('div');
    note.className = 'success-message';
    note.textContent = message;
    document.body.appendChild(note);
    setTimeout(() => note.remove(), 3000);
  };

  const post = async (url, discountId) => {
    const res = await fetch(url, {
      method: 'POST',
      headers: { 'content-type': 'application/json' },
      body: JSON.stringify({ discount_id: discountId })
    });
    if (!res.ok) {
      throw new Error(await res.text() || 'Request failed');
    }
    return res.json();
  };

  const toggleFavorite = async (button) => {
    const discountId = button.dataset.discountId;
    const card = button.closest('.discount-card');
    const removable = button.dataset.removeOnUnfavorite === 'true'
      && button.classList.contains('favorited');

    if (removable) {
      const data = await post('/api/favorites/remove', discountId);
      card.remove();
      subtitleEl.textContent = `Total Favorites: ${data.remaining}`;
      if (data.remaining === 0) {
        location.reload();
      }
      showSuccessMessage(data.message);
      return;
    }

    const data = await post('/api/favorites/toggle', discountId);
    swapCard(card, data.card_html);
    showSuccessMessage(data.message);
  };

  const swapCard = (card, html) => {
    const holder = document.createElement('div');
    holder.innerHTML = html;
    card.replaceWith(holder.firstElementChild);
  };

  const refreshStatus = async (card) => {
    const id = encodeURIComponent(card.dataset.discountId);
    const res = await fetch(`/api/favorites/${id}/status?view=${page}`);
    if (!res.ok) {
      return;
    }
    const data = await res.json();
    swapCard(card, data.card_html);
  };

  const toggleShowMore = (link) => {
    const id = link.dataset.id;
    const shortSpan = document.getElementById(`${id}-short`);
    const fullSpan = document.getElementById(`${id}-full`);
    if (shortSpan.style.display === 'none') {
      shortSpan.style.display = '';
      fullSpan.style.display = 'none';
      link.textContent = 'הצג עוד';
    } else {
      shortSpan.style.display = 'none';
      fullSpan.style.display = '';
      link.textContent = 'הצג פחות';
    }
  };

  container.addEventListener('click', (event) => {
    const link = event.target.closest('.show-more-link');
    if (link) {
      event.preventDefault();
      toggleShowMore(link);
      return;
    }

    const copy = event.target.closest('.copy-code-btn');
    if (copy) {
      navigator.clipboard.writeText(copy.dataset.code).then(() => {
        const original = copy.textContent;
        copy.textContent = '! Copied';
        copy.classList.add('copied');
        setTimeout(() => {
          copy.textContent = original;
          copy.classList.remove('copied');
        }, 2000);
      }).catch((err) => console.error('Failed to copy:', err));
      return;
    }

    const button = event.target.closest('.fav-btn');
    if (button) {
      toggleFavorite(button).catch((err) => console.error('Error updating favorites:', err));
    }
  });

  container.querySelectorAll('.discount-card[data-discount-id]').forEach((card) => {
    refreshStatus(card).catch(() => {});
  });
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coupon, LocalStorage};
    use crate::render::{CardOptions, CardRenderer};

    #[test]
    fn page_embeds_rendered_cards() {
        let coupons = vec![Coupon {
            discount_id: "p1".to_string(),
            title: "Books".to_string(),
            ..Coupon::default()
        }];
        let mut container = Container::new("coupon-list");
        CardRenderer::new(CardOptions::default()).render_cards(
            &mut container,
            &coupons,
            &LocalStorage::default(),
            &mut (),
        );

        let html = render_page(Page::Listing, &container);
        assert!(html.contains(r#"data-discount-id="p1""#));
        assert!(html.contains("1 discounts available"));
        assert!(html.contains(r#"data-page="listing""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn script_is_embedded_unescaped_and_refreshes_status() {
        let container = Container::new("coupon-list");
        let html = render_page(Page::Listing, &container);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("closest('.fav-btn')"));
        assert!(html.contains("/status?view=${page}"));
        assert!(html.contains("--accent: #ff6b6b;"));
    }

    #[test]
    fn favorites_page_shows_total() {
        let mut container = Container::new("favorites-list");
        CardRenderer::new(CardOptions::default()).render_cards(
            &mut container,
            &[],
            &LocalStorage::default(),
            &mut (),
        );
        let html = render_page(Page::Favorites, &container);
        assert!(html.contains("Total Favorites: 0"));
        assert!(html.contains("no-results"));
    }
}
