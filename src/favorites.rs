use crate::models::LocalStorage;
use tracing::warn;

pub const FAVORITES_KEY: &str = "favoriteCoupons";

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<&str>;
    fn set_item(&mut self, key: &str, value: String);
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// The set of favorited coupon ids, kept in insertion order.
pub trait FavoritesStore {
    fn favorite_ids(&self) -> Vec<String>;
    fn add_favorite(&mut self, id: &str);
    fn remove_favorite(&mut self, id: &str);

    fn is_favorite(&self, id: &str) -> bool {
        self.favorite_ids().iter().any(|fav| fav == id)
    }
}

impl<K: KeyValueStore> FavoritesStore for K {
    fn favorite_ids(&self) -> Vec<String> {
        let Some(raw) = self.get_item(FAVORITES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            Ok(values) => values.into_iter().filter_map(id_from_value).collect(),
            Err(err) => {
                warn!("ignoring malformed {FAVORITES_KEY} entry: {err}");
                Vec::new()
            }
        }
    }

    fn add_favorite(&mut self, id: &str) {
        let mut ids = self.favorite_ids();
        if ids.iter().any(|fav| fav == id) {
            return;
        }
        ids.push(id.to_string());
        write_ids(self, &ids);
    }

    fn remove_favorite(&mut self, id: &str) {
        let mut ids = self.favorite_ids();
        let before = ids.len();
        ids.retain(|fav| fav != id);
        if ids.len() != before {
            write_ids(self, &ids);
        }
    }
}

fn id_from_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) => Some(id),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn write_ids<K: KeyValueStore + ?Sized>(store: &mut K, ids: &[String]) {
    match serde_json::to_string(ids) {
        Ok(raw) => store.set_item(FAVORITES_KEY, raw),
        Err(err) => warn!("failed to encode favorites: {err}"),
    }
}
