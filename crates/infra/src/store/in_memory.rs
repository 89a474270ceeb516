use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use pawmart_catalog::{Listing, ListingFilter, Page, SortOrder};
use pawmart_core::{DomainError, ListingId, OrderId, UserId};
use pawmart_orders::{NewOrder, Order};

use super::r#trait::{MarketStore, PlaceOrderError, StoreError};

#[derive(Debug, Default)]
struct Inner {
    listings: HashMap<ListingId, Listing>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory market store.
///
/// Intended for tests/dev. Atomicity comes from a single lock: `place_order`
/// finishes every check and every fallible step before it publishes any
/// mutation, so an error path can never leave a partial write.
#[derive(Debug, Default)]
pub struct InMemoryMarketStore {
    inner: RwLock<Inner>,
    #[cfg(test)]
    fail_before_publish: std::sync::atomic::AtomicBool,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `place_order` fail after validation but before anything
    /// is published, simulating a storage fault mid-commit.
    #[cfg(test)]
    pub fn fail_next_place_order(&self) {
        self.fail_before_publish
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

fn matches_filter(listing: &Listing, filter: &ListingFilter) -> bool {
    if !listing.is_available() {
        return false;
    }
    if let Some(species) = &filter.species {
        if !listing.species.eq_ignore_ascii_case(species) {
            return false;
        }
    }
    if let Some(needle) = &filter.search {
        let needle = needle.to_lowercase();
        let in_title = listing.title.to_lowercase().contains(&needle);
        let in_breed = listing
            .breed
            .as_ref()
            .is_some_and(|b| b.to_lowercase().contains(&needle));
        if !in_title && !in_breed {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if listing.price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if listing.price > max {
            return false;
        }
    }
    true
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn insert_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        inner.listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.listings.get(&id).cloned())
    }

    async fn search_listings(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;

        let mut hits: Vec<Listing> = inner
            .listings
            .values()
            .filter(|l| matches_filter(l, filter))
            .cloned()
            .collect();

        match filter.sort {
            SortOrder::Newest => hits.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => hits.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::PriceAsc => hits.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceDesc => hits.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(hits
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .collect())
    }

    async fn place_order(&self, draft: NewOrder) -> Result<Order, PlaceOrderError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        // Decide everything before touching state.
        let (level, order) = {
            let listing = inner
                .listings
                .get(&draft.listing_id)
                .ok_or(DomainError::NotFound)?;
            let level = listing.reserve(draft.quantity.get())?;
            let order = draft.into_order(listing.price)?;
            (level, order)
        };

        #[cfg(test)]
        if self
            .fail_before_publish
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(StoreError::Backend("injected storage fault".to_string()).into());
        }

        // Publish: infallible from here on, all under the same lock.
        if let Some(listing) = inner.listings.get_mut(&draft.listing_id) {
            listing.apply(level, draft.created_at);
        }
        inner.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
