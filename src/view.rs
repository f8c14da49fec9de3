//! Browsing view state.
//!
//! The view owns the selection (sort key, order, limit, cuisine and borough
//! filters) and three fetched resources: the cuisine list, the borough list
//! and the restaurant list. Every fetch runs as its own tokio task and reports
//! back through a channel; the view applies completions one at a time when its
//! owner calls [`BrowsingView::process_next`] or [`BrowsingView::settle`], so
//! state is only ever mutated from one place.
//!
//! Each resource carries a generation counter. Dispatching a fetch bumps the
//! counter and aborts the previous task for that resource, and a completion
//! tagged with an older generation is dropped. The restaurant list therefore
//! always reflects the latest selection that got a response, no matter in
//! which order responses arrive.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

use crate::{
    client::{ApiClient, ClientError},
    data::{Limit, Order, Restaurant, Selection, SortBy},
    table,
};

/// Where the view fetches its resources from.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn cuisines(&self) -> Result<Vec<String>, ClientError>;
    async fn boroughs(&self) -> Result<Vec<String>, ClientError>;
    async fn restaurants(&self, selection: &Selection) -> Result<Vec<Restaurant>, ClientError>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn cuisines(&self) -> Result<Vec<String>, ClientError> {
        ApiClient::cuisines(self).await
    }

    async fn boroughs(&self) -> Result<Vec<String>, ClientError> {
        ApiClient::boroughs(self).await
    }

    async fn restaurants(&self, selection: &Selection) -> Result<Vec<Restaurant>, ClientError> {
        ApiClient::restaurants(self, selection).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Cuisines,
    Boroughs,
    Restaurants,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResourceStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

struct Slot<T> {
    value: T,
    status: ResourceStatus,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            status: ResourceStatus::Idle,
            generation: 0,
            task: None,
        }
    }
}

impl<T> Slot<T> {
    /// Supersede whatever is in flight and return the new generation.
    fn begin(&mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation += 1;
        self.status = ResourceStatus::Loading;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

enum Outcome {
    Cuisines(Result<Vec<String>, String>),
    Boroughs(Result<Vec<String>, String>),
    Restaurants(Result<Vec<Restaurant>, String>),
}

impl Outcome {
    fn interrupted(resource: Resource) -> Self {
        let reason = "fetch task ended without a response".to_string();
        match resource {
            Resource::Cuisines => Self::Cuisines(Err(reason)),
            Resource::Boroughs => Self::Boroughs(Err(reason)),
            Resource::Restaurants => Self::Restaurants(Err(reason)),
        }
    }

    fn resource(&self) -> Resource {
        match self {
            Self::Cuisines(_) => Resource::Cuisines,
            Self::Boroughs(_) => Resource::Boroughs,
            Self::Restaurants(_) => Resource::Restaurants,
        }
    }
}

struct Completion {
    generation: u64,
    outcome: Outcome,
}

/// Reports exactly one completion per fetch task. A task that unwinds or is
/// aborted before reporting sends an interrupted outcome on drop; for aborted
/// tasks that outcome is already stale and gets dropped by the view.
struct Reporter {
    tx: mpsc::UnboundedSender<Completion>,
    generation: u64,
    resource: Resource,
    sent: bool,
}

impl Reporter {
    fn send(mut self, outcome: Outcome) {
        self.sent = true;
        let _ = self.tx.send(Completion {
            generation: self.generation,
            outcome,
        });
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if !self.sent {
            let _ = self.tx.send(Completion {
                generation: self.generation,
                outcome: Outcome::interrupted(self.resource),
            });
        }
    }
}

pub struct BrowsingView<B: Backend> {
    backend: Arc<B>,
    selection: Selection,
    cuisines: Slot<Vec<String>>,
    boroughs: Slot<Vec<String>>,
    restaurants: Slot<Vec<Restaurant>>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<B: Backend> BrowsingView<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_selection(backend, Selection::default())
    }

    pub fn with_selection(backend: Arc<B>, selection: Selection) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            selection,
            cuisines: Slot::default(),
            boroughs: Slot::default(),
            restaurants: Slot::default(),
            tx,
            rx,
        }
    }

    /// Fetch the filter lists and the restaurants for the current selection,
    /// all three concurrently.
    pub fn mount(&mut self) {
        self.fetch_cuisines();
        self.fetch_boroughs();
        self.fetch_restaurants();
    }

    pub fn fetch_cuisines(&mut self) {
        let generation = self.cuisines.begin();
        let backend = self.backend.clone();
        let task = self.spawn(generation, Resource::Cuisines, async move {
            Outcome::Cuisines(backend.cuisines().await.map_err(|e| e.to_string()))
        });
        self.cuisines.task = Some(task);
    }

    pub fn fetch_boroughs(&mut self) {
        let generation = self.boroughs.begin();
        let backend = self.backend.clone();
        let task = self.spawn(generation, Resource::Boroughs, async move {
            Outcome::Boroughs(backend.boroughs().await.map_err(|e| e.to_string()))
        });
        self.boroughs.task = Some(task);
    }

    pub fn fetch_restaurants(&mut self) {
        let generation = self.restaurants.begin();
        let backend = self.backend.clone();
        let selection = self.selection.clone();
        debug!(generation, ?selection, "fetching restaurants");
        let task = self.spawn(generation, Resource::Restaurants, async move {
            let result = backend.restaurants(&selection).await;
            Outcome::Restaurants(result.map_err(|e| e.to_string()))
        });
        self.restaurants.task = Some(task);
    }

    fn spawn<F>(&self, generation: u64, resource: Resource, fetch: F) -> JoinHandle<()>
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let reporter = Reporter {
            tx: self.tx.clone(),
            generation,
            resource,
            sent: false,
        };
        tokio::spawn(async move {
            let outcome = fetch.await;
            reporter.send(outcome);
        })
    }

    // Each setter refetches only when the value actually changes.

    pub fn set_sort_by(&mut self, sort_by: SortBy) -> bool {
        self.update(|s| &mut s.sort_by, sort_by)
    }

    pub fn set_order(&mut self, order: Order) -> bool {
        self.update(|s| &mut s.order, order)
    }

    pub fn set_limit(&mut self, limit: Limit) -> bool {
        self.update(|s| &mut s.limit, limit)
    }

    pub fn set_filter_cuisine(&mut self, cuisine: impl Into<String>) -> bool {
        self.update(|s| &mut s.filter_cuisine, cuisine.into())
    }

    pub fn set_filter_borough(&mut self, borough: impl Into<String>) -> bool {
        self.update(|s| &mut s.filter_borough, borough.into())
    }

    fn update<T: PartialEq>(
        &mut self,
        field: impl FnOnce(&mut Selection) -> &mut T,
        value: T,
    ) -> bool {
        let slot = field(&mut self.selection);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.fetch_restaurants();
        true
    }

    /// Wait for the next completion and apply it. Returns the resource that
    /// changed, or `None` when nothing is loading or the completion was stale.
    pub async fn process_next(&mut self) -> Option<Resource> {
        if !self.is_loading() {
            return None;
        }
        let completion = self.rx.recv().await?;
        self.apply(completion)
    }

    /// Apply completions until no resource is loading.
    pub async fn settle(&mut self) {
        while self.is_loading() {
            self.process_next().await;
        }
    }

    fn apply(&mut self, completion: Completion) -> Option<Resource> {
        let Completion { generation, outcome } = completion;
        let resource = outcome.resource();

        let current = match resource {
            Resource::Cuisines => self.cuisines.is_current(generation),
            Resource::Boroughs => self.boroughs.is_current(generation),
            Resource::Restaurants => self.restaurants.is_current(generation),
        };
        if !current {
            debug!(?resource, generation, "dropping stale response");
            return None;
        }

        match outcome {
            Outcome::Cuisines(result) => apply_list(&mut self.cuisines, "cuisines", result),
            Outcome::Boroughs(result) => apply_list(&mut self.boroughs, "boroughs", result),
            Outcome::Restaurants(result) => {
                let slot = &mut self.restaurants;
                slot.task = None;
                match result {
                    Ok(restaurants) => {
                        slot.value = restaurants;
                        slot.status = ResourceStatus::Loaded;
                    }
                    Err(e) => {
                        error!("Error fetching restaurants: {e}");
                        slot.status = ResourceStatus::Failed(e);
                    }
                }
            }
        }

        Some(resource)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cuisines(&self) -> &[String] {
        &self.cuisines.value
    }

    pub fn boroughs(&self) -> &[String] {
        &self.boroughs.value
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants.value
    }

    pub fn status(&self, resource: Resource) -> &ResourceStatus {
        match resource {
            Resource::Cuisines => &self.cuisines.status,
            Resource::Boroughs => &self.boroughs.status,
            Resource::Restaurants => &self.restaurants.status,
        }
    }

    /// True while any of the three resources is still loading.
    pub fn is_loading(&self) -> bool {
        [&self.cuisines.status, &self.boroughs.status, &self.restaurants.status]
            .iter()
            .any(|status| **status == ResourceStatus::Loading)
    }

    pub fn render(&self) -> String {
        if self.is_loading() {
            format!("{}\n", table::SPINNER)
        } else {
            table::render(self.restaurants())
        }
    }
}

/// A failed filter list is reset to empty rather than left stale.
fn apply_list(slot: &mut Slot<Vec<String>>, what: &str, result: Result<Vec<String>, String>) {
    slot.task = None;
    match result {
        Ok(values) => {
            slot.value = values;
            slot.status = ResourceStatus::Loaded;
        }
        Err(e) => {
            error!("Failed to fetch {what}: {e}");
            slot.value = Vec::new();
            slot.status = ResourceStatus::Failed(e);
        }
    }
}

impl<B: Backend> Drop for BrowsingView<B> {
    fn drop(&mut self) {
        for task in [
            self.cuisines.task.take(),
            self.boroughs.task.take(),
            self.restaurants.task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}
