use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn, Instrument};

use super::optimistic::{self, Change, OptimisticMutation, RowOrder};
use super::{
    CacheClient, CacheEvent, CacheOptions, CacheView, Entity, MutationId, Pending, QueryStatus,
    Reconcile,
};
use crate::api::RemoteResource;
use crate::error::{CacheError, CancelledError, RequestError};
use crate::messages::{CacheRequest, Response};

const EVENT_CAPACITY: usize = 64;

/// Results of remote calls, fed back into the actor loop.
enum Completion<T: Entity> {
    Fetched {
        generation: u64,
        result: Result<Vec<T>, RequestError>,
    },
    Created {
        mutation: MutationId,
        result: Result<T, RequestError>,
    },
    Updated {
        mutation: MutationId,
        result: Result<T, RequestError>,
    },
    Deleted {
        mutation: MutationId,
        result: Result<(), RequestError>,
    },
}

struct InFlightFetch {
    generation: u64,
    handle: JoinHandle<()>,
}

struct InFlight<T: Entity, R> {
    mutation: OptimisticMutation<T>,
    respond_to: Response<R>,
}

/// Sole owner and writer of the cache entry.
pub struct CacheActor<T: Entity> {
    receiver: mpsc::Receiver<CacheRequest<T>>,
    completions_tx: mpsc::UnboundedSender<Completion<T>>,
    completions: mpsc::UnboundedReceiver<Completion<T>>,
    remote: Arc<dyn RemoteResource<T>>,
    options: CacheOptions,

    data: Option<Vec<T>>,
    order: RowOrder<T::Id>,
    version: u64,
    status: QueryStatus,
    error: Option<String>,
    fetched_at: Option<Instant>,
    invalidated: bool,

    fetch: Option<InFlightFetch>,
    generation: u64,
    waiters: Vec<Response<Arc<Vec<T>>>>,

    next_mutation: MutationId,
    creating: HashMap<MutationId, Response<T>>,
    updating: HashMap<MutationId, InFlight<T, T>>,
    deleting: HashMap<MutationId, InFlight<T, ()>>,

    view: watch::Sender<CacheView<T>>,
    events: broadcast::Sender<CacheEvent<T>>,
    accepting: bool,
}

impl<T: Entity> CacheActor<T> {
    pub fn new(remote: Arc<dyn RemoteResource<T>>, options: CacheOptions) -> (Self, CacheClient<T>) {
        let (sender, receiver) = mpsc::channel(options.buffer_size.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(CacheView::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let client = CacheClient::new(sender, view_rx, events.clone());
        let actor = Self {
            receiver,
            completions_tx,
            completions,
            remote,
            options,
            data: None,
            order: RowOrder::default(),
            version: 0,
            status: QueryStatus::Idle,
            error: None,
            fetched_at: None,
            invalidated: false,
            fetch: None,
            generation: 0,
            waiters: Vec::new(),
            next_mutation: 1,
            creating: HashMap::new(),
            updating: HashMap::new(),
            deleting: HashMap::new(),
            view,
            events,
            accepting: true,
        };
        (actor, client)
    }

    #[instrument(name = "cache_actor", skip(self))]
    pub async fn run(mut self) {
        info!("CacheActor starting");

        loop {
            if !self.accepting && self.is_idle() {
                break;
            }
            tokio::select! {
                msg = self.receiver.recv(), if self.accepting => match msg {
                    Some(msg) => self.handle_request(msg),
                    None => {
                        debug!("All clients dropped");
                        self.stop_accepting();
                    }
                },
                Some(done) = self.completions.recv() => self.handle_completion(done),
            }
        }

        info!("CacheActor stopped");
    }

    fn handle_request(&mut self, msg: CacheRequest<T>) {
        match msg {
            CacheRequest::Read { respond_to } => self.handle_read(respond_to),
            CacheRequest::Peek { respond_to } => {
                let _ = respond_to.send(Ok(self.data.clone().map(Arc::new)));
            }
            CacheRequest::Invalidate { respond_to } => {
                self.invalidate();
                let _ = respond_to.send(Ok(()));
            }
            CacheRequest::Create {
                payload,
                respond_to,
            } => self.handle_create(payload, respond_to),
            CacheRequest::Update {
                id,
                patch,
                respond_to,
            } => self.handle_update(id, patch, respond_to),
            CacheRequest::Delete { id, respond_to } => self.handle_delete(id, respond_to),
            CacheRequest::Shutdown => {
                info!("CacheActor shutting down");
                self.stop_accepting();
            }
        }
    }

    fn handle_completion(&mut self, done: Completion<T>) {
        match done {
            Completion::Fetched { generation, result } => self.settle_fetch(generation, result),
            Completion::Created { mutation, result } => self.settle_create(mutation, result),
            Completion::Updated { mutation, result } => self.settle_update(mutation, result),
            Completion::Deleted { mutation, result } => self.settle_delete(mutation, result),
        }
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    fn handle_read(&mut self, respond_to: Response<Arc<Vec<T>>>) {
        let stale = self.is_stale();
        match &self.data {
            Some(items) => {
                let _ = respond_to.send(Ok(Arc::new(items.clone())));
                if stale {
                    debug!("Serving stale entry, refetching in background");
                    self.start_fetch_if_safe();
                }
            }
            None => {
                self.waiters.push(respond_to);
                self.start_fetch_if_safe();
            }
        }
    }

    fn start_fetch_if_safe(&mut self) {
        if !self.accepting || self.fetch.is_some() || self.has_optimistic_in_flight() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let remote = Arc::clone(&self.remote);
        let tx = self.completions_tx.clone();
        let handle = tokio::spawn(
            async move {
                let result = remote.list().await;
                let _ = tx.send(Completion::Fetched { generation, result });
            }
            .in_current_span(),
        );

        debug!(generation, "Fetch started");
        self.fetch = Some(InFlightFetch { generation, handle });
        if self.data.is_none() {
            self.status = QueryStatus::Loading;
        }
        self.publish();
    }

    fn cancel_fetch(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.handle.abort();
            debug!(generation = fetch.generation, "Cancelled in-flight read");
            if self.data.is_none() && self.waiters.is_empty() {
                self.status = QueryStatus::Idle;
            }
            self.publish();
        }
    }

    fn settle_fetch(&mut self, generation: u64, result: Result<Vec<T>, RequestError>) {
        match &self.fetch {
            Some(fetch) if fetch.generation == generation => {}
            _ => {
                debug!(generation, error = %CancelledError, "Dropping superseded fetch result");
                return;
            }
        }
        self.fetch = None;

        match result {
            Ok(items) => {
                let (items, dropped) = optimistic::dedupe(items);
                if dropped > 0 {
                    warn!(dropped, "Server returned duplicate ids");
                }
                let count = items.len();
                let shared = Arc::new(items.clone());
                self.order.reset(items.iter().map(|item| item.id()));
                self.data = Some(items);
                self.version += 1;
                self.status = QueryStatus::Success;
                self.error = None;
                self.fetched_at = Some(Instant::now());
                self.invalidated = false;
                info!(count, "Fetched collection");
                self.publish();

                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(Ok(Arc::clone(&shared)));
                }
                let _ = self.events.send(CacheEvent::Fetched { count });
            }
            Err(err) => {
                error!(error = %err, "Fetch failed");
                self.status = QueryStatus::Error;
                self.error = Some(err.message.clone());
                self.publish();

                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(Err(CacheError::Request(err.clone())));
                }
                let _ = self.events.send(CacheEvent::FetchFailed { error: err });
            }
        }
    }

    fn invalidate(&mut self) {
        self.invalidated = true;
        if self.data.is_none() && self.waiters.is_empty() {
            return;
        }
        if self.has_optimistic_in_flight() {
            debug!("Refetch deferred until optimistic writes settle");
            return;
        }
        self.cancel_fetch();
        self.start_fetch_if_safe();
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    #[instrument(skip(self, payload, respond_to))]
    fn handle_create(&mut self, payload: T::CreatePayload, respond_to: Response<Pending<T>>) {
        if let Err(e) = T::validate_create(&payload) {
            warn!(error = %e, "Create rejected by validation");
            let _ = respond_to.send(Err(e.into()));
            return;
        }

        let mutation = self.next_mutation_id();
        let (settle_tx, settle_rx) = tokio::sync::oneshot::channel();
        self.creating.insert(mutation, settle_tx);

        let remote = Arc::clone(&self.remote);
        let tx = self.completions_tx.clone();
        tokio::spawn(
            async move {
                let result = remote.create(&payload).await;
                let _ = tx.send(Completion::Created { mutation, result });
            }
            .in_current_span(),
        );

        debug!(mutation, "Create dispatched");
        let _ = respond_to.send(Ok(Pending::new(mutation, settle_rx)));
    }

    #[instrument(fields(id = %id), skip(self, patch, respond_to))]
    fn handle_update(&mut self, id: T::Id, patch: T::Patch, respond_to: Response<Pending<T>>) {
        if let Err(e) = T::validate_patch(&patch) {
            warn!(error = %e, "Update rejected by validation");
            let _ = respond_to.send(Err(e.into()));
            return;
        }

        self.cancel_fetch();
        self.version += 1;
        let speculative =
            OptimisticMutation::begin(&mut self.data, &id, Change::Patch(&patch), self.version);
        debug!(speculation = ?speculative.speculation(), "Applied optimistic update");
        self.publish();

        let mutation = self.next_mutation_id();
        let (settle_tx, settle_rx) = tokio::sync::oneshot::channel();
        self.updating.insert(
            mutation,
            InFlight {
                mutation: speculative,
                respond_to: settle_tx,
            },
        );

        let remote = Arc::clone(&self.remote);
        let tx = self.completions_tx.clone();
        tokio::spawn(
            async move {
                let result = remote.update(&id, &patch).await;
                let _ = tx.send(Completion::Updated { mutation, result });
            }
            .in_current_span(),
        );

        let _ = respond_to.send(Ok(Pending::new(mutation, settle_rx)));
    }

    #[instrument(fields(id = %id), skip(self, respond_to))]
    fn handle_delete(&mut self, id: T::Id, respond_to: Response<Pending<()>>) {
        self.cancel_fetch();
        self.version += 1;
        let speculative = OptimisticMutation::begin(&mut self.data, &id, Change::Remove, self.version);
        debug!(speculation = ?speculative.speculation(), "Applied optimistic delete");
        self.publish();

        let mutation = self.next_mutation_id();
        let (settle_tx, settle_rx) = tokio::sync::oneshot::channel();
        self.deleting.insert(
            mutation,
            InFlight {
                mutation: speculative,
                respond_to: settle_tx,
            },
        );

        let remote = Arc::clone(&self.remote);
        let tx = self.completions_tx.clone();
        tokio::spawn(
            async move {
                let result = remote.delete(&id).await;
                let _ = tx.send(Completion::Deleted { mutation, result });
            }
            .in_current_span(),
        );

        let _ = respond_to.send(Ok(Pending::new(mutation, settle_rx)));
    }

    fn settle_create(&mut self, mutation: MutationId, result: Result<T, RequestError>) {
        let Some(respond_to) = self.creating.remove(&mutation) else {
            error!(mutation, "Settlement for unknown create");
            return;
        };

        let outcome = match result {
            Ok(record) => {
                info!(mutation, id = %record.id(), "Create committed");
                self.version += 1;
                if optimistic::commit_record(&mut self.data, record.clone()) {
                    self.order.append(record.id());
                }
                if self.options.reconcile == Reconcile::ServerRecord && self.fetch.is_some() {
                    // an older fetch would not contain the new record
                    self.cancel_fetch();
                    self.start_fetch_if_safe();
                }
                let _ = self.events.send(CacheEvent::Created {
                    record: record.clone(),
                });
                Ok(record)
            }
            Err(err) => {
                warn!(mutation, error = %err, "Create failed");
                let _ = self.events.send(CacheEvent::CreateFailed { error: err.clone() });
                Err(CacheError::Request(err))
            }
        };

        self.publish();
        self.reconcile();
        let _ = respond_to.send(outcome);
    }

    fn settle_update(&mut self, mutation: MutationId, result: Result<T, RequestError>) {
        let Some(in_flight) = self.updating.remove(&mutation) else {
            error!(mutation, "Settlement for unknown update");
            return;
        };
        let id = in_flight.mutation.id().clone();

        let outcome = match result {
            Ok(record) => {
                info!(mutation, id = %id, "Update committed");
                if self.options.reconcile == Reconcile::ServerRecord {
                    self.version += 1;
                    if optimistic::commit_record(&mut self.data, record.clone()) {
                        self.order.append(record.id());
                    }
                }
                let _ = self.events.send(CacheEvent::Updated { id });
                Ok(record)
            }
            Err(err) => {
                let revert = in_flight.mutation.revert(&mut self.data, self.version, &self.order);
                self.version += 1;
                warn!(mutation, id = %id, error = %err, ?revert, "Update failed, rolled back");
                let _ = self.events.send(CacheEvent::UpdateRolledBack {
                    id,
                    error: err.clone(),
                });
                Err(CacheError::Request(err))
            }
        };

        self.publish();
        self.reconcile();
        let _ = in_flight.respond_to.send(outcome);
    }

    fn settle_delete(&mut self, mutation: MutationId, result: Result<(), RequestError>) {
        let Some(in_flight) = self.deleting.remove(&mutation) else {
            error!(mutation, "Settlement for unknown delete");
            return;
        };
        let id = in_flight.mutation.id().clone();

        let outcome = match result {
            Ok(()) => {
                info!(mutation, id = %id, "Delete committed");
                self.order.forget(&id);
                let _ = self.events.send(CacheEvent::Deleted { id });
                Ok(())
            }
            Err(err) => {
                let revert = in_flight.mutation.revert(&mut self.data, self.version, &self.order);
                self.version += 1;
                warn!(mutation, id = %id, error = %err, ?revert, "Delete failed, rolled back");
                let _ = self.events.send(CacheEvent::DeleteRolledBack {
                    id,
                    error: err.clone(),
                });
                Err(CacheError::Request(err))
            }
        };

        self.publish();
        self.reconcile();
        let _ = in_flight.respond_to.send(outcome);
    }

    /// Runs after every settlement, success or failure.
    fn reconcile(&mut self) {
        match self.options.reconcile {
            Reconcile::Refetch => self.invalidate(),
            Reconcile::ServerRecord => {
                if !self.waiters.is_empty() {
                    self.start_fetch_if_safe();
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Bookkeeping
    // ---------------------------------------------------------------------

    fn next_mutation_id(&mut self) -> MutationId {
        let id = self.next_mutation;
        self.next_mutation += 1;
        id
    }

    fn has_optimistic_in_flight(&self) -> bool {
        !self.updating.is_empty() || !self.deleting.is_empty()
    }

    fn is_idle(&self) -> bool {
        !self.has_optimistic_in_flight() && self.creating.is_empty()
    }

    fn is_stale(&self) -> bool {
        if self.data.is_none() || self.invalidated {
            return true;
        }
        match self.fetched_at {
            Some(at) => at.elapsed() >= self.options.stale_after,
            None => true,
        }
    }

    fn stop_accepting(&mut self) {
        self.accepting = false;
        if let Some(fetch) = self.fetch.take() {
            fetch.handle.abort();
        }
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(CacheError::ActorCommunicationError(
                "Actor stopped".to_string(),
            )));
        }
        self.publish();
    }

    fn publish(&self) {
        self.view.send_replace(CacheView {
            data: self.data.clone().map(Arc::new),
            status: self.status.clone(),
            is_fetching: self.fetch.is_some(),
            error: self.error.clone(),
            version: self.version,
        });
    }
}
