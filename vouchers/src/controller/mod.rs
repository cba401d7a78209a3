pub mod state;

pub use state::{ControllerState, RefreshOutcome, RefreshPhase};

use crate::{
    aggregator::BalanceAggregator,
    config::Config,
    errors::RefreshError,
    types::{AggregateStats, ChainBalance, Pagination},
    wallet::{WalletAccount, WalletChange, WalletSession},
};
use futures::future::{AbortHandle, Abortable};
use providers::{BalanceSource, ChainRegistry, UpstreamError};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, timeout, MissedTickBehavior},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The fetch currently allowed to land, if any.
#[derive(Default)]
struct Flight {
    generation: u64,
    abort: Option<AbortHandle>,
    resume_phase: RefreshPhase,
}

#[derive(Default)]
struct Tasks {
    timer: Option<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
}

struct Inner {
    registry: Arc<dyn ChainRegistry>,
    source: Arc<dyn BalanceSource>,
    aggregator: BalanceAggregator,
    config: Config,
    state: watch::Sender<ControllerState>,
    flight: Mutex<Flight>,
    tasks: Mutex<Tasks>,
    wallet: Mutex<WalletAccount>,
    disposed: AtomicBool,
}

/// Owns the fetch lifecycle of the voucher balances of one wallet.
///
/// Every refresh cancels the one still in flight, so at most one fetch result
/// is ever written. Once a wallet session is attached, connecting (or switching
/// address or chain) triggers an immediate refresh followed by one every
/// `refresh_interval`.
#[derive(Clone)]
pub struct RefreshController {
    inner: Arc<Inner>,
}

impl RefreshController {
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        source: Arc<dyn BalanceSource>,
        config: Config,
    ) -> Self {
        let (state, _) = watch::channel(ControllerState::default());

        Self {
            inner: Arc::new(Inner {
                registry,
                source,
                aggregator: BalanceAggregator::new(config.unknown_chains),
                config,
                state,
                flight: Mutex::new(Flight::default()),
                tasks: Mutex::new(Tasks::default()),
                wallet: Mutex::new(WalletAccount::default()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    fn from_weak(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    pub fn stats(&self) -> AggregateStats {
        self.inner.state.borrow().stats()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn wallet(&self) -> WalletAccount {
        lock(&self.inner.wallet).clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Starts a refresh in the background.
    pub fn request_refresh(&self) -> JoinHandle<RefreshOutcome> {
        let controller = self.clone();

        tokio::spawn(async move { controller.refresh().await })
    }

    /// Cancels the refresh in flight, then fetches and aggregates a new snapshot.
    /// Resolves with what happened to this particular refresh.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (generation, registration, account) = {
            let mut flight = lock(&self.inner.flight);

            if self.is_disposed() {
                return RefreshOutcome::Cancelled;
            }

            match flight.abort.take() {
                Some(stale) => {
                    log::debug!("refresh #{} superseded", flight.generation);
                    stale.abort();
                }
                None => flight.resume_phase = self.inner.state.borrow().phase,
            }

            let (handle, registration) = AbortHandle::new_pair();
            flight.generation += 1;
            flight.abort = Some(handle);

            self.inner
                .state
                .send_modify(|state| state.phase = RefreshPhase::Fetching);

            (flight.generation, registration, self.wallet())
        };

        let result = Abortable::new(self.inner.fetch_with_timeout(account), registration).await;

        let mut flight = lock(&self.inner.flight);

        let result = match result {
            Ok(result) if flight.generation == generation && !self.is_disposed() => result,
            _ => return RefreshOutcome::Cancelled,
        };

        flight.abort = None;

        match result {
            Ok(chains) => {
                log::info!(
                    "refresh #{generation} landed with {} chain(s)",
                    chains.len()
                );
                self.inner.state.send_modify(|state| {
                    state.phase = RefreshPhase::Success;
                    state.chains = chains;
                    state.last_updated = Some(chrono::Utc::now());
                    state.error = None;
                });

                RefreshOutcome::Applied
            }
            Err(e) => {
                let msg = e.to_string();
                log::warn!("refresh #{generation} failed: {msg}");
                self.inner.state.send_modify(|state| {
                    state.phase = RefreshPhase::Failed;
                    state.error = Some(msg.clone());
                });

                RefreshOutcome::Failed(msg)
            }
        }
    }

    /// Clears the error message; the phase and snapshot stay as they are.
    pub fn dismiss_error(&self) {
        if self.is_disposed() {
            return;
        }

        self.inner
            .state
            .send_if_modified(|state| state.error.take().is_some());
    }

    /// Follows `session`: connecting, switching address or switching chain
    /// restart the refresh cycle, disconnecting stops it.
    pub fn attach(&self, session: &WalletSession) {
        if self.is_disposed() {
            return;
        }

        let mut rx = session.subscribe();
        let mut last = rx.borrow_and_update().clone();
        self.on_wallet(
            WalletChange::between(&WalletAccount::default(), &last),
            last.clone(),
        );

        let weak = Arc::downgrade(&self.inner);
        let watcher = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let account = rx.borrow_and_update().clone();
                let change = WalletChange::between(&last, &account);

                match Self::from_weak(&weak) {
                    Some(controller) => controller.on_wallet(change, account.clone()),
                    None => break,
                }

                last = account;
            }
        });

        if let Some(old) = lock(&self.inner.tasks).watcher.replace(watcher) {
            old.abort();
        }
    }

    fn on_wallet(&self, change: WalletChange, account: WalletAccount) {
        if self.is_disposed() {
            return;
        }

        *lock(&self.inner.wallet) = account;

        if change.restarts_refresh() {
            self.restart_timer();
        } else if change == WalletChange::Disconnected {
            self.stop_timer();
            self.cancel_in_flight();
        }
    }

    fn restart_timer(&self) {
        // tokio refuses a zero period
        let period = self
            .inner
            .config
            .refresh_interval
            .max(Duration::from_millis(1));
        let weak = Arc::downgrade(&self.inner);

        let timer = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match Self::from_weak(&weak) {
                    Some(controller) => controller.refresh().await,
                    None => break,
                };
            }
        });

        log::debug!("auto refresh every {period:?}");

        let mut tasks = lock(&self.inner.tasks);
        if self.is_disposed() {
            timer.abort();
        } else if let Some(old) = tasks.timer.replace(timer) {
            old.abort();
        }
    }

    fn stop_timer(&self) {
        if let Some(timer) = lock(&self.inner.tasks).timer.take() {
            timer.abort();
        }
    }

    fn cancel_in_flight(&self) {
        self.inner.cancel_flight(&mut lock(&self.inner.flight));
    }

    /// Stops the timer, the wallet watcher and the fetch in flight. Nothing is
    /// written to the state afterwards. Safe to call more than once.
    pub fn dispose(&self) {
        {
            let mut flight = lock(&self.inner.flight);

            if self.inner.disposed.swap(true, Ordering::SeqCst) {
                return;
            }

            self.inner.cancel_flight(&mut flight);
        }

        let mut tasks = lock(&self.inner.tasks);
        for task in [tasks.timer.take(), tasks.watcher.take()].into_iter().flatten() {
            task.abort();
        }

        log::info!("refresh controller disposed");
    }
}

impl Inner {
    /// Drops the fetch in flight and puts back the phase it started from.
    fn cancel_flight(&self, flight: &mut Flight) {
        if let Some(stale) = flight.abort.take() {
            stale.abort();
            flight.generation += 1;

            let resume = flight.resume_phase;
            self.state.send_if_modified(|state| {
                let fetching = state.phase == RefreshPhase::Fetching;
                if fetching {
                    state.phase = resume;
                }

                fetching
            });
        }
    }

    async fn fetch_with_timeout(
        &self,
        account: WalletAccount,
    ) -> Result<Vec<ChainBalance>, RefreshError> {
        match self.config.fetch_timeout {
            Some(limit) => timeout(limit, self.fetch(account))
                .await
                .unwrap_or(Err(UpstreamError::Timeout(limit).into())),
            None => self.fetch(account).await,
        }
    }

    async fn fetch(&self, account: WalletAccount) -> Result<Vec<ChainBalance>, RefreshError> {
        let wallet_address = account
            .address_hex()
            .ok_or(RefreshError::WalletNotConnected)?;
        let wallet_chain = account.chain_id.ok_or(RefreshError::UnknownWalletChain)?;

        let (router_address, chains) = futures::try_join!(
            self.registry.get_router_address(),
            self.registry.list_chains()
        )?;

        let user_chain = chains
            .iter()
            .find(|chain| chain.chain_id == wallet_chain)
            .ok_or(RefreshError::UnsupportedChain(wallet_chain))?;

        let mut records = vec![];
        let mut page = Pagination::first(self.config.page_size);

        for _ in 0..self.config.max_pages {
            let batch = self
                .source
                .query_balances(&router_address, &user_chain.chain_uid, &wallet_address, page)
                .await?;

            let last_page = (batch.len() as u32) < page.limit;
            records.extend(batch);

            if last_page {
                break;
            }

            page = page.next();
        }

        log::debug!(
            "{} balance record(s) for {wallet_address} on `{}`",
            records.len(),
            user_chain.chain_uid
        );

        Ok(self.aggregator.aggregate(&chains, records))
    }
}
