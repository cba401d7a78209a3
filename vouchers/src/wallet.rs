use crate::types::{Address, ChainId};
use serde::Serialize;
use serde_with::skip_serializing_none;
use tokio::sync::watch;

#[skip_serializing_none]
#[derive(Serialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub native_balance: Option<String>,
}

impl WalletAccount {
    pub fn new(address: Address, chain_id: Option<ChainId>) -> Self {
        Self {
            address: Some(address),
            chain_id,
            native_balance: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Lowercase `0x` hex, the form the balance source expects.
    pub fn address_hex(&self) -> Option<String> {
        self.address.map(|address| format!("{address:#x}"))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WalletChange {
    Connected,
    AddressChanged,
    ChainChanged,
    Disconnected,
    Unchanged,
}

impl WalletChange {
    pub fn between(old: &WalletAccount, new: &WalletAccount) -> Self {
        match (old.address, new.address) {
            (None, Some(_)) => Self::Connected,
            (Some(_), None) => Self::Disconnected,
            (Some(a), Some(b)) if a != b => Self::AddressChanged,
            (Some(_), Some(_)) if old.chain_id != new.chain_id => Self::ChainChanged,
            _ => Self::Unchanged,
        }
    }

    /// Whether the change calls for a fresh refresh cycle.
    pub fn restarts_refresh(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::AddressChanged | Self::ChainChanged
        )
    }
}

/// Shared, observable state of the active wallet.
#[derive(Clone)]
pub struct WalletSession {
    account: watch::Sender<WalletAccount>,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletSession {
    pub fn new() -> Self {
        let (account, _) = watch::channel(WalletAccount::default());

        Self { account }
    }

    pub fn current(&self) -> WalletAccount {
        self.account.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletAccount> {
        self.account.subscribe()
    }

    pub fn connect(&self, account: WalletAccount) {
        self.update(|current| *current = account);
    }

    pub fn set_chain(&self, chain_id: Option<ChainId>) {
        self.update(|current| current.chain_id = chain_id);
    }

    pub fn disconnect(&self) {
        self.update(|current| *current = WalletAccount::default());
    }

    fn update(&self, modify: impl FnOnce(&mut WalletAccount)) {
        self.account.send_if_modified(|current| {
            let before = current.clone();
            modify(current);

            let changed = *current != before;
            if changed {
                log::info!(
                    "wallet {:?}: {:?} on chain {:?}",
                    WalletChange::between(&before, current),
                    current.address,
                    current.chain_id
                );
            }

            changed
        });
    }
}
