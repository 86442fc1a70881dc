//! Wallet lifecycle state machine

use std::fmt;

use crate::error::Error;

/// Lifecycle states of a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// Constructed, nothing loaded
    Uninitialized,
    /// Loading stores and keysets
    Initializing,
    /// Idle and able to transact
    Ready,
    /// An operation holds the wallet
    Transacting,
    /// A restore scan is running
    Restoring,
    /// Reconciling proof state with the mint
    Syncing,
    /// Locked by the user; secrets unavailable
    Locked,
    /// A fatal error was recorded
    Error,
    /// Shutdown requested; no further operations
    ShuttingDown,
}

impl fmt::Display for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Transacting => "transacting",
            Self::Restoring => "restoring",
            Self::Syncing => "syncing",
            Self::Locked => "locked",
            Self::Error => "error",
            Self::ShuttingDown => "shutting_down",
        };
        write!(f, "{s}")
    }
}

/// Events that drive [`WalletState`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    /// Begin initialization
    Initialize,
    /// Initialization finished
    InitializeComplete,
    /// An operation begins
    BeginTransaction,
    /// The operation finished, successfully or not
    TransactionComplete,
    /// A restore scan begins
    BeginRestore,
    /// The restore scan finished
    RestoreComplete,
    /// A reconciliation sync begins
    BeginSync,
    /// The sync finished
    SyncComplete,
    /// Lock the wallet
    Lock,
    /// Unlock the wallet
    Unlock,
    /// Record a fatal failure
    Fail,
    /// Recover from the error state
    Recover,
    /// Shut the wallet down
    Shutdown,
}

impl fmt::Display for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialize => "initialize",
            Self::InitializeComplete => "initialize_complete",
            Self::BeginTransaction => "begin_transaction",
            Self::TransactionComplete => "transaction_complete",
            Self::BeginRestore => "begin_restore",
            Self::RestoreComplete => "restore_complete",
            Self::BeginSync => "begin_sync",
            Self::SyncComplete => "sync_complete",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Fail => "fail",
            Self::Recover => "recover",
            Self::Shutdown => "shutdown",
        };
        write!(f, "{s}")
    }
}

impl WalletState {
    /// Apply `event`, returning the next state or rejecting the transition
    pub fn transition(self, event: WalletEvent) -> Result<WalletState, Error> {
        use WalletEvent::*;
        use WalletState::*;

        let next = match (self, event) {
            (_, Shutdown) => ShuttingDown,
            (_, Fail) => Error,

            (Uninitialized, Initialize) => Initializing,
            (Initializing, InitializeComplete) => Ready,

            (Ready, BeginTransaction) => Transacting,
            (Transacting, TransactionComplete) => Ready,

            (Ready, BeginRestore) => Restoring,
            (Restoring, RestoreComplete) => Ready,

            (Ready, BeginSync) => Syncing,
            (Syncing, SyncComplete) => Ready,

            (Ready, Lock) => Locked,
            (Locked, Unlock) => Ready,

            (Error, Recover) => Ready,

            (from, event) => {
                return Err(crate::error::Error::InvalidTransition {
                    from: from.to_string(),
                    event: event.to_string(),
                })
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = WalletState::Uninitialized;
        let state = state.transition(WalletEvent::Initialize).unwrap();
        let state = state.transition(WalletEvent::InitializeComplete).unwrap();
        assert_eq!(state, WalletState::Ready);

        let state = state.transition(WalletEvent::BeginTransaction).unwrap();
        assert_eq!(state, WalletState::Transacting);
        let state = state.transition(WalletEvent::TransactionComplete).unwrap();
        assert_eq!(state, WalletState::Ready);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        assert!(WalletState::Uninitialized
            .transition(WalletEvent::BeginTransaction)
            .is_err());
        assert!(WalletState::Ready
            .transition(WalletEvent::InitializeComplete)
            .is_err());
        assert!(WalletState::Locked
            .transition(WalletEvent::BeginTransaction)
            .is_err());
        assert!(WalletState::Transacting
            .transition(WalletEvent::BeginRestore)
            .is_err());
    }

    #[test]
    fn test_lock_unlock() {
        let state = WalletState::Ready.transition(WalletEvent::Lock).unwrap();
        assert_eq!(state, WalletState::Locked);
        let state = state.transition(WalletEvent::Unlock).unwrap();
        assert_eq!(state, WalletState::Ready);
    }

    #[test]
    fn test_shutdown_from_anywhere() {
        for state in [
            WalletState::Uninitialized,
            WalletState::Ready,
            WalletState::Transacting,
            WalletState::Locked,
            WalletState::Error,
        ] {
            assert_eq!(
                state.transition(WalletEvent::Shutdown).unwrap(),
                WalletState::ShuttingDown
            );
        }
    }

    #[test]
    fn test_error_recovery() {
        let state = WalletState::Transacting.transition(WalletEvent::Fail).unwrap();
        assert_eq!(state, WalletState::Error);
        let state = state.transition(WalletEvent::Recover).unwrap();
        assert_eq!(state, WalletState::Ready);
    }
}
