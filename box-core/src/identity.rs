//! Player identity state machine.
//!
//! The identity collaborator (a wallet, in the browser client) reports
//! connect, disconnect and account-change notifications. This machine folds
//! them into a single current identity and tells the caller when the
//! coordinator should hear about a change.

use crate::IdentityError;

/// Current identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// No identity available; identity-gated actions fail
    #[default]
    Disconnected,
    /// Identity available
    Connected {
        /// Opaque identity string (wallet address)
        id: String,
    },
}

/// Notifications from the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// A wallet connected
    Connected(String),
    /// The wallet disconnected
    Disconnected,
    /// The active account changed
    AccountChanged(String),
}

/// Work for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityAction {
    /// Tell the coordinator the seat's identity is now this value
    Announce(Option<String>),
}

impl IdentityState {
    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: IdentityEvent) -> (Self, Vec<IdentityAction>) {
        match (self, event) {
            (Self::Connected { id }, IdentityEvent::Connected(new_id))
            | (Self::Connected { id }, IdentityEvent::AccountChanged(new_id))
                if id == new_id =>
            {
                (Self::Connected { id }, vec![])
            }
            (_, IdentityEvent::Connected(id)) | (_, IdentityEvent::AccountChanged(id)) => (
                Self::Connected { id: id.clone() },
                vec![IdentityAction::Announce(Some(id))],
            ),
            (Self::Connected { .. }, IdentityEvent::Disconnected) => {
                (Self::Disconnected, vec![IdentityAction::Announce(None)])
            }
            (Self::Disconnected, IdentityEvent::Disconnected) => (Self::Disconnected, vec![]),
        }
    }

    /// Whether an identity is available.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Current identity, if any.
    pub fn current_id(&self) -> Option<&str> {
        match self {
            Self::Connected { id } => Some(id),
            Self::Disconnected => None,
        }
    }

    /// Current identity, or `IdentityUnavailable`.
    pub fn require(&self) -> Result<&str, IdentityError> {
        self.current_id().ok_or(IdentityError::IdentityUnavailable)
    }
}

/// Shorten a long address for display: `0x1234...abcd`.
///
/// Identities of ten characters or fewer are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[test]
    fn starts_disconnected() {
        let state = IdentityState::default();
        assert!(!state.is_connected());
        assert_eq!(state.require(), Err(IdentityError::IdentityUnavailable));
    }

    #[test]
    fn connect_announces_identity() {
        let (state, actions) =
            IdentityState::Disconnected.on_event(IdentityEvent::Connected(ADDR.into()));
        assert_eq!(state.current_id(), Some(ADDR));
        assert_eq!(actions, vec![IdentityAction::Announce(Some(ADDR.into()))]);
    }

    #[test]
    fn account_change_announces_new_identity() {
        let state = IdentityState::Connected { id: "0xaaa".into() };
        let (state, actions) = state.on_event(IdentityEvent::AccountChanged("0xbbb".into()));
        assert_eq!(state.current_id(), Some("0xbbb"));
        assert_eq!(actions, vec![IdentityAction::Announce(Some("0xbbb".into()))]);
    }

    #[test]
    fn same_account_is_silent() {
        let state = IdentityState::Connected { id: "0xaaa".into() };
        let (state, actions) = state.on_event(IdentityEvent::AccountChanged("0xaaa".into()));
        assert!(state.is_connected());
        assert!(actions.is_empty());
    }

    #[test]
    fn disconnect_clears_identity() {
        let state = IdentityState::Connected { id: "0xaaa".into() };
        let (state, actions) = state.on_event(IdentityEvent::Disconnected);
        assert_eq!(state, IdentityState::Disconnected);
        assert_eq!(actions, vec![IdentityAction::Announce(None)]);

        let (_, actions) = state.on_event(IdentityEvent::Disconnected);
        assert!(actions.is_empty());
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        assert_eq!(short_address(ADDR), "0x5290...9EE7");
        assert_eq!(short_address("guest-1"), "guest-1");
    }
}
