//! Onboarding state machine.
//!
//! Pure transition function for the set-password / choose-account flow that
//! gates a pending auth request. Side effects are returned as actions and
//! executed by the flow controller in `wo-app`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::analytics;
use crate::auth_request::ResolveOutcome;
use crate::password::PolicyViolation;
use crate::ports::KeyDerivationError;
use crate::routes::RouteUrl;

/// Onboarding flow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OnboardingState {
    /// Page not mounted yet.
    Idle,
    /// Set-password form shown, possibly with feedback from the last submit.
    AwaitingPassword { error: Option<OnboardingError> },
    /// `set_password` in flight.
    DerivingKey,
    /// Key material available; deciding which account answers the request.
    ResolvingAccount { view: ResolutionView },
    Completed,
    Cancelled,
}

impl OnboardingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OnboardingState::Completed | OnboardingState::Cancelled)
    }
}

/// Render branch of [`OnboardingState::ResolvingAccount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolutionView {
    /// Accounts loading or resolver call in flight.
    Resolving,
    /// Waiting for the user to pick one of several accounts.
    ChooseAccount { account_count: usize },
    /// A request is pending but no account could be decrypted.
    NoAccounts,
}

/// Feedback shown on the set-password form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum OnboardingError {
    #[error("password rejected: {0}")]
    Validation(ValidationError),
    #[error("could not protect the secret key: {reason}")]
    KeyDerivation { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum ValidationError {
    #[error("password is empty")]
    Empty,
    #[error("passwords do not match")]
    Mismatch,
    #[error("password does not meet the strength requirements")]
    Weak { reasons: BTreeSet<PolicyViolation> },
}

/// Events that drive the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingEvent {
    /// Set-password page mounted.
    Mount { wallet_exists: bool },
    /// Header close / history back.
    Back,
    /// Form submitted; validation was recomputed from the current value.
    SubmitPassword {
        validation: Result<(), ValidationError>,
    },
    KeyDerived,
    KeyDerivationFailed { error: KeyDerivationError },
    AccountsLoaded {
        account_count: usize,
        has_pending_request: bool,
    },
    SelectAccount { index: usize },
    Resolved { outcome: ResolveOutcome },
    /// The request was resolved by another trigger (tab teardown).
    ResolvedElsewhere,
    Cancel,
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingAction {
    TrackPage { action: &'static str, path: &'static str },
    Track { event: &'static str },
    DeriveKey,
    LoadAccounts,
    Navigate { route: RouteUrl },
    CompleteRequest { account_index: usize },
    CancelRequest,
}

pub struct OnboardingStateMachine;

impl OnboardingStateMachine {
    pub fn transition(
        state: OnboardingState,
        event: OnboardingEvent,
    ) -> (OnboardingState, Vec<OnboardingAction>) {
        match (state, event) {
            (state, OnboardingEvent::Cancel) if state.is_terminal() => (state, Vec::new()),
            (state, OnboardingEvent::ResolvedElsewhere) if state.is_terminal() => {
                (state, Vec::new())
            }
            (_, OnboardingEvent::Cancel) => (
                OnboardingState::Cancelled,
                vec![OnboardingAction::CancelRequest],
            ),
            (_, OnboardingEvent::ResolvedElsewhere) => (OnboardingState::Cancelled, Vec::new()),

            (OnboardingState::Idle, OnboardingEvent::Mount { wallet_exists: true }) => (
                OnboardingState::Idle,
                vec![OnboardingAction::Navigate {
                    route: RouteUrl::Home,
                }],
            ),
            (OnboardingState::Idle, OnboardingEvent::Mount { wallet_exists: false }) => (
                OnboardingState::AwaitingPassword { error: None },
                vec![OnboardingAction::TrackPage {
                    action: analytics::PAGE_VIEW,
                    path: RouteUrl::SetPassword.path(),
                }],
            ),

            (OnboardingState::AwaitingPassword { .. }, OnboardingEvent::Back) => (
                OnboardingState::Idle,
                vec![OnboardingAction::Navigate {
                    route: RouteUrl::Back,
                }],
            ),
            (
                OnboardingState::AwaitingPassword { .. },
                OnboardingEvent::SubmitPassword { validation },
            ) => match validation {
                Ok(()) => (
                    OnboardingState::DerivingKey,
                    vec![
                        OnboardingAction::Track {
                            event: analytics::SUBMIT_VALID_PASSWORD,
                        },
                        OnboardingAction::DeriveKey,
                    ],
                ),
                Err(error) => (
                    OnboardingState::AwaitingPassword {
                        error: Some(OnboardingError::Validation(error)),
                    },
                    Vec::new(),
                ),
            },

            (OnboardingState::DerivingKey, OnboardingEvent::KeyDerived) => (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::Resolving,
                },
                vec![OnboardingAction::LoadAccounts],
            ),
            (OnboardingState::DerivingKey, OnboardingEvent::KeyDerivationFailed { error }) => (
                OnboardingState::AwaitingPassword {
                    error: Some(OnboardingError::KeyDerivation {
                        reason: error.to_string(),
                    }),
                },
                Vec::new(),
            ),

            (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::Resolving,
                },
                OnboardingEvent::AccountsLoaded {
                    account_count,
                    has_pending_request,
                },
            ) => Self::on_accounts_loaded(account_count, has_pending_request),

            (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::ChooseAccount { account_count },
                },
                OnboardingEvent::SelectAccount { index },
            ) => {
                if index >= account_count {
                    return (
                        OnboardingState::ResolvingAccount {
                            view: ResolutionView::ChooseAccount { account_count },
                        },
                        Vec::new(),
                    );
                }
                (
                    OnboardingState::ResolvingAccount {
                        view: ResolutionView::Resolving,
                    },
                    vec![OnboardingAction::CompleteRequest {
                        account_index: index,
                    }],
                )
            }

            (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::Resolving,
                },
                OnboardingEvent::Resolved { outcome },
            ) => match outcome {
                ResolveOutcome::Completed { .. } | ResolveOutcome::NoPendingRequest => {
                    (OnboardingState::Completed, Vec::new())
                }
                ResolveOutcome::Cancelled | ResolveOutcome::AlreadyResolved => {
                    (OnboardingState::Cancelled, Vec::new())
                }
            },

            (state, _event) => (state, Vec::new()),
        }
    }

    fn on_accounts_loaded(
        account_count: usize,
        has_pending_request: bool,
    ) -> (OnboardingState, Vec<OnboardingAction>) {
        if !has_pending_request {
            // password set for local use only
            return (
                OnboardingState::Completed,
                vec![OnboardingAction::Navigate {
                    route: RouteUrl::Home,
                }],
            );
        }
        match account_count {
            0 => (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::NoAccounts,
                },
                Vec::new(),
            ),
            1 => (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::Resolving,
                },
                vec![OnboardingAction::CompleteRequest { account_index: 0 }],
            ),
            account_count => (
                OnboardingState::ResolvingAccount {
                    view: ResolutionView::ChooseAccount { account_count },
                },
                vec![OnboardingAction::Navigate {
                    route: RouteUrl::ChooseAccount,
                }],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolving() -> OnboardingState {
        OnboardingState::ResolvingAccount {
            view: ResolutionView::Resolving,
        }
    }

    #[test]
    fn mount_shows_set_password_and_tracks_page_view() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::Idle,
            OnboardingEvent::Mount {
                wallet_exists: false,
            },
        );
        assert_eq!(next, OnboardingState::AwaitingPassword { error: None });
        assert_eq!(
            actions,
            vec![OnboardingAction::TrackPage {
                action: "view",
                path: "/set-password"
            }]
        );
    }

    #[test]
    fn mount_with_existing_wallet_redirects_home() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::Idle,
            OnboardingEvent::Mount {
                wallet_exists: true,
            },
        );
        assert_eq!(next, OnboardingState::Idle);
        assert_eq!(
            actions,
            vec![OnboardingAction::Navigate {
                route: RouteUrl::Home
            }]
        );
    }

    #[test]
    fn failing_submit_stays_awaiting_password() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::AwaitingPassword { error: None },
            OnboardingEvent::SubmitPassword {
                validation: Err(ValidationError::Weak {
                    reasons: [PolicyViolation::CommonPassword].into_iter().collect(),
                }),
            },
        );
        assert!(matches!(
            next,
            OnboardingState::AwaitingPassword {
                error: Some(OnboardingError::Validation(ValidationError::Weak { .. }))
            }
        ));
        assert!(actions.is_empty());
    }

    #[test]
    fn passing_submit_derives_key() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::AwaitingPassword { error: None },
            OnboardingEvent::SubmitPassword { validation: Ok(()) },
        );
        assert_eq!(next, OnboardingState::DerivingKey);
        assert_eq!(
            actions,
            vec![
                OnboardingAction::Track {
                    event: "submit_valid_password"
                },
                OnboardingAction::DeriveKey
            ]
        );
    }

    #[test]
    fn key_derivation_failure_returns_to_form_with_error() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::DerivingKey,
            OnboardingEvent::KeyDerivationFailed {
                error: KeyDerivationError::Failed("disk full".to_string()),
            },
        );
        assert!(matches!(
            next,
            OnboardingState::AwaitingPassword {
                error: Some(OnboardingError::KeyDerivation { .. })
            }
        ));
        assert!(actions.is_empty());
    }

    #[test]
    fn accounts_loaded_without_request_navigates_home() {
        let (next, actions) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::AccountsLoaded {
                account_count: 3,
                has_pending_request: false,
            },
        );
        assert_eq!(next, OnboardingState::Completed);
        assert_eq!(
            actions,
            vec![OnboardingAction::Navigate {
                route: RouteUrl::Home
            }]
        );
    }

    #[test]
    fn single_account_completes_immediately() {
        let (next, actions) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::AccountsLoaded {
                account_count: 1,
                has_pending_request: true,
            },
        );
        assert_eq!(next, resolving());
        assert_eq!(
            actions,
            vec![OnboardingAction::CompleteRequest { account_index: 0 }]
        );
    }

    #[test]
    fn multiple_accounts_wait_for_selection() {
        let (next, actions) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::AccountsLoaded {
                account_count: 2,
                has_pending_request: true,
            },
        );
        assert_eq!(
            next,
            OnboardingState::ResolvingAccount {
                view: ResolutionView::ChooseAccount { account_count: 2 }
            }
        );
        assert_eq!(
            actions,
            vec![OnboardingAction::Navigate {
                route: RouteUrl::ChooseAccount
            }]
        );

        let (next, actions) =
            OnboardingStateMachine::transition(next, OnboardingEvent::SelectAccount { index: 1 });
        assert_eq!(next, resolving());
        assert_eq!(
            actions,
            vec![OnboardingAction::CompleteRequest { account_index: 1 }]
        );
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let choosing = OnboardingState::ResolvingAccount {
            view: ResolutionView::ChooseAccount { account_count: 2 },
        };
        let (next, actions) = OnboardingStateMachine::transition(
            choosing.clone(),
            OnboardingEvent::SelectAccount { index: 2 },
        );
        assert_eq!(next, choosing);
        assert!(actions.is_empty());
    }

    #[test]
    fn no_accounts_with_pending_request_is_a_distinct_view() {
        let (next, actions) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::AccountsLoaded {
                account_count: 0,
                has_pending_request: true,
            },
        );
        assert_eq!(
            next,
            OnboardingState::ResolvingAccount {
                view: ResolutionView::NoAccounts
            }
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn cancel_is_a_no_op_in_terminal_states() {
        for terminal in [OnboardingState::Completed, OnboardingState::Cancelled] {
            let (next, actions) =
                OnboardingStateMachine::transition(terminal.clone(), OnboardingEvent::Cancel);
            assert_eq!(next, terminal);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn cancel_from_any_active_state_cancels_request() {
        for state in [
            OnboardingState::Idle,
            OnboardingState::AwaitingPassword { error: None },
            OnboardingState::DerivingKey,
            resolving(),
            OnboardingState::ResolvingAccount {
                view: ResolutionView::NoAccounts,
            },
        ] {
            let (next, actions) = OnboardingStateMachine::transition(state, OnboardingEvent::Cancel);
            assert_eq!(next, OnboardingState::Cancelled);
            assert_eq!(actions, vec![OnboardingAction::CancelRequest]);
        }
    }

    #[test]
    fn resolver_outcome_decides_terminal_state() {
        let (next, _) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::Resolved {
                outcome: ResolveOutcome::Completed { account_index: 0 },
            },
        );
        assert_eq!(next, OnboardingState::Completed);

        let (next, _) = OnboardingStateMachine::transition(
            resolving(),
            OnboardingEvent::Resolved {
                outcome: ResolveOutcome::AlreadyResolved,
            },
        );
        assert_eq!(next, OnboardingState::Cancelled);
    }

    #[test]
    fn resolved_elsewhere_cancels_without_side_effects() {
        let (next, actions) = OnboardingStateMachine::transition(
            OnboardingState::DerivingKey,
            OnboardingEvent::ResolvedElsewhere,
        );
        assert_eq!(next, OnboardingState::Cancelled);
        assert!(actions.is_empty());
    }
}
