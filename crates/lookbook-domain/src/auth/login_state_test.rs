#[cfg(test)]
mod tests {
    use super::super::login_state::*;
    use crate::shared::DomainError;

    #[test]
    fn test_new_state_is_idle() {
        let state = LoginState::new();
        assert_eq!(state.phase(), &LoginPhase::Idle);
        assert!(!state.is_loading());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_submit_then_fail_shows_message() {
        let mut state = LoginState::new();
        state.begin_submit().unwrap();
        assert!(state.is_loading());

        state.fail("Invalid username or password.").unwrap();

        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("Invalid username or password."));
    }

    #[test]
    fn test_second_submit_while_loading_is_rejected() {
        let mut state = LoginState::new();
        state.begin_submit().unwrap();

        let result = state.begin_submit();

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert!(state.is_loading());
    }

    #[test]
    fn test_resubmit_after_failure_clears_error() {
        let mut state = LoginState::new();
        state.begin_submit().unwrap();
        state.fail("nope").unwrap();

        state.begin_submit().unwrap();

        assert!(state.error().is_none());
    }

    #[test]
    fn test_succeed_without_submit_fails() {
        let mut state = LoginState::new();
        assert!(state.succeed().is_err());
        assert_eq!(state.phase(), &LoginPhase::Idle);
    }

    #[test]
    fn test_reject_sets_error_without_loading() {
        let mut state = LoginState::new();
        state.reject("Please fill in both fields.");

        assert_eq!(state.error(), Some("Please fill in both fields."));
        assert!(!state.is_loading());
    }
}
