use thiserror::Error;

/// Fatal dialog-level failures.
///
/// Slot problems never appear here: they are resolved inside the validation
/// pipeline and surface as conversational prompts. The only condition allowed
/// to halt a turn is an intent name nothing is registered for.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("intent `{intent}` is not supported")]
    UnsupportedIntent { intent: String },
}

#[cfg(test)]
mod tests {
    use super::DialogError;

    #[test]
    fn unsupported_intent_names_the_offender() {
        let error = DialogError::UnsupportedIntent { intent: "BookFlight".to_owned() };
        assert_eq!(error.to_string(), "intent `BookFlight` is not supported");
    }
}
