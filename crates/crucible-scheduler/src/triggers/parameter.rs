//! Build-parameter injection decorator.

use super::Trigger;
use chrono::{DateTime, Utc};
use crucible_core::IntegrationRequest;
use std::collections::HashMap;

/// Merges a fixed set of named build parameters into every request the
/// inner trigger produces. An empty set is a no-op, never an error.
pub struct ParameterTrigger {
    inner: Box<dyn Trigger>,
    parameters: HashMap<String, String>,
}

impl ParameterTrigger {
    pub fn new(inner: Box<dyn Trigger>, parameters: HashMap<String, String>) -> Self {
        Self { inner, parameters }
    }
}

impl Trigger for ParameterTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        let mut request = self.inner.fire()?;
        request.parameters.extend(
            self.parameters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        Some(request)
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        self.inner.next_build()
    }

    fn integration_completed(&mut self) {
        self.inner.integration_completed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::testing::ScriptedTrigger;
    use crucible_core::BuildCondition;

    #[test]
    fn test_parameters_merged_into_fired_request() {
        let mut seed = IntegrationRequest::new(
            BuildCondition::IfModificationExists,
            "inner",
            Utc::now(),
        );
        seed.parameters.insert("existing".to_string(), "kept".to_string());
        let (inner, _) = ScriptedTrigger::new(Some(seed));

        let mut parameters = HashMap::new();
        parameters.insert("target".to_string(), "release".to_string());
        let mut trigger = ParameterTrigger::new(Box::new(inner), parameters);

        let request = trigger.fire().expect("inner fired");
        assert_eq!(request.parameters.get("existing"), Some(&"kept".to_string()));
        assert_eq!(request.parameters.get("target"), Some(&"release".to_string()));
    }

    #[test]
    fn test_empty_parameter_set_is_a_no_op() {
        let (inner, _) = ScriptedTrigger::new(Some(IntegrationRequest::new(
            BuildCondition::ForceBuild,
            "inner",
            Utc::now(),
        )));
        let mut trigger = ParameterTrigger::new(Box::new(inner), HashMap::new());

        let request = trigger.fire().expect("inner fired");
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn test_silent_inner_stays_silent() {
        let (inner, _) = ScriptedTrigger::new(None);
        let mut trigger = ParameterTrigger::new(Box::new(inner), HashMap::new());
        assert!(trigger.fire().is_none());
    }
}
