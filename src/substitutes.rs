//! Substitute lookup controller.
//!
//! A single-shot query screen: `Idle -> Loading -> {Found, Failed}`. A found
//! result with no substitutes is its own render branch, not a failure.

use crate::error::EatMateError;
use crate::models::SubstituteResult;
use crate::recipe_api::RecipeApi;
use crate::screen::{RequestSequence, ScreenScope, Ticket};
use std::sync::Arc;

/// Quick picks offered under the input box.
pub const EXAMPLE_INGREDIENTS: [&str; 10] = [
    "butter", "milk", "eggs", "sugar", "flour", "rice", "vinegar", "oil", "tomatoes", "onions",
];

pub const FAILURE_MESSAGE: &str = "Failed to get substitutes. Please try again.";
pub const NO_SUBSTITUTES_MESSAGE: &str = "No substitutes found for this ingredient.";

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Loading,
    Found(SubstituteResult),
    Failed,
}

/// The mutually exclusive things a settled lookup can render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupView<'a> {
    Substitutes {
        ingredient: &'a str,
        substitutes: &'a [String],
    },
    NoSubstitutes,
    Error(&'static str),
}

/// An issued lookup.
#[derive(Debug, Clone)]
pub struct LookupTicket {
    pub ticket: Ticket,
    pub ingredient: String,
}

pub struct SubstituteLookup {
    api: Arc<RecipeApi>,
    state: LookupState,
    sequence: RequestSequence,
    scope: ScreenScope,
}

impl SubstituteLookup {
    pub fn new(api: Arc<RecipeApi>) -> Self {
        Self {
            api,
            state: LookupState::Idle,
            sequence: RequestSequence::default(),
            scope: ScreenScope::new(),
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn can_lookup(&self, name: &str) -> bool {
        self.state != LookupState::Loading && !self.scope.is_torn_down() && !name.trim().is_empty()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    /// Render branch for the current state; `None` before the first lookup
    /// and while loading.
    pub fn view(&self) -> Option<LookupView<'_>> {
        match &self.state {
            LookupState::Idle | LookupState::Loading => None,
            LookupState::Found(result) if result.substitutes.is_empty() => Some(LookupView::NoSubstitutes),
            LookupState::Found(result) => Some(LookupView::Substitutes {
                ingredient: &result.ingredient,
                substitutes: &result.substitutes,
            }),
            LookupState::Failed => Some(LookupView::Error(FAILURE_MESSAGE)),
        }
    }

    /// Start a lookup. Blank names and lookups after teardown are rejected.
    pub fn begin(&mut self, name: &str) -> Option<LookupTicket> {
        let ingredient = name.trim();
        if ingredient.is_empty() || self.scope.is_torn_down() {
            return None;
        }

        self.state = LookupState::Loading;
        Some(LookupTicket {
            ticket: self.sequence.issue(),
            ingredient: ingredient.to_string(),
        })
    }

    /// Apply a response. Returns false when it was discarded.
    pub fn complete(
        &mut self,
        ticket: &LookupTicket,
        result: Result<SubstituteResult, EatMateError>,
    ) -> bool {
        if self.scope.is_torn_down() || !self.sequence.is_current(ticket.ticket) {
            tracing::debug!("Substitute lookup #{} discarded", ticket.ticket.seq());
            return false;
        }

        self.state = match result {
            Ok(found) => {
                tracing::info!("{} substitutes for {}", found.substitutes.len(), found.ingredient);
                LookupState::Found(found)
            }
            Err(e) => {
                tracing::error!("Error getting substitutes for {}: {} [{}]", ticket.ingredient, e, e.error_type());
                LookupState::Failed
            }
        };
        true
    }

    /// Look up `name` and wait for the outcome.
    pub async fn lookup(&mut self, name: &str) -> bool {
        let Some(ticket) = self.begin(name) else {
            return false;
        };

        let api = Arc::clone(&self.api);
        let ingredient = ticket.ingredient.clone();
        let scope = self.scope.clone();
        match scope.run(async move { api.ingredient_substitutes(&ingredient).await }).await {
            Some(result) => self.complete(&ticket, result),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offline_api() -> Arc<RecipeApi> {
        Arc::new(RecipeApi::new().with_base_url("http://127.0.0.1:9").with_api_key("k"))
    }

    fn found(ingredient: &str, substitutes: &[&str]) -> Result<SubstituteResult, EatMateError> {
        Ok(SubstituteResult {
            ingredient: ingredient.to_string(),
            substitutes: substitutes.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let mut lookup = SubstituteLookup::new(offline_api());

        assert!(!lookup.lookup("  ").await);
        assert_eq!(lookup.state(), &LookupState::Idle);
        assert_eq!(lookup.view(), None);
    }

    #[test]
    fn empty_list_is_distinct_from_failure() {
        let mut lookup = SubstituteLookup::new(offline_api());

        let ticket = lookup.begin("butter").unwrap();
        assert_eq!(lookup.state(), &LookupState::Loading);
        lookup.complete(&ticket, found("butter", &[]));
        assert_eq!(lookup.view(), Some(LookupView::NoSubstitutes));

        let ticket = lookup.begin("butter").unwrap();
        lookup.complete(&ticket, Err(EatMateError::Network("refused".to_string())));
        assert_eq!(lookup.view(), Some(LookupView::Error(FAILURE_MESSAGE)));
    }

    #[test]
    fn substitutes_keep_server_order() {
        let mut lookup = SubstituteLookup::new(offline_api());
        let ticket = lookup.begin("eggs").unwrap();
        lookup.complete(&ticket, found("eggs", &["1 banana", "1/4 cup applesauce"]));

        match lookup.view() {
            Some(LookupView::Substitutes { ingredient, substitutes }) => {
                assert_eq!(ingredient, "eggs");
                assert_eq!(substitutes, &["1 banana".to_string(), "1/4 cup applesauce".to_string()]);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn older_lookup_cannot_overwrite_newer() {
        let mut lookup = SubstituteLookup::new(offline_api());
        let older = lookup.begin("milk").unwrap();
        let newer = lookup.begin("oil").unwrap();

        assert!(lookup.complete(&newer, found("oil", &["melted butter"])));
        assert!(!lookup.complete(&older, found("milk", &["oat milk"])));
        assert!(matches!(lookup.state(), LookupState::Found(r) if r.ingredient == "oil"));
    }

    #[test]
    fn teardown_discards_late_result() {
        let mut lookup = SubstituteLookup::new(offline_api());
        let ticket = lookup.begin("sugar").unwrap();
        lookup.teardown();

        assert!(!lookup.complete(&ticket, found("sugar", &["honey"])));
        assert_eq!(lookup.state(), &LookupState::Loading);
        assert!(!lookup.can_lookup("sugar"));
    }

    #[tokio::test]
    async fn lookup_butter_with_no_substitutes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/food/ingredients/substitutes")
            .match_query(mockito::Matcher::UrlEncoded("ingredientName".into(), "butter".into()))
            .with_status(200)
            .with_body(r#"{"ingredient":"butter","substitutes":[]}"#)
            .create_async()
            .await;

        let api = Arc::new(RecipeApi::new().with_base_url(&server.url()).with_api_key("k"));
        let mut lookup = SubstituteLookup::new(api);

        assert!(lookup.lookup("butter").await);
        mock.assert_async().await;
        assert_eq!(lookup.view(), Some(LookupView::NoSubstitutes));
    }

    #[tokio::test]
    async fn unreachable_service_renders_error_branch() {
        let mut lookup = SubstituteLookup::new(offline_api());

        assert!(lookup.lookup("flour").await);
        assert_eq!(lookup.state(), &LookupState::Failed);
    }
}
