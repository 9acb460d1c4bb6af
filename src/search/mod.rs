//! Search session controller.
//!
//! One generic state machine backs all three search screens; each screen
//! plugs in a `SearchMode` (submittability predicate, query builder and
//! endpoint) instead of carrying its own copy of the logic.
//!
//! ```text
//! Idle ──submit──▶ Searching ──┬─▶ Results
//!                              ├─▶ NoResults
//!                              └─▶ Failed
//! ```

#[cfg(test)]
mod tests;

use crate::error::EatMateError;
use crate::models::RecipeSummary;
use crate::query::{
    build_ingredient_query, build_nutrient_query, build_parameter_query, IngredientCriteria,
    NutrientCriteria, ParameterCriteria, QueryParams,
};
use crate::recipe_api::RecipeApi;
use crate::screen::{RequestSequence, ScreenScope, Ticket};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Searching,
    Results,
    NoResults,
    Failed,
}

/// Remote search call a mode is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEndpoint {
    FindByIngredients,
    FindByNutrients,
    ComplexSearch,
}

/// Normalized response of any search endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    pub recipes: Vec<RecipeSummary>,
    /// Only reported by complex search.
    pub total_results: Option<u32>,
}

impl SearchEndpoint {
    pub async fn execute(
        self,
        api: &RecipeApi,
        params: &QueryParams,
    ) -> Result<SearchOutcome, EatMateError> {
        match self {
            Self::FindByIngredients => Ok(SearchOutcome {
                recipes: api.find_by_ingredients(params).await?,
                total_results: None,
            }),
            Self::FindByNutrients => Ok(SearchOutcome {
                recipes: api.find_by_nutrients(params).await?,
                total_results: None,
            }),
            Self::ComplexSearch => {
                let response = api.complex_search(params).await?;
                Ok(SearchOutcome {
                    recipes: response.results,
                    total_results: Some(response.total_results),
                })
            }
        }
    }
}

/// Configuration that specializes the session to one kind of criteria.
pub struct SearchMode<C> {
    pub name: &'static str,
    pub submittable: fn(&C) -> bool,
    pub build: fn(&C) -> Result<QueryParams, EatMateError>,
    pub endpoint: SearchEndpoint,
}

impl<C> Clone for SearchMode<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            submittable: self.submittable,
            build: self.build,
            endpoint: self.endpoint,
        }
    }
}

impl SearchMode<IngredientCriteria> {
    pub fn ingredients() -> Self {
        Self {
            name: "ingredients",
            submittable: IngredientCriteria::is_submittable,
            build: build_ingredient_query,
            endpoint: SearchEndpoint::FindByIngredients,
        }
    }
}

impl SearchMode<NutrientCriteria> {
    pub fn nutrients() -> Self {
        Self {
            name: "nutrients",
            submittable: NutrientCriteria::is_submittable,
            build: build_nutrient_query,
            endpoint: SearchEndpoint::FindByNutrients,
        }
    }
}

impl SearchMode<ParameterCriteria> {
    pub fn parameters() -> Self {
        Self {
            name: "parameters",
            submittable: ParameterCriteria::is_submittable,
            build: build_parameter_query,
            endpoint: SearchEndpoint::ComplexSearch,
        }
    }
}

/// An issued search: its sequence ticket and the exact parameters sent.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub ticket: Ticket,
    pub params: QueryParams,
}

/// Search state for one screen instance.
pub struct SearchSession<C> {
    api: Arc<RecipeApi>,
    mode: SearchMode<C>,
    criteria: C,
    state: SearchState,
    has_searched: bool,
    results: Vec<RecipeSummary>,
    total_results: Option<u32>,
    failure: Option<&'static str>,
    sequence: RequestSequence,
    scope: ScreenScope,
}

pub type IngredientSearch = SearchSession<IngredientCriteria>;
pub type NutrientSearch = SearchSession<NutrientCriteria>;
pub type ParameterSearch = SearchSession<ParameterCriteria>;

impl SearchSession<IngredientCriteria> {
    pub fn ingredients(api: Arc<RecipeApi>) -> Self {
        Self::new(api, SearchMode::ingredients())
    }
}

impl SearchSession<NutrientCriteria> {
    pub fn nutrients(api: Arc<RecipeApi>) -> Self {
        Self::new(api, SearchMode::nutrients())
    }
}

impl SearchSession<ParameterCriteria> {
    pub fn parameters(api: Arc<RecipeApi>) -> Self {
        Self::new(api, SearchMode::parameters())
    }
}

impl<C: Default> SearchSession<C> {
    pub fn new(api: Arc<RecipeApi>, mode: SearchMode<C>) -> Self {
        Self::with_criteria(api, mode, C::default())
    }
}

impl<C> SearchSession<C> {
    pub fn with_criteria(api: Arc<RecipeApi>, mode: SearchMode<C>, criteria: C) -> Self {
        Self {
            api,
            mode,
            criteria,
            state: SearchState::Idle,
            has_searched: false,
            results: Vec::new(),
            total_results: None,
            failure: None,
            sequence: RequestSequence::default(),
            scope: ScreenScope::new(),
        }
    }

    pub fn criteria(&self) -> &C {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut C {
        &mut self.criteria
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// True after the first submit, for the rest of the screen's life.
    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    /// Results in server order. Empty unless the state is `Results`; a new
    /// search clears the previous set as soon as it begins.
    pub fn results(&self) -> &[RecipeSummary] {
        &self.results
    }

    pub fn total_results(&self) -> Option<u32> {
        self.total_results
    }

    /// Text for the failed branch.
    pub fn error_message(&self) -> Option<&'static str> {
        match self.state {
            SearchState::Failed => self.failure,
            _ => None,
        }
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.state != SearchState::Searching
            && !self.scope.is_torn_down()
            && (self.mode.submittable)(&self.criteria)
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    /// Start a search: validate, build the query, enter `Searching`.
    ///
    /// Returns `None` (and changes nothing) when the criteria are not
    /// submittable or the screen is gone. A begin while another search is
    /// in flight supersedes it; the older response is discarded on arrival.
    pub fn begin(&mut self) -> Option<SearchTicket> {
        if self.scope.is_torn_down() {
            return None;
        }
        if !(self.mode.submittable)(&self.criteria) {
            tracing::debug!("{} search rejected: criteria not submittable", self.mode.name);
            return None;
        }

        let params = match (self.mode.build)(&self.criteria) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("{} search rejected: {}", self.mode.name, e);
                return None;
            }
        };

        self.state = SearchState::Searching;
        self.has_searched = true;
        self.results.clear();
        self.total_results = None;
        self.failure = None;
        let ticket = self.sequence.issue();
        tracing::debug!("{} search #{} issued", self.mode.name, ticket.seq());

        Some(SearchTicket { ticket, params })
    }

    /// The remote call for an issued ticket. Does not touch session state.
    pub fn fetch(
        &self,
        ticket: &SearchTicket,
    ) -> impl Future<Output = Result<SearchOutcome, EatMateError>> {
        let api = Arc::clone(&self.api);
        let endpoint = self.mode.endpoint;
        let params = ticket.params.clone();
        async move { endpoint.execute(&api, &params).await }
    }

    /// Apply a response. Returns false when it was discarded because the
    /// screen is gone or a newer search has been issued since.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        result: Result<SearchOutcome, EatMateError>,
    ) -> bool {
        if self.scope.is_torn_down() {
            tracing::debug!("{} search #{} dropped after teardown", self.mode.name, ticket.ticket.seq());
            return false;
        }
        if !self.sequence.is_current(ticket.ticket) {
            tracing::debug!("{} search #{} superseded, response discarded", self.mode.name, ticket.ticket.seq());
            return false;
        }

        match result {
            Ok(outcome) => {
                tracing::info!("{} search returned {} recipes", self.mode.name, outcome.recipes.len());
                self.state = if outcome.recipes.is_empty() {
                    SearchState::NoResults
                } else {
                    SearchState::Results
                };
                self.results = outcome.recipes;
                self.total_results = outcome.total_results;
            }
            Err(e) => {
                tracing::error!("Error searching recipes ({}): {} [{}]", self.mode.name, e, e.error_type());
                self.state = SearchState::Failed;
                self.failure = Some(e.user_message());
            }
        }
        true
    }

    /// Submit the current criteria and wait for the outcome.
    ///
    /// No-op when the criteria are not submittable. Returns whether a
    /// response was applied.
    pub async fn submit(&mut self) -> bool {
        let Some(ticket) = self.begin() else {
            return false;
        };

        let scope = self.scope.clone();
        match scope.run(self.fetch(&ticket)).await {
            Some(result) => self.complete(&ticket, result),
            None => false,
        }
    }
}
