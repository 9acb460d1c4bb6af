//! RecipeApi - client for the recipe/nutrition data service.
//!
//! Endpoints (all GET, key passed as the `apiKey` query parameter):
//! - /recipes/findByIngredients
//! - /recipes/findByNutrients
//! - /recipes/complexSearch
//! - /recipes/{id}/information
//! - /food/ingredients/substitutes


use crate::config::{LogVerbosity, RecipesConfig, DEFAULT_RECIPES_URL};
use crate::error::EatMateError;
use crate::http::create_client;
use crate::logger::{log_call, CallRecord};
use crate::models::{
    ComplexSearchResponse, RecipeDetail, RecipeId, RecipeInformation, RecipeSummary,
    SubstitutePayload, SubstituteResult,
};
use crate::query::QueryParams;
use moka::future::Cache;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SERVICE: &str = "recipes";

/// Client for the recipe API.
///
/// Recipe detail records are cached in memory for the client's lifetime
/// (bounded by a TTL); nothing is written to disk.
#[derive(Clone)]
pub struct RecipeApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    verbosity: LogVerbosity,
    detail_cache: Cache<(RecipeId, bool), Arc<RecipeDetail>>,
}

impl RecipeApi {
    pub fn new() -> Self {
        Self {
            client: create_client(),
            base_url: DEFAULT_RECIPES_URL.to_string(),
            api_key: None,
            verbosity: LogVerbosity::default(),
            detail_cache: Self::build_cache(3600),
        }
    }

    pub fn from_config(config: &RecipesConfig, verbosity: LogVerbosity) -> Self {
        let mut api = Self::new()
            .with_base_url(&config.base_url)
            .with_cache_ttl_secs(config.cache_ttl_secs)
            .with_verbosity(verbosity);
        api.api_key = config.api_key.clone();
        api
    }

    fn build_cache(ttl_secs: u64) -> Cache<(RecipeId, bool), Arc<RecipeDetail>> {
        Cache::builder()
            .max_capacity(256)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.detail_cache = Self::build_cache(secs);
        self
    }

    /// Check if the client can make calls (requires an API key).
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Recipes that use the given ingredients, in server order.
    pub async fn find_by_ingredients(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<RecipeSummary>, EatMateError> {
        self.get_json(&["recipes", "findByIngredients"], params).await
    }

    /// Recipes within the given macro-nutrient bounds, in server order.
    pub async fn find_by_nutrients(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<RecipeSummary>, EatMateError> {
        self.get_json(&["recipes", "findByNutrients"], params).await
    }

    /// Query/cuisine/diet search.
    pub async fn complex_search(
        &self,
        params: &QueryParams,
    ) -> Result<ComplexSearchResponse, EatMateError> {
        self.get_json(&["recipes", "complexSearch"], params).await
    }

    /// Full recipe record, normalized.
    pub async fn recipe_information(
        &self,
        id: &RecipeId,
        include_nutrition: bool,
    ) -> Result<RecipeDetail, EatMateError> {
        let key = (id.clone(), include_nutrition);
        if let Some(cached) = self.detail_cache.get(&key).await {
            tracing::debug!("Recipe {} served from session cache", id);
            return Ok((*cached).clone());
        }

        let params = vec![("includeNutrition".to_string(), include_nutrition.to_string())];
        let info: RecipeInformation = self
            .get_json(&["recipes", id.0.as_str(), "information"], &params)
            .await?;
        let detail = RecipeDetail::from(info);

        self.detail_cache.insert(key, Arc::new(detail.clone())).await;
        Ok(detail)
    }

    /// Substitutes for one ingredient.
    ///
    /// A `"status": "failure"` payload means the service knows no
    /// substitutes; that is returned as an empty list, not an error.
    pub async fn ingredient_substitutes(
        &self,
        name: &str,
    ) -> Result<SubstituteResult, EatMateError> {
        let params = vec![("ingredientName".to_string(), name.to_string())];
        let payload: SubstitutePayload = self
            .get_json(&["food", "ingredients", "substitutes"], &params)
            .await?;

        if payload.status.as_deref() == Some("failure") {
            tracing::debug!(
                "No substitutes for {}: {}",
                name,
                payload.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(SubstituteResult {
            ingredient: payload
                .ingredient
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| name.to_string()),
            substitutes: payload.substitutes.unwrap_or_default(),
        })
    }

    /// Endpoint URL under the base URL. Each segment is percent-encoded, so
    /// an id containing `/` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, EatMateError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            EatMateError::InvalidQuery(format!("invalid base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| EatMateError::InvalidQuery(format!("base URL {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(String, String)],
    ) -> Result<T, EatMateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EatMateError::ApiKeyMissing("recipe API".to_string()))?;

        let request = self
            .client
            .get(self.endpoint(segments)?)
            .query(&[("apiKey", api_key)])
            .query(params)
            .build()?;
        let url = request.url().to_string();

        let start = Instant::now();
        let result = self.client.execute(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.log(&url, None, elapsed_ms);
                return Err(e.into());
            }
        };

        let status = response.status();
        self.log(&url, Some(status.as_u16()), elapsed_ms);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(EatMateError::from_response_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(EatMateError::from)
    }

    fn log(&self, url: &str, status: Option<u16>, elapsed_ms: u64) {
        log_call(
            &CallRecord {
                service: SERVICE,
                method: "GET",
                url,
                status,
                elapsed_ms,
            },
            self.verbosity,
        );
    }
}

impl Default for RecipeApi {
    fn default() -> Self {
        Self::new()
    }
}
