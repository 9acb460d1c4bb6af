//! Recipe detail aggregator.
//!
//! Fetches one full recipe record (nutrition included) and serves three
//! read-only tab views over it. Switching tabs never re-fetches.

use crate::error::EatMateError;
use crate::models::{CaloricBreakdown, Ingredient, InstructionStep, Nutrient, RecipeDetail, RecipeId};
use crate::recipe_api::RecipeApi;
use crate::screen::ScreenScope;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Nutrients listed on the nutrition tab.
pub const NUTRIENTS_SHOWN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTab {
    #[default]
    Instructions,
    Ingredients,
    Nutrition,
}

impl DetailTab {
    pub const ALL: [DetailTab; 3] = [Self::Instructions, Self::Ingredients, Self::Nutrition];

    /// Text rendered when the recipe has nothing for this tab.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::Instructions => "No instructions available for this recipe.",
            Self::Ingredients => "No ingredient information available for this recipe.",
            Self::Nutrition => "No nutritional information available for this recipe.",
        }
    }
}

impl fmt::Display for DetailTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instructions => write!(f, "instructions"),
            Self::Ingredients => write!(f, "ingredients"),
            Self::Nutrition => write!(f, "nutrition"),
        }
    }
}

impl FromStr for DetailTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instructions" => Ok(Self::Instructions),
            "ingredients" => Ok(Self::Ingredients),
            "nutrition" => Ok(Self::Nutrition),
            _ => Err(format!("Invalid tab: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Arc<RecipeDetail>),
    Failed,
}

/// What one tab renders.
#[derive(Debug, Clone, PartialEq)]
pub enum TabView<'a> {
    Instructions(&'a [InstructionStep]),
    Ingredients(&'a [Ingredient]),
    Nutrition {
        breakdown: CaloricBreakdown,
        nutrients: &'a [Nutrient],
    },
    /// This tab has no data; other tabs are unaffected.
    NoData(DetailTab),
}

/// Detail screen state for one recipe.
pub struct RecipeDetailView {
    api: Arc<RecipeApi>,
    id: RecipeId,
    state: DetailState,
    active_tab: DetailTab,
    scope: ScreenScope,
}

impl RecipeDetailView {
    /// Screens open in the loading state; call [`load`](Self::load) next.
    pub fn new(api: Arc<RecipeApi>, id: RecipeId) -> Self {
        Self {
            api,
            id,
            state: DetailState::Loading,
            active_tab: DetailTab::default(),
            scope: ScreenScope::new(),
        }
    }

    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn detail(&self) -> Option<&RecipeDetail> {
        match &self.state {
            DetailState::Loaded(detail) => Some(detail.as_ref()),
            _ => None,
        }
    }

    pub fn active_tab(&self) -> DetailTab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: DetailTab) {
        self.active_tab = tab;
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    /// Fetch the record. Returns false if the screen was torn down first.
    pub async fn load(&mut self) -> bool {
        if self.scope.is_torn_down() {
            return false;
        }
        self.state = DetailState::Loading;

        let api = Arc::clone(&self.api);
        let id = self.id.clone();
        let fetch = async move { api.recipe_information(&id, true).await };

        match self.scope.clone().run(fetch).await {
            Some(result) => {
                self.apply(result);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, result: Result<RecipeDetail, EatMateError>) {
        self.state = match result {
            Ok(detail) => {
                tracing::info!("Loaded recipe {} ({})", detail.id, detail.title);
                DetailState::Loaded(Arc::new(detail))
            }
            Err(e) => {
                tracing::error!("Error fetching recipe details for {}: {}", self.id, e);
                DetailState::Failed
            }
        };
    }

    /// View for the active tab, once loaded.
    pub fn current_view(&self) -> Option<TabView<'_>> {
        self.detail().map(|d| tab_view(d, self.active_tab))
    }
}

/// Project one tab out of a loaded record.
pub fn tab_view(detail: &RecipeDetail, tab: DetailTab) -> TabView<'_> {
    match tab {
        DetailTab::Instructions if !detail.instructions.is_empty() => {
            TabView::Instructions(&detail.instructions)
        }
        DetailTab::Ingredients => match detail.ingredients.as_deref() {
            Some(ingredients) if !ingredients.is_empty() => TabView::Ingredients(ingredients),
            _ => TabView::NoData(tab),
        },
        DetailTab::Nutrition => match &detail.nutrition {
            Some(nutrition) => TabView::Nutrition {
                breakdown: nutrition.caloric_breakdown,
                nutrients: &nutrition.nutrients[..nutrition.nutrients.len().min(NUTRIENTS_SHOWN)],
            },
            None => TabView::NoData(tab),
        },
        _ => TabView::NoData(tab),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrition;
    use pretty_assertions::assert_eq;

    fn detail() -> RecipeDetail {
        RecipeDetail {
            id: RecipeId::from(7),
            title: "Shakshuka".to_string(),
            image: None,
            summary: None,
            ready_in_minutes: Some(30),
            servings: Some(2),
            instructions: vec![InstructionStep { number: 1, text: "Simmer tomatoes.".to_string() }],
            ingredients: Some(vec![Ingredient { amount: 4.0, unit: String::new(), name: "eggs".to_string() }]),
            nutrition: Some(Nutrition {
                caloric_breakdown: CaloricBreakdown { percent_protein: 25.0, percent_fat: 50.0, percent_carbs: 25.0 },
                nutrients: (0..12)
                    .map(|i| Nutrient {
                        name: format!("N{}", i),
                        amount: i as f64,
                        unit: "g".to_string(),
                        percent_of_daily_needs: None,
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn tabs_project_without_refetch() {
        let d = detail();

        assert!(matches!(tab_view(&d, DetailTab::Instructions), TabView::Instructions(steps) if steps.len() == 1));
        assert!(matches!(tab_view(&d, DetailTab::Ingredients), TabView::Ingredients(items) if items[0].name == "eggs"));
    }

    #[test]
    fn nutrition_tab_caps_nutrient_list() {
        let d = detail();
        match tab_view(&d, DetailTab::Nutrition) {
            TabView::Nutrition { nutrients, breakdown } => {
                assert_eq!(nutrients.len(), NUTRIENTS_SHOWN);
                assert_eq!(nutrients[0].name, "N0");
                assert_eq!(breakdown.rounded(), (25, 50, 25));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn each_missing_section_is_independent() {
        let mut d = detail();
        d.instructions.clear();
        d.ingredients = None;

        assert_eq!(tab_view(&d, DetailTab::Instructions), TabView::NoData(DetailTab::Instructions));
        assert_eq!(tab_view(&d, DetailTab::Ingredients), TabView::NoData(DetailTab::Ingredients));
        assert!(matches!(tab_view(&d, DetailTab::Nutrition), TabView::Nutrition { .. }));

        d.nutrition = None;
        assert_eq!(tab_view(&d, DetailTab::Nutrition), TabView::NoData(DetailTab::Nutrition));
    }

    #[test]
    fn tab_parses_from_name() {
        assert_eq!("Nutrition".parse::<DetailTab>().unwrap(), DetailTab::Nutrition);
        assert!("reviews".parse::<DetailTab>().is_err());
        assert_eq!(DetailTab::Ingredients.to_string(), "ingredients");
    }

    #[tokio::test]
    async fn load_then_switch_tabs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/recipes/42/information")
            .match_query(mockito::Matcher::UrlEncoded("includeNutrition".into(), "true".into()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": 42,
                    "title": "Bean Chili",
                    "analyzedInstructions": [],
                    "extendedIngredients": [{"amount": 1.0, "unit": "can", "name": "beans"}]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let api = Arc::new(RecipeApi::new().with_base_url(&server.url()).with_api_key("k"));
        let mut view = RecipeDetailView::new(api, RecipeId::from(42));
        assert_eq!(view.state(), &DetailState::Loading);

        assert!(view.load().await);
        assert_eq!(view.current_view(), Some(TabView::NoData(DetailTab::Instructions)));

        view.select_tab(DetailTab::Ingredients);
        assert!(matches!(view.current_view(), Some(TabView::Ingredients(_))));

        view.select_tab(DetailTab::Nutrition);
        assert_eq!(view.current_view(), Some(TabView::NoData(DetailTab::Nutrition)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn load_failure_is_failed_state() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/99/information")
            .with_status(404)
            .with_body(r#"{"status":"failure","code":404,"message":"A recipe with the id 99 does not exist."}"#)
            .create_async()
            .await;

        let api = Arc::new(RecipeApi::new().with_base_url(&server.url()).with_api_key("k"));
        let mut view = RecipeDetailView::new(api, RecipeId::from(99));

        assert!(view.load().await);
        assert_eq!(view.state(), &DetailState::Failed);
        assert_eq!(view.current_view(), None);
    }

    #[tokio::test]
    async fn load_after_teardown_does_nothing() {
        let api = Arc::new(RecipeApi::new().with_base_url("http://127.0.0.1:9").with_api_key("k"));
        let mut view = RecipeDetailView::new(api, RecipeId::from(1));
        view.teardown();

        assert!(!view.load().await);
        assert_eq!(view.state(), &DetailState::Loading);
    }
}
