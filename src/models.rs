//! Recipe, nutrition and substitute records.
//!
//! Wire types mirror the recipe API's JSON; `RecipeDetail` is the
//! normalized, immutable record the detail view works from.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Image shown when a recipe has none.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x300";

/// Summary snippet length in characters.
pub const SUMMARY_SNIPPET_CHARS: usize = 150;

/// Opaque recipe identifier. The API sends numbers, but strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecipeId(pub String);

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for RecipeId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecipeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// One entry in a search result list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    /// Only set by ingredient search.
    #[serde(default)]
    pub used_ingredient_count: Option<u32>,
    /// Only set by ingredient search.
    #[serde(default)]
    pub missed_ingredient_count: Option<u32>,
}

impl RecipeSummary {
    pub fn image_or_placeholder(&self) -> &str {
        self.image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }
}

/// Response envelope of the complex search endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComplexSearchResponse {
    #[serde(default)]
    pub results: Vec<RecipeSummary>,
    #[serde(default)]
    pub total_results: u32,
}

/// Full recipe record as returned by the information endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInformation {
    pub id: RecipeId,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub analyzed_instructions: Option<Vec<InstructionBlock>>,
    #[serde(default)]
    pub extended_ingredients: Option<Vec<Ingredient>>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructionBlock {
    #[serde(default)]
    pub steps: Vec<WireStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireStep {
    pub number: u32,
    pub step: String,
}

/// A single numbered instruction (1-based).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstructionStep {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    pub name: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{} {}", self.amount, self.name)
        } else {
            write!(f, "{} {} {}", self.amount, self.unit, self.name)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default)]
    pub caloric_breakdown: CaloricBreakdown,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
}

/// Share of calories from each macronutrient, summing to roughly 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaloricBreakdown {
    #[serde(default)]
    pub percent_protein: f64,
    #[serde(default)]
    pub percent_fat: f64,
    #[serde(default)]
    pub percent_carbs: f64,
}

impl CaloricBreakdown {
    /// Whole-number percentages in protein, fat, carbs order.
    pub fn rounded(&self) -> (i64, i64, i64) {
        (
            self.percent_protein.round() as i64,
            self.percent_fat.round() as i64,
            self.percent_carbs.round() as i64,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub percent_of_daily_needs: Option<f64>,
}

impl Nutrient {
    /// Daily-value badge text, e.g. `"12% DV"`.
    pub fn daily_value_label(&self) -> Option<String> {
        self.percent_of_daily_needs
            .filter(|p| *p > 0.0)
            .map(|p| format!("{}% DV", p.round() as i64))
    }
}

/// Normalized recipe record. Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub title: String,
    pub image: Option<String>,
    /// Plain-text summary snippet.
    pub summary: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub instructions: Vec<InstructionStep>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub nutrition: Option<Nutrition>,
}

impl From<RecipeInformation> for RecipeDetail {
    fn from(info: RecipeInformation) -> Self {
        // Only the first instruction block carries the main method.
        let instructions = info
            .analyzed_instructions
            .and_then(|blocks| blocks.into_iter().next())
            .map(|block| {
                block
                    .steps
                    .into_iter()
                    .map(|s| InstructionStep {
                        number: s.number,
                        text: s.step,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: info.id,
            title: info.title,
            image: info.image,
            summary: info.summary.as_deref().map(summary_snippet).filter(|s| !s.is_empty()),
            ready_in_minutes: info.ready_in_minutes,
            servings: info.servings,
            instructions,
            ingredients: info.extended_ingredients,
            nutrition: info.nutrition,
        }
    }
}

impl RecipeDetail {
    pub fn image_or_placeholder(&self) -> &str {
        self.image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"</?[^>]+(>|$)").expect("valid regex"))
}

/// Remove HTML tags, keeping the text between them.
pub fn strip_html(html: &str) -> String {
    html_tag_pattern().replace_all(html, "").into_owned()
}

/// Plain-text summary cut to [`SUMMARY_SNIPPET_CHARS`] characters.
pub fn summary_snippet(html: &str) -> String {
    let text = strip_html(html);
    let text = text.trim();
    if text.chars().count() <= SUMMARY_SNIPPET_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SUMMARY_SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Substitute lookup response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubstituteResult {
    #[serde(default)]
    pub ingredient: String,
    /// Server order. May be empty, which is not a failure.
    #[serde(default)]
    pub substitutes: Vec<String>,
}

/// Raw substitute payload; the endpoint reports misses as
/// `{"status": "failure", "message": ...}` with a 200 status.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubstitutePayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ingredient: Option<String>,
    #[serde(default)]
    pub substitutes: Option<Vec<String>>,
}
