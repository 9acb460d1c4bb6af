//! Search criteria and the pure builders that turn them into query parameters.
//!
//! Three search modes, three criteria shapes:
//! - Ingredient: ordered, case-insensitively distinct ingredient names
//! - Nutrient: eight numeric bounds plus a result cap, always sent in full
//! - Parameter: free-text query plus cuisine/diet filters, sent only when set
//!
//! Builders never touch the network and never add the API key.

use crate::error::EatMateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered `(key, value)` pairs for one request.
pub type QueryParams = Vec<(String, String)>;

/// Delimiter the recipe API expects between ingredient names.
pub const INGREDIENT_DELIMITER: &str = ",";

/// Sentinel value meaning "no filter" for cuisine and diet.
pub const ANY: &str = "any";

// ============================================================================
// Ingredient criteria
// ============================================================================

/// Ingredients the user has on hand, in entry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCriteria {
    ingredients: Vec<String>,
    /// Result cap (`number`).
    pub number: u32,
    /// 1 = maximize used ingredients, 2 = minimize missing ones.
    pub ranking: u8,
}

impl IngredientCriteria {
    pub fn new() -> Self {
        Self {
            ingredients: Vec::new(),
            number: crate::config::DEFAULT_RESULTS_PER_SEARCH,
            ranking: 1,
        }
    }

    /// Add one ingredient entry.
    ///
    /// The entry is trimmed; text containing the delimiter is split into
    /// separate names so the joined query stays unambiguous. Empty names and
    /// case-insensitive duplicates are ignored. Returns how many names were
    /// actually added.
    pub fn add(&mut self, entry: &str) -> usize {
        let mut added = 0;
        for name in entry.split(INGREDIENT_DELIMITER) {
            let name = name.trim();
            if name.is_empty() || self.contains(name) {
                continue;
            }
            self.ingredients.push(name.to_string());
            added += 1;
        }
        added
    }

    /// Remove the ingredient at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.ingredients.len()).then(|| self.ingredients.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.ingredients.iter().any(|i| i.to_lowercase() == needle)
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn is_submittable(&self) -> bool {
        !self.ingredients.is_empty()
    }
}

impl Default for IngredientCriteria {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for IngredientCriteria {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for entry in iter {
            criteria.add(entry.as_ref());
        }
        criteria
    }
}

/// Build find-by-ingredients parameters. Fails on an empty set.
pub fn build_ingredient_query(criteria: &IngredientCriteria) -> Result<QueryParams, EatMateError> {
    let joined = criteria
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect::<Vec<_>>()
        .join(INGREDIENT_DELIMITER);

    if joined.is_empty() {
        return Err(EatMateError::InvalidQuery(
            "at least one ingredient is required".to_string(),
        ));
    }

    Ok(vec![
        ("ingredients".to_string(), joined),
        ("number".to_string(), criteria.number.to_string()),
        ("ranking".to_string(), criteria.ranking.to_string()),
    ])
}

// ============================================================================
// Nutrient criteria
// ============================================================================

/// Macro-nutrient bounds. `min > max` is allowed and passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientCriteria {
    pub min_calories: f64,
    pub max_calories: f64,
    pub min_protein: f64,
    pub max_protein: f64,
    pub min_carbs: f64,
    pub max_carbs: f64,
    pub min_fat: f64,
    pub max_fat: f64,
    pub number: u32,
}

impl Default for NutrientCriteria {
    fn default() -> Self {
        Self {
            min_calories: 0.0,
            max_calories: 800.0,
            min_protein: 0.0,
            max_protein: 100.0,
            min_carbs: 0.0,
            max_carbs: 100.0,
            min_fat: 0.0,
            max_fat: 100.0,
            number: crate::config::DEFAULT_RESULTS_PER_SEARCH,
        }
    }
}

impl NutrientCriteria {
    /// Bounds in request order.
    pub fn bounds(&self) -> [(&'static str, f64); 8] {
        [
            ("minCalories", self.min_calories),
            ("maxCalories", self.max_calories),
            ("minProtein", self.min_protein),
            ("maxProtein", self.max_protein),
            ("minCarbs", self.min_carbs),
            ("maxCarbs", self.max_carbs),
            ("minFat", self.min_fat),
            ("maxFat", self.max_fat),
        ]
    }

    /// Every bound must be a finite, non-negative number.
    pub fn is_submittable(&self) -> bool {
        self.bounds().iter().all(|(_, v)| v.is_finite() && *v >= 0.0)
    }
}

/// Build find-by-nutrients parameters. Every bound is emitted, defaults included.
pub fn build_nutrient_query(criteria: &NutrientCriteria) -> Result<QueryParams, EatMateError> {
    let mut params: QueryParams = criteria
        .bounds()
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    params.push(("number".to_string(), criteria.number.to_string()));
    Ok(params)
}

// ============================================================================
// Parameter criteria
// ============================================================================

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = "any")]
            Any,
            $(#[serde(rename = $value)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::Any, $($name::$variant,)+];

            /// Value sent to the API.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::Any => ANY,
                    $($name::$variant => $value,)+
                }
            }

            /// Human-readable label.
            pub fn label(&self) -> &'static str {
                match self {
                    $name::Any => concat!("Any ", stringify!($name)),
                    $($name::$variant => $label,)+
                }
            }

            pub fn is_any(&self) -> bool {
                matches!(self, $name::Any)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str() == wanted)
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name).to_lowercase(), s))
            }
        }
    };
}

choice_enum!(
    /// Cuisine filter.
    Cuisine {
        African => "african", "African";
        American => "american", "American";
        British => "british", "British";
        Chinese => "chinese", "Chinese";
        French => "french", "French";
        Indian => "indian", "Indian";
        Italian => "italian", "Italian";
        Japanese => "japanese", "Japanese";
        Korean => "korean", "Korean";
        Mexican => "mexican", "Mexican";
        Thai => "thai", "Thai";
    }
);

choice_enum!(
    /// Diet filter.
    Diet {
        GlutenFree => "gluten free", "Gluten Free";
        Ketogenic => "ketogenic", "Ketogenic";
        Vegetarian => "vegetarian", "Vegetarian";
        Vegan => "vegan", "Vegan";
        Pescetarian => "pescetarian", "Pescetarian";
        Paleo => "paleo", "Paleo";
    }
);

/// Free-text and categorical search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterCriteria {
    pub query: String,
    pub cuisine: Cuisine,
    pub diet: Diet,
}

impl ParameterCriteria {
    /// At least one of query, cuisine, diet must differ from its default.
    pub fn is_submittable(&self) -> bool {
        !self.query.trim().is_empty() || !self.cuisine.is_any() || !self.diet.is_any()
    }
}

/// Build complex-search parameters.
///
/// `query` is sent only when non-empty; `cuisine` and `diet` are left out
/// when set to "any", which the API reads as "no filter".
pub fn build_parameter_query(criteria: &ParameterCriteria) -> Result<QueryParams, EatMateError> {
    let mut params: QueryParams = Vec::new();

    let query = criteria.query.trim();
    if !query.is_empty() {
        params.push(("query".to_string(), query.to_string()));
    }
    if !criteria.cuisine.is_any() {
        params.push(("cuisine".to_string(), criteria.cuisine.as_str().to_string()));
    }
    if !criteria.diet.is_any() {
        params.push(("diet".to_string(), criteria.diet.as_str().to_string()));
    }
    params.push(("addRecipeInformation".to_string(), "true".to_string()));

    Ok(params)
}
