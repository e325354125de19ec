use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Id carried by a drink the API has never seen
pub const NEW_DRINK_ID: i64 = -1;

/// Color given to freshly added ingredient rows
pub const DEFAULT_COLOR: &str = "white";

/// A drink on the menu: a title and an ordered recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    #[serde(default = "new_drink_id")]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub recipe: Vec<Ingredient>,
}

/// One row of a recipe. Identified only by its position in the drink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Missing from the public (short) representation
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    /// Relative proportion within the drink
    #[serde(
        default,
        serialize_with = "serialize_parts",
        deserialize_with = "deserialize_parts"
    )]
    pub parts: f64,
}

fn new_drink_id() -> i64 {
    NEW_DRINK_ID
}

/// Whole proportions go out as integers, the way the app always sent them
fn serialize_parts<S: Serializer>(parts: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if parts.fract() == 0.0 && *parts >= 0.0 && *parts <= u32::MAX as f64 {
        serializer.serialize_u32(*parts as u32)
    } else {
        serializer.serialize_f64(*parts)
    }
}

/// The API stores recipes as opaque JSON, so a row may hold a number, a
/// numeric string, or junk. Anything unusable becomes 0 and fails validation
/// instead of failing the whole listing.
fn deserialize_parts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let parts = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if parts.is_finite() { parts } else { 0.0 })
}

impl Drink {
    /// A blank draft: no id, no title, and a single blank ingredient row
    pub fn draft() -> Self {
        Drink {
            id: NEW_DRINK_ID,
            title: String::new(),
            recipe: vec![Ingredient::blank()],
        }
    }

    /// Whether the drink has not been assigned a persistent id yet
    pub fn is_new(&self) -> bool {
        self.id == NEW_DRINK_ID
    }

    /// Sum of all ingredient parts
    pub fn total_parts(&self) -> f64 {
        self.recipe.iter().map(|i| i.parts).sum()
    }
}

impl Default for Drink {
    fn default() -> Self {
        Drink {
            id: NEW_DRINK_ID,
            title: String::new(),
            recipe: Vec::new(),
        }
    }
}

impl Ingredient {
    pub fn new(name: impl Into<String>, color: impl Into<String>, parts: f64) -> Self {
        Ingredient {
            name: name.into(),
            color: color.into(),
            parts,
        }
    }

    /// The row inserted by the editor: empty name, white, one part
    pub fn blank() -> Self {
        Ingredient::new("", DEFAULT_COLOR, 1.0)
    }
}
