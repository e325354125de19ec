use std::fmt;

use crate::model::{Drink, Ingredient};

/// A single reason a drink cannot be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    EmptyTitle,
    EmptyRecipe,
    /// Ingredient at `index` has no name
    MissingName { index: usize },
    /// Ingredient at `index` has no color
    MissingColor { index: usize },
    /// Ingredient at `index` has fewer than one part
    TooFewParts { index: usize },
}

impl Violation {
    /// Position of the offending ingredient row, if the violation is row-level
    pub fn index(&self) -> Option<usize> {
        match self {
            Violation::MissingName { index }
            | Violation::MissingColor { index }
            | Violation::TooFewParts { index } => Some(*index),
            Violation::EmptyTitle | Violation::EmptyRecipe => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyTitle => write!(f, "title is required"),
            Violation::EmptyRecipe => write!(f, "recipe needs at least one ingredient"),
            Violation::MissingName { index } => write!(f, "ingredient {} needs a name", index),
            Violation::MissingColor { index } => {
                write!(f, "ingredient {} needs a color", index)
            }
            Violation::TooFewParts { index } => {
                write!(f, "ingredient {} needs at least one part", index)
            }
        }
    }
}

/// Every invariant a drink failed, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }

    /// Violations attached to the ingredient row at `index`
    pub fn for_row(&self, index: usize) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(move |v| v.index() == Some(index))
    }

    fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for Violations {}

fn ingredient_violations(index: usize, ingredient: &Ingredient, out: &mut Vec<Violation>) {
    if ingredient.name.is_empty() {
        out.push(Violation::MissingName { index });
    }
    if ingredient.color.is_empty() {
        out.push(Violation::MissingColor { index });
    }
    if ingredient.parts.is_nan() || ingredient.parts < 1.0 {
        out.push(Violation::TooFewParts { index });
    }
}

/// Check only the recipe rows of a drink
pub fn check_recipe(recipe: &[Ingredient]) -> Result<(), Violations> {
    let mut out = Vec::new();
    if recipe.is_empty() {
        out.push(Violation::EmptyRecipe);
    }
    for (index, ingredient) in recipe.iter().enumerate() {
        ingredient_violations(index, ingredient, &mut out);
    }
    Violations(out).into_result()
}

/// Check a whole drink, title included
pub fn check_drink(drink: &Drink) -> Result<(), Violations> {
    let mut out = Vec::new();
    if drink.title.is_empty() {
        out.push(Violation::EmptyTitle);
    }
    if let Err(recipe) = check_recipe(&drink.recipe) {
        out.extend(recipe);
    }
    Violations(out).into_result()
}

/// Boolean form of [`check_recipe`]
pub fn validate_recipe(recipe: &[Ingredient]) -> bool {
    if recipe.is_empty() {
        return false;
    }
    recipe
        .iter()
        .all(|i| !i.name.is_empty() && !i.color.is_empty() && i.parts >= 1.0)
}
