//! UniFFI bindings for drink-menu
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! The editor state lives on the host side; these functions cover the parts that
//! need no collaborators: building drafts, validating them, and reading the menu.

use std::fmt;

use crate::validation::{self, Violation};
use crate::{AuthService, Drink, Ingredient, MenuConfig, MenuError};

// Re-export UniFFI macro
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// FFI-compatible ingredient row
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiIngredient {
    pub name: String,
    pub color: String,
    pub parts: f64,
}

/// FFI-compatible drink
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiDrink {
    /// -1 for a drink that was never saved
    pub id: i64,
    pub title: String,
    pub recipe: Vec<FfiIngredient>,
}

impl From<Ingredient> for FfiIngredient {
    fn from(ingredient: Ingredient) -> Self {
        FfiIngredient {
            name: ingredient.name,
            color: ingredient.color,
            parts: ingredient.parts,
        }
    }
}

impl From<FfiIngredient> for Ingredient {
    fn from(ffi: FfiIngredient) -> Self {
        Ingredient::new(ffi.name, ffi.color, ffi.parts)
    }
}

impl From<Drink> for FfiDrink {
    fn from(drink: Drink) -> Self {
        FfiDrink {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<FfiDrink> for Drink {
    fn from(ffi: FfiDrink) -> Self {
        Drink {
            id: ffi.id,
            title: ffi.title,
            recipe: ffi.recipe.into_iter().map(Into::into).collect(),
        }
    }
}

/// A failed invariant, flattened for FFI. `index` is set for row-level problems.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiViolation {
    pub index: Option<u64>,
    pub message: String,
}

impl From<Violation> for FfiViolation {
    fn from(violation: Violation) -> Self {
        FfiViolation {
            index: violation.index().and_then(|i| u64::try_from(i).ok()),
            message: violation.to_string(),
        }
    }
}

/// FFI-compatible error type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiMenuError {
    /// Request or response failure
    RequestError { message: String },
    /// The API rejected the request
    ApiError { status: u16, message: String },
    /// Token or configuration problem
    ConfigError { message: String },
    /// Runtime error (tokio)
    RuntimeError { message: String },
}

impl fmt::Display for FfiMenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiMenuError::RequestError { message } => write!(f, "Request error: {}", message),
            FfiMenuError::ApiError { status, message } => {
                write!(f, "API error {}: {}", status, message)
            }
            FfiMenuError::ConfigError { message } => write!(f, "Config error: {}", message),
            FfiMenuError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiMenuError {}

impl From<MenuError> for FfiMenuError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::Api { status, message } => FfiMenuError::ApiError { status, message },
            MenuError::Http(e) => FfiMenuError::RequestError {
                message: e.to_string(),
            },
            MenuError::Json(e) => FfiMenuError::RequestError {
                message: e.to_string(),
            },
            MenuError::Runtime(message) => FfiMenuError::RuntimeError { message },
            e @ (MenuError::InvalidToken(_)
            | MenuError::InvalidUrl(_)
            | MenuError::Builder(_)
            | MenuError::Config(_)) => FfiMenuError::ConfigError {
                message: e.to_string(),
            },
        }
    }
}

/// Create a new tokio runtime for FFI calls
fn create_runtime() -> Result<tokio::runtime::Runtime, FfiMenuError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiMenuError::RuntimeError {
        message: format!("Failed to create async runtime: {}", e),
    })
}

/// A blank draft for the create form
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn new_drink_draft() -> FfiDrink {
    Drink::draft().into()
}

/// Every invariant `drink` fails; empty when it can be saved
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn check_drink(drink: FfiDrink) -> Vec<FfiViolation> {
    match validation::check_drink(&drink.into()) {
        Ok(()) => Vec::new(),
        Err(violations) => violations.into_iter().map(Into::into).collect(),
    }
}

/// Fetch the menu
///
/// # Arguments
/// * `api_server_url` - Base URL of the drinks API
/// * `token` - Optional access token; unlocks the detailed listing
/// * `timeout_seconds` - Optional timeout in seconds
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn fetch_drinks(
    api_server_url: String,
    token: Option<String>,
    timeout_seconds: Option<u64>,
) -> Result<Vec<FfiDrink>, FfiMenuError> {
    let rt = create_runtime()?;
    rt.block_on(async {
        let auth = match token {
            Some(token) => AuthService::from_token(token)?,
            None => AuthService::anonymous(),
        };
        let config = MenuConfig {
            api_server_url,
            timeout: timeout_seconds.unwrap_or_else(|| MenuConfig::default().timeout),
            ..MenuConfig::default()
        };
        let drinks = crate::fetch_menu(&config, auth).await?;
        Ok::<_, FfiMenuError>(drinks.into_iter().map(Into::into).collect())
    })
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
