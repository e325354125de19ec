//! Drink menu client for the coffee shop app.
//!
//! The centrepiece is [`DrinkForm`], the recipe editor used to create, edit
//! and delete drinks. It talks to the outside world through two narrow
//! collaborators: a [`DrinkStore`] for persistence (normally the HTTP-backed
//! [`DrinksService`]) and a [`ModalHost`] that owns the presentation surface.

pub mod auth;
pub mod builder;
pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod services;
pub mod validation;

// UniFFI bindings for mobile platforms
pub mod uniffi_bindings;

pub use auth::{AuthService, Permission};
pub use builder::DrinkFormBuilder;
pub use config::MenuConfig;
pub use error::MenuError;
pub use form::{DrinkForm, SaveRejected};
pub use model::{Drink, Ingredient, NEW_DRINK_ID};
pub use services::{DrinkStore, DrinksService, ModalHost};
pub use validation::{Violation, Violations};

/// Fetch the current menu with the given configuration and identity
///
/// # Example
/// ```no_run
/// use drink_menu::{fetch_menu, AuthService, MenuConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let drinks = fetch_menu(&MenuConfig::default(), AuthService::anonymous()).await?;
/// for drink in drinks {
///     println!("{}", drink.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn fetch_menu(config: &MenuConfig, auth: AuthService) -> Result<Vec<Drink>, MenuError> {
    DrinksService::new(config, auth)?.fetch_drinks().await
}
