mod drinks;

pub use drinks::DrinksService;

use crate::model::Drink;

/// Persistence collaborator used by the drink form.
///
/// Both calls are fire-and-forget: implementations return immediately and
/// report failures on their own. Whether a save creates or updates is decided
/// by the implementation from [`Drink::is_new`].
pub trait DrinkStore: Send + Sync {
    fn save_drink(&self, drink: Drink);

    fn delete_drink(&self, drink: Drink);
}

/// The presentation surface hosting the form
pub trait ModalHost: Send + Sync {
    /// Close the surface. Carries no indication of which action closed it.
    fn dismiss(&self);
}
