use std::sync::Arc;

use log::debug;

use crate::auth::AuthService;
use crate::error::MenuError;
use crate::form::DrinkForm;
use crate::model::Drink;
use crate::services::{DrinkStore, ModalHost};

/// Builder for opening a [`DrinkForm`]
///
/// The store and modal host are required. The drink is required in edit mode
/// and ignored in create mode, which always starts from a blank draft.
#[derive(Default)]
pub struct DrinkFormBuilder {
    drink: Option<Drink>,
    is_new: bool,
    store: Option<Arc<dyn DrinkStore>>,
    modal: Option<Arc<dyn ModalHost>>,
    auth: Option<AuthService>,
}

impl DrinkFormBuilder {
    /// Set the drink to edit
    ///
    /// The form keeps its own copy; the caller's value is never touched.
    pub fn drink(mut self, drink: Drink) -> Self {
        self.drink = Some(drink);
        self
    }

    /// Open in create mode (`true`) or edit mode (`false`, the default)
    pub fn is_new(mut self, is_new: bool) -> Self {
        self.is_new = is_new;
        self
    }

    /// Set the persistence collaborator that receives saves and deletes
    pub fn store(mut self, store: Arc<dyn DrinkStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the modal host dismissed when the session ends
    pub fn modal(mut self, modal: Arc<dyn ModalHost>) -> Self {
        self.modal = Some(modal);
        self
    }

    /// Set the identity used to decide which controls are shown
    ///
    /// Defaults to an anonymous identity.
    pub fn auth(mut self, auth: AuthService) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Open the form
    ///
    /// # Errors
    /// Returns `MenuError::Builder` if:
    /// - No store or modal host was given
    /// - Edit mode was requested without a drink
    pub fn build(self) -> Result<DrinkForm, MenuError> {
        let store = self.store.ok_or_else(|| {
            MenuError::Builder("No drink store specified. Use .store()".to_string())
        })?;
        let modal = self.modal.ok_or_else(|| {
            MenuError::Builder("No modal host specified. Use .modal()".to_string())
        })?;

        let drink = if self.is_new {
            if let Some(ignored) = &self.drink {
                debug!("Create mode ignores supplied drink '{}'", ignored.title);
            }
            Drink::draft()
        } else {
            self.drink.ok_or_else(|| {
                MenuError::Builder(
                    "No drink to edit. Use .drink() or .is_new(true)".to_string(),
                )
            })?
        };

        Ok(DrinkForm::open(
            drink,
            self.is_new,
            store,
            modal,
            self.auth.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::tests::{CountingModal, RecordingStore};

    #[test]
    fn test_missing_store() {
        let result = DrinkForm::builder()
            .modal(Arc::new(CountingModal::default()))
            .is_new(true)
            .build();
        assert!(matches!(result, Err(MenuError::Builder(_))));
    }

    #[test]
    fn test_missing_modal() {
        let result = DrinkForm::builder()
            .store(Arc::new(RecordingStore::default()))
            .is_new(true)
            .build();
        assert!(matches!(result, Err(MenuError::Builder(_))));
    }

    #[test]
    fn test_edit_mode_requires_drink() {
        let result = DrinkForm::builder()
            .store(Arc::new(RecordingStore::default()))
            .modal(Arc::new(CountingModal::default()))
            .build();
        match result {
            Err(MenuError::Builder(msg)) => assert!(msg.contains(".drink()")),
            other => panic!("expected builder error, got {:?}", other.map(|f| f.is_new())),
        }
    }

    #[test]
    fn test_each_create_session_gets_a_fresh_draft() {
        let store: Arc<RecordingStore> = Arc::new(RecordingStore::default());
        let modal: Arc<CountingModal> = Arc::new(CountingModal::default());

        let mut first = DrinkForm::builder()
            .store(store.clone())
            .modal(modal.clone())
            .is_new(true)
            .build()
            .unwrap();
        first.set_title("Mocha");
        first.add_ingredient(0);
        first.cancel();

        let second = DrinkForm::builder()
            .store(store)
            .modal(modal)
            .is_new(true)
            .build()
            .unwrap();
        assert_eq!(second.drink(), &Drink::draft());
    }
}
