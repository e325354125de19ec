//! Recipe editor form
//!
//! A [`DrinkForm`] owns a draft of one drink for the length of an editing
//! session. Rows can be inserted and removed freely; invariants are only
//! checked when the draft is submitted. Every session ends in exactly one of
//! [`DrinkForm::save`], [`DrinkForm::delete`] or [`DrinkForm::cancel`], each of
//! which dismisses the hosting modal.
//!
//! In edit mode the form works on its own copy of the caller's drink. Nothing
//! the user does is visible outside the form until a save hands the draft to
//! the store, so cancelling really discards the edits.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::auth::{AuthService, Permission};
use crate::builder::DrinkFormBuilder;
use crate::model::{Drink, Ingredient};
use crate::services::{DrinkStore, ModalHost};
use crate::validation::{self, Violations};

pub struct DrinkForm {
    drink: Drink,
    is_new: bool,
    store: Arc<dyn DrinkStore>,
    modal: Arc<dyn ModalHost>,
    auth: AuthService,
}

/// A save that did not pass validation. The form stays open.
pub struct SaveRejected {
    pub form: DrinkForm,
    pub violations: Violations,
}

impl fmt::Debug for SaveRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveRejected")
            .field("drink", &self.form.drink)
            .field("violations", &self.violations)
            .finish()
    }
}

impl fmt::Debug for DrinkForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrinkForm")
            .field("drink", &self.drink)
            .field("is_new", &self.is_new)
            .finish_non_exhaustive()
    }
}

impl DrinkForm {
    /// Creates a new builder for opening a form
    pub fn builder() -> DrinkFormBuilder {
        DrinkFormBuilder::default()
    }

    /// Open a form. A new session always starts from a fresh draft;
    /// an edit session starts from `drink`.
    pub(crate) fn open(
        drink: Drink,
        is_new: bool,
        store: Arc<dyn DrinkStore>,
        modal: Arc<dyn ModalHost>,
        auth: AuthService,
    ) -> Self {
        debug!(
            "Opening {} form for '{}'",
            if is_new { "create" } else { "edit" },
            drink.title
        );
        DrinkForm {
            drink,
            is_new,
            store,
            modal,
            auth,
        }
    }

    pub fn drink(&self) -> &Drink {
        &self.drink
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn title(&self) -> &str {
        &self.drink.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.drink.title = title.into();
    }

    pub fn recipe(&self) -> &[Ingredient] {
        &self.drink.recipe
    }

    /// Row at `index`, for binding its fields to inputs
    pub fn ingredient_mut(&mut self, index: usize) -> Option<&mut Ingredient> {
        self.drink.recipe.get_mut(index)
    }

    /// Insert a blank row right after `at_index`.
    ///
    /// Inserting after the last row (or past it) appends; on an empty recipe
    /// the row becomes the only one.
    pub fn add_ingredient(&mut self, at_index: usize) {
        let position = at_index.saturating_add(1).min(self.drink.recipe.len());
        self.drink.recipe.insert(position, Ingredient::blank());
        debug!("Added ingredient row at {}", position);
    }

    /// Remove the row at `at_index`. Out-of-range indexes leave the recipe alone.
    pub fn remove_ingredient(&mut self, at_index: usize) -> Option<Ingredient> {
        if at_index >= self.drink.recipe.len() {
            warn!(
                "Ignoring removal of ingredient {} from a recipe of {}",
                at_index,
                self.drink.recipe.len()
            );
            return None;
        }
        Some(self.drink.recipe.remove(at_index))
    }

    /// Whether the recipe rows are submittable. The title is not considered.
    pub fn validate(&self) -> bool {
        validation::validate_recipe(&self.drink.recipe)
    }

    /// Every invariant the draft currently fails, title included
    pub fn check(&self) -> Result<(), Violations> {
        validation::check_drink(&self.drink)
    }

    /// Whether the current identity may see the delete control
    pub fn can_delete(&self) -> bool {
        !self.is_new && self.auth.can(Permission::DeleteDrinks)
    }

    /// Whether the current identity may submit this draft
    pub fn can_save(&self) -> bool {
        let needed = if self.drink.is_new() {
            Permission::PostDrinks
        } else {
            Permission::PatchDrinks
        };
        self.auth.can(needed)
    }

    /// Submit the draft and close the modal.
    ///
    /// The store call is not awaited. On success the submitted drink is
    /// returned so the caller can apply it to its own copy. An invalid draft
    /// is not submitted; the form comes back open along with the reasons.
    pub fn save(self) -> Result<Drink, SaveRejected> {
        if let Err(violations) = self.check() {
            debug!("Save refused: {}", violations);
            return Err(SaveRejected {
                form: self,
                violations,
            });
        }

        info!("Saving drink '{}'", self.drink.title);
        self.store.save_drink(self.drink.clone());
        self.modal.dismiss();
        Ok(self.drink)
    }

    /// Delete the drink and close the modal. Not gated by validation.
    pub fn delete(self) {
        info!("Deleting drink '{}'", self.drink.title);
        self.store.delete_drink(self.drink);
        self.modal.dismiss();
    }

    /// Close the modal, discarding the draft
    pub fn cancel(self) {
        debug!("Discarding draft '{}'", self.drink.title);
        self.modal.dismiss();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::token_with;
    use crate::validation::Violation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub saved: Mutex<Vec<Drink>>,
        pub deleted: Mutex<Vec<Drink>>,
    }

    impl DrinkStore for RecordingStore {
        fn save_drink(&self, drink: Drink) {
            self.saved.lock().unwrap().push(drink);
        }

        fn delete_drink(&self, drink: Drink) {
            self.deleted.lock().unwrap().push(drink);
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingModal {
        pub dismissed: AtomicUsize,
    }

    impl ModalHost for CountingModal {
        fn dismiss(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn latte() -> Drink {
        Drink {
            id: -1,
            title: "Latte".to_string(),
            recipe: vec![
                Ingredient::new("Espresso", "brown", 1.0),
                Ingredient::new("Milk", "white", 3.0),
            ],
        }
    }

    fn rows(names: &[&str]) -> Drink {
        Drink {
            id: 7,
            title: "Layers".to_string(),
            recipe: names.iter().map(|n| Ingredient::new(*n, "red", 1.0)).collect(),
        }
    }

    fn setup(
        drink: Option<Drink>,
        is_new: bool,
    ) -> (DrinkForm, Arc<RecordingStore>, Arc<CountingModal>) {
        let store = Arc::new(RecordingStore::default());
        let modal = Arc::new(CountingModal::default());
        let mut builder = DrinkForm::builder()
            .store(store.clone())
            .modal(modal.clone())
            .is_new(is_new);
        if let Some(drink) = drink {
            builder = builder.drink(drink);
        }
        (builder.build().unwrap(), store, modal)
    }

    fn names(form: &DrinkForm) -> Vec<&str> {
        form.recipe().iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_new_form_starts_from_blank_draft() {
        let (form, _, _) = setup(None, true);
        assert_eq!(
            form.drink(),
            &Drink {
                id: -1,
                title: String::new(),
                recipe: vec![Ingredient::new("", "white", 1.0)],
            }
        );
        assert!(form.is_new());
    }

    #[test]
    fn test_new_form_ignores_supplied_drink() {
        let (form, _, _) = setup(Some(latte()), true);
        assert_eq!(form.title(), "");
        assert_eq!(form.recipe().len(), 1);
    }

    #[test]
    fn test_add_ingredient_inserts_after_index() {
        let (mut form, _, _) = setup(Some(rows(&["a", "b", "c"])), false);

        form.add_ingredient(1);

        assert_eq!(names(&form), vec!["a", "b", "", "c"]);
        assert_eq!(form.recipe()[2], Ingredient::blank());
    }

    #[test]
    fn test_add_ingredient_default_lands_after_first_row() {
        let (mut form, _, _) = setup(Some(rows(&["a", "b"])), false);
        form.add_ingredient(0);
        assert_eq!(names(&form), vec!["a", "", "b"]);
    }

    #[test]
    fn test_add_ingredient_at_end_appends() {
        let (mut form, _, _) = setup(Some(rows(&["a", "b"])), false);
        form.add_ingredient(2);
        assert_eq!(names(&form), vec!["a", "b", ""]);

        form.add_ingredient(99);
        assert_eq!(form.recipe().len(), 4);
    }

    #[test]
    fn test_add_ingredient_at_max_index_appends() {
        let (mut form, _, _) = setup(Some(rows(&["a", "b"])), false);
        form.add_ingredient(usize::MAX);
        assert_eq!(names(&form), vec!["a", "b", ""]);
    }

    #[test]
    fn test_add_ingredient_to_empty_recipe() {
        let (mut form, _, _) = setup(Some(rows(&[])), false);
        form.add_ingredient(0);
        assert_eq!(form.recipe(), &[Ingredient::blank()]);
    }

    #[test]
    fn test_remove_ingredient_preserves_order() {
        let (mut form, _, _) = setup(Some(rows(&["a", "b", "c"])), false);

        let removed = form.remove_ingredient(1).unwrap();

        assert_eq!(removed.name, "b");
        assert_eq!(names(&form), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_ingredient_out_of_range() {
        let (mut form, _, _) = setup(Some(rows(&["a"])), false);
        assert!(form.remove_ingredient(1).is_none());
        assert_eq!(names(&form), vec!["a"]);
    }

    #[test]
    fn test_remove_down_to_empty_then_validate() {
        let (mut form, _, _) = setup(Some(rows(&["a"])), false);
        form.remove_ingredient(0);
        assert!(form.recipe().is_empty());
        assert!(!form.validate());
    }

    #[test]
    fn test_validate_ignores_title() {
        let mut drink = latte();
        drink.title.clear();
        let (form, _, _) = setup(Some(drink), false);

        assert!(form.validate());
        assert!(form.validate());
        assert_eq!(
            form.check().unwrap_err().into_iter().collect::<Vec<_>>(),
            vec![Violation::EmptyTitle]
        );
    }

    #[test]
    fn test_save_hands_drink_to_store_then_dismisses() {
        let (form, store, modal) = setup(Some(latte()), false);

        let saved = form.save().unwrap();

        assert_eq!(saved, latte());
        assert_eq!(*store.saved.lock().unwrap(), vec![latte()]);
        assert_eq!(modal.dismissed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_save_blocked_by_empty_title() {
        let mut drink = latte();
        drink.title.clear();
        let (form, store, modal) = setup(Some(drink), false);

        let rejected = form.save().unwrap_err();

        assert!(rejected.violations.contains(&Violation::EmptyTitle));
        assert!(store.saved.lock().unwrap().is_empty());
        assert_eq!(modal.dismissed.load(Ordering::SeqCst), 0);

        // The returned form is still usable
        let mut form = rejected.form;
        form.set_title("Latte");
        assert!(form.save().is_ok());
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_save_blocked_by_blank_row() {
        let (mut form, store, _) = setup(Some(latte()), false);
        form.add_ingredient(1);

        let rejected = form.save().unwrap_err();
        assert!(rejected
            .violations
            .contains(&Violation::MissingName { index: 2 }));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_is_not_validated() {
        let (mut form, store, modal) = setup(Some(latte()), false);
        form.set_title("");
        form.remove_ingredient(0);
        let draft = form.drink().clone();

        form.delete();

        assert_eq!(*store.deleted.lock().unwrap(), vec![draft]);
        assert!(store.saved.lock().unwrap().is_empty());
        assert_eq!(modal.dismissed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_discards_edits() {
        let original = latte();
        let (mut form, store, modal) = setup(Some(original.clone()), false);
        form.set_title("Flat White");
        if let Some(milk) = form.ingredient_mut(1) {
            milk.parts = 2.0;
        }

        form.cancel();

        assert_eq!(original.title, "Latte");
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(store.deleted.lock().unwrap().is_empty());
        assert_eq!(modal.dismissed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_privileged_controls() {
        let store = Arc::new(RecordingStore::default());
        let modal = Arc::new(CountingModal::default());
        let auth = AuthService::from_token(token_with(
            r#"{"permissions": ["patch:drinks", "delete:drinks"]}"#,
        ))
        .unwrap();

        let mut existing = latte();
        existing.id = 4;
        let edit = DrinkForm::builder()
            .store(store.clone())
            .modal(modal.clone())
            .auth(auth.clone())
            .drink(existing)
            .build()
            .unwrap();
        assert!(edit.can_delete());
        assert!(edit.can_save());

        let create = DrinkForm::builder()
            .store(store)
            .modal(modal)
            .auth(auth)
            .is_new(true)
            .build()
            .unwrap();
        assert!(!create.can_delete());
        assert!(!create.can_save());
    }
}
