use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

use crate::auth::{AuthService, Permission};
use crate::config::MenuConfig;
use crate::error::MenuError;
use crate::model::{Drink, Ingredient};
use crate::services::DrinkStore;

/// HTTP client for the drinks API, with a local cache of the menu
#[derive(Clone)]
pub struct DrinksService {
    client: Client,
    base_url: String,
    auth: AuthService,
    drinks: Arc<Mutex<BTreeMap<i64, Drink>>>,
    pending: Arc<Mutex<JoinSet<()>>>,
    runtime: Handle,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    drinks: Vec<Drink>,
    error: Option<u16>,
    /// A string, or an object with a `description` for auth failures
    message: Option<Value>,
}

#[derive(Debug, Serialize)]
struct DrinkPayload<'a> {
    title: &'a str,
    recipe: &'a [Ingredient],
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DrinksService {
    /// Create a service from configuration.
    ///
    /// Must be called from within a tokio runtime; background saves and
    /// deletes are spawned onto it.
    pub fn new(config: &MenuConfig, auth: AuthService) -> Result<Self, MenuError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Self::with_client(client, config.base_url().to_string(), auth)
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, auth: AuthService) -> Result<Self, MenuError> {
        Self::with_client(Client::new(), base_url, auth)
    }

    fn with_client(client: Client, base_url: String, auth: AuthService) -> Result<Self, MenuError> {
        let runtime = Handle::try_current().map_err(|e| MenuError::Runtime(e.to_string()))?;
        Ok(DrinksService {
            client,
            base_url,
            auth,
            drinks: Arc::new(Mutex::new(BTreeMap::new())),
            pending: Arc::new(Mutex::new(JoinSet::new())),
            runtime,
        })
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Snapshot of the cached menu, ordered by id
    pub fn drinks(&self) -> Vec<Drink> {
        lock(&self.drinks).values().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<Drink> {
        lock(&self.drinks).get(&id).cloned()
    }

    /// Reload the menu from the API, replacing the cache.
    ///
    /// Uses the detailed listing (with ingredient names) when the identity
    /// is allowed to see it.
    pub async fn fetch_drinks(&self) -> Result<Vec<Drink>, MenuError> {
        let path = if self.auth.can(Permission::GetDrinksDetail) {
            "/drinks-detail"
        } else {
            "/drinks"
        };

        let envelope = read_envelope(self.request(Method::GET, path).send().await?).await?;
        debug!("Fetched {} drinks from {}", envelope.drinks.len(), path);

        let mut cache = lock(&self.drinks);
        *cache = envelope
            .drinks
            .iter()
            .map(|drink| (drink.id, drink.clone()))
            .collect();
        Ok(envelope.drinks)
    }

    /// Create or update `drink` depending on whether it already has an id.
    /// Returns the drink as stored by the API.
    pub async fn persist(&self, drink: &Drink) -> Result<Drink, MenuError> {
        let payload = DrinkPayload {
            title: &drink.title,
            recipe: &drink.recipe,
        };
        let request = if drink.is_new() {
            self.request(Method::POST, "/drinks")
        } else {
            self.request(Method::PATCH, &format!("/drinks/{}", drink.id))
        };

        let response = request.json(&payload).send().await?;
        let status = response.status().as_u16();
        let saved = read_envelope(response)
            .await?
            .drinks
            .into_iter()
            .next()
            .ok_or_else(|| MenuError::Api {
                status,
                message: "response carried no drink".to_string(),
            })?;

        debug!("Stored drink {} ({})", saved.id, saved.title);
        lock(&self.drinks).insert(saved.id, saved.clone());
        Ok(saved)
    }

    /// Delete `drink` from the API and the cache.
    /// A draft that was never persisted has nothing to delete.
    pub async fn remove(&self, drink: &Drink) -> Result<(), MenuError> {
        if drink.is_new() {
            debug!("Skipping delete of unsaved drink '{}'", drink.title);
            return Ok(());
        }

        let path = format!("/drinks/{}", drink.id);
        read_envelope(self.request(Method::DELETE, &path).send().await?).await?;

        lock(&self.drinks).remove(&drink.id);
        Ok(())
    }

    /// Wait for every background save or delete issued so far
    pub async fn settle(&self) {
        let mut pending = self.take_pending();
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                error!("Background request did not finish: {}", e);
            }
        }
    }

    fn take_pending(&self) -> JoinSet<()> {
        std::mem::replace(&mut *lock(&self.pending), JoinSet::new())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.auth.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn spawn<F>(&self, action: &'static str, title: String, request: F)
    where
        F: Future<Output = Result<(), MenuError>> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        // Finished tasks stay in the set until joined
        while pending.try_join_next().is_some() {}
        pending.spawn_on(
            async move {
                match request.await {
                    Ok(()) => info!("{} of '{}' completed", action, title),
                    Err(e) => error!("{} of '{}' failed: {}", action, title, e),
                }
            },
            &self.runtime,
        );
    }
}

async fn read_envelope(response: Response) -> Result<Envelope, MenuError> {
    let status = response.status();
    let body = response.bytes().await?;

    let envelope: Envelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(MenuError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if !envelope.success || !status.is_success() {
        return Err(MenuError::Api {
            status: envelope.error.unwrap_or_else(|| status.as_u16()),
            message: match envelope.message {
                Some(message) => message_text(message),
                None => status.canonical_reason().unwrap_or("").to_string(),
            },
        });
    }
    Ok(envelope)
}

fn message_text(message: Value) -> String {
    match message {
        Value::String(text) => text,
        Value::Object(ref fields) => match fields.get("description") {
            Some(Value::String(text)) => text.clone(),
            _ => message.to_string(),
        },
        other => other.to_string(),
    }
}

impl DrinkStore for DrinksService {
    fn save_drink(&self, drink: Drink) {
        let me = self.clone();
        let title = drink.title.clone();
        self.spawn("save", title, async move {
            me.persist(&drink).await.map(|_| ())
        });
    }

    fn delete_drink(&self, drink: Drink) {
        let me = self.clone();
        let title = drink.title.clone();
        self.spawn("delete", title, async move { me.remove(&drink).await });
    }
}
