use std::env;
use std::sync::Arc;

use drink_menu::{
    AuthService, DrinkForm, DrinksService, Ingredient, MenuConfig, MenuError, ModalHost,
};
use log::{debug, info};

const USAGE: &str = "usage: drink-menu <list | create <title> <name:color:parts>... | delete <id>>";

/// The terminal has no real modal; closing the form just ends the command
struct TerminalModal;

impl ModalHost for TerminalModal {
    fn dismiss(&self) {
        debug!("Form dismissed");
    }
}

fn parse_ingredient(arg: &str) -> Result<Ingredient, String> {
    let mut fields = arg.splitn(3, ':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(name), Some(color), Some(parts)) => {
            let parts = parts
                .parse()
                .map_err(|_| format!("parts must be a number in '{}'", arg))?;
            Ok(Ingredient::new(name, color, parts))
        }
        _ => Err(format!("expected name:color:parts, got '{}'", arg)),
    }
}

fn open_form(service: &DrinksService, is_new: bool) -> drink_menu::DrinkFormBuilder {
    DrinkForm::builder()
        .store(Arc::new(service.clone()))
        .modal(Arc::new(TerminalModal))
        .auth(service.auth().clone())
        .is_new(is_new)
}

async fn list(service: &DrinksService) -> Result<(), MenuError> {
    for drink in service.fetch_drinks().await? {
        let recipe: Vec<String> = drink
            .recipe
            .iter()
            .map(|i| format!("{} {}x{}", i.name, i.color, i.parts))
            .collect();
        println!("{:>4}  {:<20} {}", drink.id, drink.title, recipe.join(", "));
    }
    Ok(())
}

async fn create(
    service: &DrinksService,
    title: &str,
    ingredients: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = open_form(service, true).build()?;
    form.set_title(title);

    for (index, arg) in ingredients.iter().enumerate() {
        if index > 0 {
            form.add_ingredient(index - 1);
        }
        if let Some(row) = form.ingredient_mut(index) {
            *row = parse_ingredient(arg)?;
        }
    }

    match form.save() {
        Ok(drink) => info!("Submitted '{}'", drink.title),
        Err(rejected) => return Err(format!("cannot save: {}", rejected.violations).into()),
    }

    service.settle().await;
    match service.drinks().into_iter().find(|d| d.title == title) {
        Some(drink) => println!("Created drink {} ({})", drink.id, drink.title),
        None => return Err("the API did not accept the drink".into()),
    }
    Ok(())
}

async fn delete(service: &DrinksService, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id: i64 = id.parse().map_err(|_| format!("invalid drink id '{}'", id))?;
    service.fetch_drinks().await?;
    let drink = service
        .get(id)
        .ok_or_else(|| format!("no drink with id {}", id))?;

    open_form(service, false).drink(drink).build()?.delete();
    service.settle().await;

    if service.get(id).is_some() {
        return Err(format!("the API did not delete drink {}", id).into());
    }
    println!("Deleted drink {}", id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).ok_or(USAGE)?;

    let config = MenuConfig::load()?;
    let auth = match env::var("DRINK_MENU_TOKEN") {
        Ok(token) => AuthService::from_token(token)?,
        Err(_) => AuthService::anonymous(),
    };
    let service = DrinksService::new(&config, auth)?;

    match command.as_str() {
        "list" => list(&service).await?,
        "create" => {
            let title = args.get(2).ok_or(USAGE)?;
            create(&service, title, &args[3..]).await?
        }
        "delete" => {
            let id = args.get(2).ok_or(USAGE)?;
            delete(&service, id).await?
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}
