use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use calorie_tracker::api_connection::build_http_client;
use calorie_tracker::cli::{parse_args, Command, MealAction, RecipeAction, TargetsArgs};
use calorie_tracker::config::TrackerConfig;
use calorie_tracker::goals::{compute_target_report, DailyProgress};
use calorie_tracker::meal_aggregator::{Meal, MealProfile, Recipe};
use calorie_tracker::models::{ConsumedItem, MealTotals, NutrientRecord, SubscriptionPlan};
use calorie_tracker::search::{
    Barcode, FoodSource, LocalFoodTable, OpenFoodFactsSource, ResolveOutcome, Resolver,
    ResolverOptions, UsdaSource,
};
use calorie_tracker::store::JsonStore;
use calorie_tracker::unit_scaler::{scale, scale_servings};

const USER_AGENT: &str = concat!("calorie_tracker/", env!("CARGO_PKG_VERSION"));

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("calorie_tracker=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_local_table(config: &TrackerConfig) -> Result<LocalFoodTable> {
    match &config.local_foods_csv {
        Some(path) => LocalFoodTable::from_csv(path)
            .with_context(|| format!("Failed to load local foods from '{}'", path.display())),
        None => LocalFoodTable::curated().context("Failed to load the built-in food table"),
    }
}

fn build_resolver(config: &TrackerConfig, options: ResolverOptions) -> Result<Resolver> {
    let client = build_http_client(config.source_timeout, USER_AGENT)
        .context("Failed to build HTTP client")?;
    let local = load_local_table(config)?;
    info!(foods = local.len(), "local food table loaded");

    let sources: Vec<Box<dyn FoodSource>> = vec![
        Box::new(local),
        Box::new(UsdaSource::new(
            client.clone(),
            &config.usda_base_url,
            &config.usda_api_key,
        )),
        Box::new(OpenFoodFactsSource::new(client, &config.open_food_facts_base_url)),
    ];
    Ok(Resolver::new(sources, options))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MealView<'a> {
    name: &'a str,
    items: &'a [ConsumedItem],
    totals: MealTotals,
    profile: MealProfile,
}

fn meal_view(meal: &Meal) -> Result<MealView<'_>> {
    Ok(MealView {
        name: &meal.name,
        items: meal.items(),
        totals: meal.totals()?,
        profile: meal.profile()?,
    })
}

async fn run_targets(args: TargetsArgs, store: &JsonStore) -> Result<()> {
    let profile = match args.profile() {
        Some(profile) => profile,
        None if args.any_field_set() => {
            bail!(
                "Pass all of --age, --weight, --height, --sex, --activity and --goal, \
                 or none to use the saved profile"
            )
        }
        None => store
            .load_profile()
            .await?
            .ok_or_else(|| {
                anyhow!("No saved profile; pass the profile fields with --save first")
            })?,
    };

    let report = compute_target_report(&profile)?;
    if args.save {
        store.save_profile(&profile).await.context("Failed to save profile")?;
        info!("profile saved");
    }
    print_json(&report)
}

fn find_meal(meals: &[Meal], name: &str) -> Option<usize> {
    meals.iter().position(|m| m.name == name)
}

/// Top-ranked record for `food` across every source.
async fn resolve_best(config: &TrackerConfig, food: &str) -> Result<NutrientRecord> {
    let resolver = build_resolver(config, config.resolver_options())?;
    let outcome = resolver.resolve(food).await?;
    let best = match &outcome {
        ResolveOutcome::Found { results, .. } => results
            .first()
            .ok_or_else(|| anyhow!("No result for '{}'", food))?,
        other => bail!("No usable match for '{}': {}", food, describe_outcome(other)),
    };
    info!(food = %best.record.name, source = %best.source, "best match");
    Ok(best.record.clone())
}

async fn run_meal(action: MealAction, config: &TrackerConfig, store: &JsonStore) -> Result<()> {
    let mut meals = store.load_meals().await.context("Failed to load meals")?;

    match action {
        MealAction::Add { meal, food, grams } => {
            let record = resolve_best(config, &food).await?;

            let index = match find_meal(&meals, &meal) {
                Some(i) => i,
                None => {
                    meals.push(Meal::new(meal.clone()));
                    meals.len() - 1
                }
            };
            meals[index].add_item(record, grams)?;
            print_json(&meal_view(&meals[index])?)?;
        }
        MealAction::Remove { meal, index } => {
            let i = find_meal(&meals, &meal)
                .ok_or_else(|| anyhow!("No meal named '{}'", meal))?;
            let removed = meals[i]
                .remove_item(index)
                .ok_or_else(|| anyhow!("Meal '{}' has no item {}", meal, index))?;
            info!(food = %removed.record.name, "item removed");
            print_json(&meal_view(&meals[i])?)?;
        }
        MealAction::SetQuantity { meal, index, grams } => {
            let i = find_meal(&meals, &meal)
                .ok_or_else(|| anyhow!("No meal named '{}'", meal))?;
            if !meals[i].set_quantity(index, grams)? {
                bail!("Meal '{}' has no item {}", meal, index);
            }
            print_json(&meal_view(&meals[i])?)?;
        }
        MealAction::List => {
            let views = meals.iter().map(meal_view).collect::<Result<Vec<_>>>()?;
            return print_json(&views);
        }
        MealAction::Clear => {
            meals.clear();
        }
    }

    store.save_meals(&meals).await.context("Failed to save meals")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecipeView<'a> {
    name: &'a str,
    servings: u32,
    ingredients: &'a [ConsumedItem],
    profile: MealProfile,
    per_serving: MealTotals,
}

fn recipe_view(recipe: &Recipe) -> Result<RecipeView<'_>> {
    Ok(RecipeView {
        name: &recipe.name,
        servings: recipe.servings,
        ingredients: &recipe.ingredients,
        profile: recipe.profile()?,
        per_serving: recipe.per_serving()?,
    })
}

async fn run_recipe(
    action: RecipeAction,
    config: &TrackerConfig,
    store: &JsonStore,
) -> Result<()> {
    let mut recipes = store.load_recipes().await.context("Failed to load recipes")?;
    let find = |recipes: &[Recipe], name: &str| recipes.iter().position(|r| r.name == name);

    match action {
        RecipeAction::Create { name, servings } => {
            if servings == 0 {
                bail!("A recipe needs at least one serving");
            }
            if find(&recipes, &name).is_some() {
                bail!("Recipe '{}' already exists", name);
            }
            recipes.push(Recipe {
                name,
                servings,
                ingredients: Vec::new(),
            });
        }
        RecipeAction::Add { recipe, food, grams } => {
            let i = find(&recipes, &recipe)
                .ok_or_else(|| anyhow!("No recipe named '{}'", recipe))?;
            let record = resolve_best(config, &food).await?;
            recipes[i].ingredients.push(ConsumedItem::new(record, grams)?);
            print_json(&recipe_view(&recipes[i])?)?;
        }
        RecipeAction::List => {
            let views = recipes.iter().map(recipe_view).collect::<Result<Vec<_>>>()?;
            return print_json(&views);
        }
        RecipeAction::Delete { name } => {
            let i = find(&recipes, &name).ok_or_else(|| anyhow!("No recipe named '{}'", name))?;
            recipes.remove(i);
        }
    }

    store.save_recipes(&recipes).await.context("Failed to save recipes")
}

fn describe_outcome(outcome: &ResolveOutcome) -> String {
    match outcome {
        ResolveOutcome::Found { results, .. } => format!("{} results", results.len()),
        ResolveOutcome::NoMatches { .. } => "no source had a match".to_string(),
        ResolveOutcome::FilteredOut { discarded, .. } => {
            format!("all {} hits had invalid nutrition data", discarded)
        }
        ResolveOutcome::AllSourcesFailed { failures } => {
            let reasons: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.source, f.reason))
                .collect();
            format!("every source failed ({})", reasons.join("; "))
        }
    }
}

async fn run_search(query: &str, limit: Option<usize>, config: &TrackerConfig) -> Result<()> {
    let mut options = config.resolver_options();
    if let Some(limit) = limit {
        options.max_results = limit.max(1);
    }
    let resolver = build_resolver(config, options)?;
    let outcome = resolver.resolve(query).await?;
    if !outcome.is_found() {
        warn!("{}", describe_outcome(&outcome));
    }
    print_json(&outcome)
}

async fn run_barcode(
    code: &str,
    servings: Option<f64>,
    serving_grams: Option<f64>,
    config: &TrackerConfig,
) -> Result<()> {
    let barcode: Barcode = code.parse()?;
    let client = build_http_client(config.source_timeout, USER_AGENT)?;
    let source = OpenFoodFactsSource::new(client, &config.open_food_facts_base_url);
    let hit = source
        .lookup_barcode(&barcode)
        .await
        .with_context(|| format!("Barcode lookup failed for {}", barcode))?;

    let Some(servings) = servings else {
        return print_json(&hit);
    };
    let scaled = match serving_grams.or(hit.serving_size_g) {
        Some(size) => scale_servings(&hit.record, servings, size)?,
        None => {
            warn!("product has no serving size, treating servings as 100 g portions");
            scale(&hit.record, servings * 100.0)?
        }
    };
    print_json(&MealTotals::from_record(&scaled))
}

async fn run_progress(store: &JsonStore) -> Result<()> {
    let profile = store
        .load_profile()
        .await?
        .ok_or_else(|| anyhow!("No saved profile; run `targets ... --save` first"))?;
    let report = compute_target_report(&profile)?;

    let meals = store.load_meals().await?;
    let consumed = meals
        .iter()
        .map(Meal::totals)
        .sum::<Result<MealTotals, _>>()?;
    print_json(&DailyProgress::compute(&consumed, &report.targets))
}

async fn run_plan(plan: Option<SubscriptionPlan>, store: &JsonStore) -> Result<()> {
    if let Some(plan) = plan {
        store.save_plan(plan).await.context("Failed to save plan")?;
    }
    println!("{}", store.load_plan().await?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = TrackerConfig::from_env().context("Invalid configuration")?;
    let store = JsonStore::new(&config.data_dir);

    match parse_args().command {
        Command::Targets(args) => run_targets(args, &store).await,
        Command::Meal { action } => run_meal(action, &config, &store).await,
        Command::Recipe { action } => run_recipe(action, &config, &store).await,
        Command::Search { query, limit } => run_search(&query, limit, &config).await,
        Command::Barcode {
            code,
            servings,
            serving_grams,
        } => run_barcode(&code, servings, serving_grams, &config).await,
        Command::Progress => run_progress(&store).await,
        Command::Plan { plan } => run_plan(plan, &store).await,
    }
}
