//! Simulate command - replay a scripted navigation session

use anyhow::{Context, Result};
use hash_history_adapters::{
    BasicHistoryController, MemoryHashPlatform,
    state::{InMemoryStateStore, JsonFileStateStore},
};
use hash_history_domain::{
    HashPlatform, KeyedStateStore, Location, LocationListener, usecases::create_hash_history,
};
use serde::Deserialize;
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::args::SimulateArgs;
use crate::config::{AppConfig, StateBackend};

/// A navigation script
#[derive(Debug, Deserialize)]
pub struct Script {
    /// Hash the session starts on
    #[serde(default)]
    pub initial: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One scripted action
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Push {
        path: String,
        #[serde(default)]
        state: Option<Value>,
    },
    Replace {
        path: String,
        #[serde(default)]
        state: Option<Value>,
    },
    /// The user types a hash into the address bar
    SetHash { hash: String },
    Back,
    Forward,
    Go { n: i32 },
    /// Reject transitions to the listed pathnames (all transitions when empty)
    Block {
        #[serde(default)]
        paths: Vec<String>,
    },
    Unblock,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid script: {}", path.display()))
    }
}

pub fn execute(args: SimulateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let options = config.history_options(&args.query_key);
    let script = Script::load(&args.script)?;

    let store: Rc<dyn KeyedStateStore> = match (&args.state_file, config.state.backend) {
        (Some(path), _) => Rc::new(JsonFileStateStore::new(path)),
        (None, StateBackend::File) => Rc::new(JsonFileStateStore::new(&config.state.path)),
        (None, StateBackend::Memory) => Rc::new(InMemoryStateStore::new()),
    };

    tracing::info!(
        script = %args.script.display(),
        steps = script.steps.len(),
        query_key = ?options.query_key(),
        "Starting simulation"
    );

    let platform = Rc::new(MemoryHashPlatform::new(&script.initial));
    let controller_platform = platform.clone();
    let controller_options = options.clone();
    let history = create_hash_history(platform.clone(), store, &options, move |backend| {
        BasicHistoryController::new(backend, controller_platform, &controller_options)
    });

    let seen: Rc<RefCell<Vec<Location>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let listener: LocationListener =
        Rc::new(move |location: &Location| sink.borrow_mut().push(location.clone()));
    let handle = history.listen(listener);
    platform.flush_events();

    let controller = history.controller();
    for step in script.steps {
        tracing::debug!(?step, "Applying step");
        match step {
            Step::Push { path, state } => controller.push(&path, state),
            Step::Replace { path, state } => controller.replace(&path, state),
            Step::SetHash { hash } => platform.set_hash(&hash),
            Step::Back => controller.go_back(),
            Step::Forward => controller.go_forward(),
            Step::Go { n } => controller.go(n),
            Step::Block { paths } => controller.block(Rc::new(move |location| {
                !paths.is_empty() && !paths.contains(&location.pathname)
            })),
            Step::Unblock => controller.unblock(),
        }
        platform.flush_events();
    }

    handle.unlisten();

    let locations = seen.borrow();
    let final_hash = format!("#{}", platform.hash_path());

    if args.json {
        let output = serde_json::json!({
            "locations": &*locations,
            "final_hash": final_hash,
            "entries": platform.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for location in locations.iter() {
            print!("{:<8} {}", location.action, location.path());
            if let Some(ref key) = location.key {
                print!("  key={}", key);
            }
            if let Some(ref state) = location.state {
                print!("  state={}", state);
            }
            println!();
        }
        println!();
        println!("Final hash: {}", final_hash);
    }

    Ok(())
}
