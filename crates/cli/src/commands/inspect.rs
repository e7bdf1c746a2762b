//! Inspect command - decode a hash into a location

use anyhow::Result;
use hash_history_adapters::{MemoryHashPlatform, state::InMemoryStateStore};
use hash_history_domain::{HashPlatform, usecases::HashHistoryCore};
use std::path::PathBuf;
use std::rc::Rc;

use crate::args::InspectArgs;
use crate::config::AppConfig;

pub fn execute(args: InspectArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let options = config.history_options(&args.query_key);

    let platform = Rc::new(MemoryHashPlatform::new(&args.hash));
    let core = HashHistoryCore::new(platform.clone(), Rc::new(InMemoryStateStore::new()), &options);

    let rewritten = !core.ensure_slash();
    let location = core.get_current_location();
    let hash = format!("#{}", platform.hash_path());

    if args.json {
        let output = serde_json::json!({
            "hash": hash,
            "rewritten": rewritten,
            "query_key": options.query_key(),
            "pathname": location.pathname,
            "search": location.search,
            "key": location.key,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Hash:      {}{}", hash, if rewritten { " (normalized)" } else { "" });
        println!("Pathname:  {}", location.pathname);
        println!("Search:    {}", location.search);
        match location.key {
            Some(ref key) => println!("Key:       {}", key),
            None => println!("Key:       (none)"),
        }
    }

    Ok(())
}
