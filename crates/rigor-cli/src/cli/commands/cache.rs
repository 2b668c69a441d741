use super::score::{open_cache, pipeline_config};
use crate::cli::args::{CacheArgs, CacheSub};
use crate::exit_codes::SUCCESS;
use rigor_core::ScoreCache;

pub fn run(args: CacheArgs) -> anyhow::Result<i32> {
    match args.cmd {
        CacheSub::Stats { cache_db } => {
            let stats = open_cache(&cache_db)?.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        CacheSub::Purge {
            cache_db,
            config,
            keep_version,
        } => {
            let keep = match keep_version {
                Some(v) => v,
                None => pipeline_config(config.as_deref())?.cache_version,
            };
            let purged = open_cache(&cache_db)?.purge_other_versions(keep)?;
            println!("purged {} entries (kept version {})", purged, keep);
        }
    }
    Ok(SUCCESS)
}
