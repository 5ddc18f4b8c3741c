use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use reshare_etl::{
    credentials_path_from_env, data_dir_from_env, init_tracing_once, CollectOptions, Collector, Credentials,
    Exporter, ResultMode, TwitterClient,
};

fn main() -> Result<()> {
    init_tracing_once();

    let creds_path = credentials_path_from_env();
    let creds = Credentials::load(&creds_path)?;
    let data_dir = data_dir_from_env();

    let search_key: String = Input::new().with_prompt("Type in Search Key").interact_text()?;
    let target_count: usize = Input::new().with_prompt("Type in amount of Tweets").interact_text()?;
    let upper_limit: u64 = Input::new()
        .with_prompt("Type upper limit of Retweets for one Tweet")
        .interact_text()?;
    let lower_limit: u64 = Input::new()
        .with_prompt("Type lower limit of Retweets for one Tweet")
        .interact_text()?;
    let mode_idx = Select::new()
        .with_prompt("Search Criterion")
        .items(&ResultMode::ALL[..])
        .default(0)
        .interact()?;

    let opts = CollectOptions::new(search_key.trim())
        .with_target_count(target_count)
        .with_band(lower_limit, upper_limit)
        .with_result_mode(ResultMode::ALL[mode_idx])
        .with_language("en");

    let client = TwitterClient::new(creds).context("build API client")?;
    let mut collector = Collector::connect(client, opts)?;
    let exporter = Exporter::new(&data_dir);

    // Posts gathered before a failed page are written out before the error is returned.
    let collected = collector.collect_posts();
    println!("{} Tweets collected...", collector.posts().len());
    if collected.is_ok() || !collector.posts().is_empty() {
        exporter.export_posts(collector.search_key(), collector.posts())?;
        println!("CSV-File for Tweets was written.");
    }
    collected?;

    collector.collect_reshares()?;
    println!("{} Retweets collected....", collector.reshare_total());
    exporter.export_reshares(collector.search_key(), collector.reshares())?;
    println!("CSV-File for Retweets was written.");

    Ok(())
}
