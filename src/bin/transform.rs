use anyhow::{bail, Result};
use dialoguer::{Input, Select};
use reshare_etl::{combine, data_dir_from_env, date_stamp, discover_exports, init_tracing_once, CombineMethod};
use std::path::PathBuf;

fn main() -> Result<()> {
    init_tracing_once();
    let data_dir = data_dir_from_env();

    let pairs: Vec<_> = discover_exports(&data_dir)
        .into_iter()
        .filter_map(|((key, date), pair)| match (pair.posts, pair.reshares) {
            (Some(p), Some(r)) => Some((format!("{key} ({})", date_stamp(date)), p, r)),
            _ => None,
        })
        .collect();

    let (posts_path, reshares_path) = if pairs.is_empty() {
        println!("No complete exports found in {}.", data_dir.display());
        let p: String = Input::new().with_prompt("Path of the Tweets CSV").interact_text()?;
        let r: String = Input::new().with_prompt("Path of the Retweets CSV").interact_text()?;
        (PathBuf::from(p.trim()), PathBuf::from(r.trim()))
    } else {
        let labels: Vec<&str> = pairs.iter().map(|(l, _, _)| l.as_str()).collect();
        let idx = Select::new().with_prompt("Export to transform").items(&labels[..]).default(0).interact()?;
        let (_, p, r) = &pairs[idx];
        (p.clone(), r.clone())
    };

    let method_idx = Select::new()
        .with_prompt("Combine method")
        .items(&CombineMethod::ALL[..])
        .default(0)
        .interact()?;
    let method = CombineMethod::ALL[method_idx];

    let default_out = data_dir.join(format!("combined_{method}.ndjson"));
    let out: String = Input::new()
        .with_prompt("Output file")
        .default(default_out.display().to_string())
        .interact_text()?;
    let out = PathBuf::from(out.trim());

    let combined = combine(&posts_path, &reshares_path, method)?;
    let n = match out.extension().and_then(|e| e.to_str()) {
        Some("csv") => combined.write_csv(&out)?,
        Some("ndjson") | Some("jsonl") => combined.write_ndjson(&out)?,
        _ => bail!("output must end in .ndjson, .jsonl or .csv: {}", out.display()),
    };
    println!("Wrote {} rows to {}", n, out.display());
    Ok(())
}
