use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use rusty_baseline::baseline::{Method, ParamRanges, Params};
use rusty_baseline::data::{load_file, write_csv, LoadOptions};
use rusty_baseline::remove::{remove_baseline, remove_baseline_segmented, Removal};

const USAGE: &str = "\
usage: rusty-baseline <input.csv|input.parquet> <method> [options]
       rusty-baseline --ranges

options:
  --params <json>    parameter overrides, e.g. '{\"window_size\": 301}'
  --out <prefix>     output prefix (default: input file stem)
  --group <name>     spectral column group (default: wvl)
  --segment          fit each gap-free wavelength run separately
  --ranges           print every method's parameter ranges as JSON";

#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    method: Option<String>,
    params: Option<String>,
    out: Option<PathBuf>,
    group: Option<String>,
    segment: bool,
    ranges: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut positional = Vec::new();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--params" => args.params = Some(raw.next().context("--params needs a value")?),
            "--out" => args.out = Some(raw.next().context("--out needs a value")?.into()),
            "--group" => args.group = Some(raw.next().context("--group needs a value")?),
            "--segment" => args.segment = true,
            "--ranges" => args.ranges = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    args.input = positional.next().map(PathBuf::from);
    args.method = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{extra}'\n\n{USAGE}");
    }
    Ok(args)
}

fn print_ranges() -> Result<()> {
    let all: BTreeMap<&str, ParamRanges> = Method::ALL
        .iter()
        .map(|m| (m.display_name(), m.build(None).param_ranges()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&all)?);
    Ok(())
}

fn output_prefix(args: &Args, input: &Path) -> PathBuf {
    args.out.clone().unwrap_or_else(|| input.with_extension(""))
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn run(args: Args) -> Result<()> {
    if args.ranges {
        return print_ranges();
    }
    let (Some(input), Some(method)) = (args.input.as_deref(), args.method.as_deref()) else {
        bail!("missing input file or method\n\n{USAGE}");
    };

    let params: Option<Params> = args
        .params
        .as_deref()
        .map(serde_json::from_str::<Params>)
        .transpose()
        .context("parsing --params as a JSON object")?;

    let options = LoadOptions {
        spectral_group: args.group.clone().unwrap_or_else(|| LoadOptions::default().spectral_group),
    };
    let dataset = load_file(input, &options)
        .with_context(|| format!("loading {}", input.display()))?;

    let removal = if args.segment {
        remove_baseline_segmented(&dataset, method, params.as_ref())
    } else {
        remove_baseline(&dataset, method, params.as_ref())
    };
    let Removal::Removed {
        corrected,
        baseline,
    } = removal
    else {
        let known: Vec<&str> = Method::ALL.iter().map(|m| m.display_name()).collect();
        bail!(
            "method '{method}' not recognized, no baseline removed (known: {})",
            known.join(", ")
        );
    };

    let prefix = output_prefix(&args, input);
    write_csv(&with_suffix(&prefix, "_corrected.csv"), &corrected)?;
    write_csv(&with_suffix(&prefix, "_baseline.csv"), &baseline)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let result = parse_args(std::env::args().skip(1)).and_then(run);
    if let Err(e) = result {
        log::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
