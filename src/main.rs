use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use sdm_rust::cod::CodStore;
use sdm_rust::config::Settings;
use sdm_rust::data_io::reader::{read_point_list, DailyArchiveReader};
use sdm_rust::data_io::writer::{write_full_grid, write_point_list};
use sdm_rust::extractor::GriddedExtractor;
use sdm_rust::mask::MaskReader;
use sdm_rust::parameters::DatasetIdentity;

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("cod-path", sub)) => run_cod_path(&matches, sub),
        Some(("extract", sub)) => run_extract(&matches, sub),
        Some(("extract-from", sub)) => run_extract_from(&matches, sub),
        Some(("to-3d", sub)) => run_to_3d(&matches, sub),
        _ => {
            eprintln!("Please specify a subcommand. Use --help for more information.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    let identity_args = [
        Arg::new("model")
            .short('m')
            .long("model")
            .required(true)
            .help("model name, e.g. NNR, AWAP, or a coupled model"),
        Arg::new("scenario")
            .short('c')
            .long("scenario")
            .default_value("")
            .help("scenario name, e.g. historical, rcp45, rcp85"),
        Arg::new("region-type")
            .short('r')
            .long("region-type")
            .required(true)
            .help("pre-defined region type name, e.g. sea, sec, tas"),
        Arg::new("season")
            .short('s')
            .long("season")
            .required(true)
            .help("season number, e.g. 1 (DJF), 2 (MAM), 3 (JJA), or 4 (SON)"),
        Arg::new("predictand")
            .short('p')
            .long("predictand")
            .required(true)
            .help("predictand name, e.g. rain, tmax, tmin"),
    ];

    Command::new("sdm_rust")
        .about("Gridded analog-date extraction for statistical downscaling")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("settings file, defaults to ~/.sdm.toml"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("be more chatty (repeat for more)"),
        )
        .subcommand(
            Command::new("cod-path")
                .about("Print the full path to a CoD file")
                .args(identity_args.clone()),
        )
        .subcommand(
            Command::new("extract")
                .about("Extract gridded data for an explicitly given identity")
                .arg(Arg::new("output").required(true).help("output NetCDF file"))
                .args(identity_args)
                .arg(
                    Arg::new("region")
                        .short('R')
                        .long("region")
                        .help("mask region to extract (defaults to region-type)"),
                )
                .arg(
                    Arg::new("point-list")
                        .long("point-list")
                        .action(ArgAction::SetTrue)
                        .help("write the masked point-list layout instead of the full-grid cube"),
                ),
        )
        .subcommand(
            Command::new("extract-from")
                .about("Extract gridded data using an existing CoD file path")
                .arg(Arg::new("cod-file").required(true).help("full path to the CoD file"))
                .arg(Arg::new("output").required(true).help("output NetCDF file"))
                .arg(
                    Arg::new("region")
                        .short('R')
                        .long("region")
                        .help("mask region to extract (defaults to region-type)"),
                )
                .arg(
                    Arg::new("point-list")
                        .long("point-list")
                        .action(ArgAction::SetTrue)
                        .help("write the masked point-list layout instead of the full-grid cube"),
                ),
        )
        .subcommand(
            Command::new("to-3d")
                .about("Convert a point-list (dates, gpnames) file to a full (time, lat, lon) cube")
                .arg(Arg::new("input").required(true).help("point-list input file"))
                .arg(Arg::new("output").required(true).help("full-grid output file")),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sdm_rust={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_settings(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let path = match matches.get_one::<String>("config") {
        Some(p) => PathBuf::from(p),
        None => Settings::default_path().ok_or_else(|| anyhow!("cannot locate home directory"))?,
    };
    Settings::load(&path).with_context(|| format!("failed to load settings from {}", path.display()))
}

fn build_extractor(settings: &Settings) -> GriddedExtractor {
    GriddedExtractor::new(
        CodStore::new(&settings.cod_base_dir),
        MaskReader::new(&settings.mask_base_dir),
        DailyArchiveReader::with_resolution(&settings.gridded_base_dir, &settings.resolution),
    )
}

fn identity_from_args(sub: &ArgMatches) -> DatasetIdentity {
    DatasetIdentity::new(
        sub.get_one::<String>("model").map(String::as_str).unwrap_or(""),
        sub.get_one::<String>("scenario").map(String::as_str).unwrap_or(""),
        sub.get_one::<String>("region-type").map(String::as_str).unwrap_or(""),
        sub.get_one::<String>("season").map(String::as_str).unwrap_or(""),
        sub.get_one::<String>("predictand").map(String::as_str).unwrap_or(""),
    )
}

fn run_cod_path(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<()> {
    let settings = load_settings(matches)?;
    let identity = identity_from_args(sub);
    let store = CodStore::new(&settings.cod_base_dir);
    println!("{}", store.cod_path(&identity).display());
    Ok(())
}

fn run_extract(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<()> {
    let identity = identity_from_args(sub);
    extract_and_write(matches, sub, identity)
}

fn run_extract_from(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<()> {
    let cod_file = sub
        .get_one::<String>("cod-file")
        .map(String::as_str)
        .unwrap_or("");
    let identity = DatasetIdentity::from_cod_path(Path::new(cod_file))
        .ok_or_else(|| anyhow!("cannot derive identity from CoD path '{}'", cod_file))?;
    extract_and_write(matches, sub, identity)
}

fn extract_and_write(
    matches: &ArgMatches,
    sub: &ArgMatches,
    identity: DatasetIdentity,
) -> anyhow::Result<()> {
    let settings = load_settings(matches)?;
    let extractor = build_extractor(&settings);
    let region = sub.get_one::<String>("region").map(String::as_str);
    let output = sub
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("");
    let context = || format!("extraction failed for identity ({})", identity);

    if sub.get_flag("point-list") {
        let grid = extractor.extract(&identity, region).with_context(context)?;
        write_point_list(Path::new(output), &grid, identity.var_code(), Some(&identity))
            .with_context(|| format!("failed to write {}", output))?;
    } else {
        let cube = extractor.extract_cube(&identity, region).with_context(context)?;
        write_full_grid(Path::new(output), &cube, identity.var_code(), Some(&identity))
            .with_context(|| format!("failed to write {}", output))?;
    }

    Ok(())
}

fn run_to_3d(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<()> {
    let settings = load_settings(matches)?;
    let input = sub
        .get_one::<String>("input")
        .map(String::as_str)
        .unwrap_or("");
    let output = sub
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("");

    let identity = DatasetIdentity::from_output_path(Path::new(input))
        .ok_or_else(|| anyhow!("cannot derive identity from path '{}'", input))?;

    let grid = read_point_list(Path::new(input))
        .with_context(|| format!("failed to read {}", input))?;
    let mask = MaskReader::new(&settings.mask_base_dir)
        .read(&identity.region_type)
        .with_context(|| format!("failed to load mask for region '{}'", identity.region_type))?;
    let cube = grid.to_full_grid(&mask.crop())?;

    write_full_grid(Path::new(output), &cube, identity.var_code(), Some(&identity))
        .with_context(|| format!("failed to write {}", output))?;
    Ok(())
}
