//! Renders a file of decompiler JSON tokens as an address-annotated listing.
//!
//! usage: pseudoview <tokens.json> [unit extent] [address to look up]
//!
//! The extent is `begin:end` or `begin:+size`, hexadecimal. Without one, the
//! unit starts at zero and ends after the last addressed token.

use std::path;
use std::process;

use itertools::Itertools;

use pseudoview::config;
use pseudoview::logic::parser;
use pseudoview::logic::parser::TokenParser;
use pseudoview::model::addr;
use pseudoview::model::listing::grid;
use pseudoview::model::listing::position;
use pseudoview::model::unit;

fn setup_tracing(verbose: bool) {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .pretty()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose { tracing::Level::TRACE } else { tracing::Level::WARN })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("pseudoview: {}", message);
    process::exit(1);
}

fn parse_address(arg: &str) -> addr::Address {
    addr::Address::parse(arg, true).unwrap_or_else(|e| fail(format!("bad address {:?}: {:?}", arg, e)))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let path = match args.get(1) {
        Some(path) => path::PathBuf::from(path),
        None => fail("usage: pseudoview <tokens.json> [unit extent] [address to look up]"),
    };

    if let Err(e) = config::load_default() {
        fail(e);
    }
    setup_tracing(config::get().verbose);

    let extent = args.get(2).map(|arg| addr::Extent::parse(arg, true).unwrap_or_else(|e| fail(format!("bad extent {:?}: {:?}", arg, e))));
    let base = extent.map_or(addr::Address::ZERO, |e| e.begin);
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)));

    let stream = parser::JsonTokenParser.parse(&text, base);
    if stream.is_empty() {
        fail(format!("{}: no tokens", path.display()));
    }

    let extent = extent.unwrap_or_else(|| {
        let end = stream.iter()
            .map(|t| t.address)
            .filter(|a| !a.is_null())
            .max()
            .and_then(|a| a.checked_add(1))
            .unwrap_or(base);
        addr::Extent::between(base, end.max(base))
    });

    let grid = grid::TokenGrid::new(unit::Unit {
        id: unit::UnitId(0),
        extent,
        name: path.file_stem().map_or_else(|| "unit".to_string(), |s| s.to_string_lossy().into_owned()),
    }, stream);

    println!("// {}", grid);
    for (row, (line, address)) in grid.to_lines().enumerate() {
        let addresses = grid.addresses_on_row(row).into_iter().map(|a| a.to_string()).join(",");
        println!("{:>18}  {:<40}  // {}", address.to_string(), line, addresses);
    }

    if let Some(arg) = args.get(3) {
        let target = parse_address(arg);
        let found = grid.position_for_address(target);
        println!("{} -> {} {:?}", target, found, grid.line_at(position::Position::row_start(found.row)).text());
    }
}
