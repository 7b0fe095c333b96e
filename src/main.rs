use clap::{App, Arg, ErrorKind};
use rtao::ast::AstPrinter;
use rtao::config::Config;
use rtao::{parser, scanner, Error};
use std::fs;
use std::process;

fn main() {
    rtao::init_tracing();

    let matches = App::new("rtao")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a tao script")
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("Prints the token stream instead of running"),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .conflicts_with("tokens")
                .help("Prints the parsed program instead of running"),
        )
        .arg(
            Arg::with_name("max-depth")
                .long("max-depth")
                .value_name("N")
                .takes_value(true)
                .help("Maximum call depth"),
        )
        .arg(
            Arg::with_name("entry")
                .long("entry")
                .value_name("NAME")
                .takes_value(true)
                .help("Function called after the top-level statements [default: main]"),
        )
        .arg(Arg::with_name("script").required(true).index(1))
        .get_matches_safe()
        .unwrap_or_else(|err| match err.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => err.exit(),
            _ => usage(&err.message),
        });

    let mut config = Config::default();
    if let Some(depth) = matches.value_of("max-depth") {
        config.max_call_depth = depth
            .parse()
            .unwrap_or_else(|_| usage(&format!("invalid --max-depth `{}'", depth)));
    }
    if let Some(entry) = matches.value_of("entry") {
        config.entry_point = entry.to_string();
    }

    let file = matches.value_of("script").unwrap_or_default();
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read {}: {}", file, err);
            process::exit(66);
        }
    };

    let result = if matches.is_present("tokens") {
        dump_tokens(&source)
    } else if matches.is_present("ast") {
        parser::parse(&source).map(|program| {
            let mut printer = AstPrinter {};
            println!("{}", printer.print_program(&program.statements));
        })
    } else {
        rtao::run(&source, config).map(|_| ())
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(if err.is_syntax() { 65 } else { 70 });
    }
}

fn dump_tokens(source: &str) -> Result<(), Error> {
    for token in scanner::scan_tokens(source)? {
        println!("{:>4}:{:<4} {}", token.line, token.column, token);
    }
    Ok(())
}

fn usage(message: &str) -> ! {
    eprintln!("{}", message);
    eprintln!("Usage: rtao [FLAGS] [OPTIONS] <script>");
    process::exit(64);
}
