use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;
use zotcrawl::handlers::{
    DEFAULT_CONFIG_DIR, DEFAULT_DB_PATH, DEFAULT_DICTIONARY_PATH, DEFAULT_LOG_PATH,
    DEFAULT_STOP_WORDS_PATH,
};
use zotcrawl_core::report::DEFAULT_PARENT_DOMAIN;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("zotcrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("zotcrawl")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Creates the zotcrawl config directory, stop-word list and page database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the zotcrawl config directory")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing stop-word list and page database without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl the in-scope UCI hosts, storing substantial page text and logging \
                every fetch.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Seed URL to crawl (repeatable; default: the four UCI department sites)")
                        .value_parser(clap::value_parser!(Url))
                        .action(clap::ArgAction::Append)
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth from a seed")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"max-pages" <COUNT>)
                        .required(false)
                        .help("Stop fetching after this many pages (default: unlimited)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"min-words" <COUNT>)
                        .required(false)
                        .help("Minimum word count for a page's text to be stored")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("200"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Page database to write")
                        .default_value(DEFAULT_DB_PATH),
                )
                .arg(
                    arg!(--"log" <PATH>)
                        .required(false)
                        .help("Fetch log to append to")
                        .default_value(DEFAULT_LOG_PATH),
                ),
        )
        .subcommand(
            command!("check")
                .about("Print the scope and trap filter verdict for one or more URLs")
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .num_args(1..)
                        .help("URLs to classify"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Summarize a finished crawl: unique pages, longest page, top words, subdomains")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Page database to read")
                        .default_value(DEFAULT_DB_PATH),
                )
                .arg(
                    arg!(--"log" <PATH>)
                        .required(false)
                        .help("Fetch log to read")
                        .default_value(DEFAULT_LOG_PATH),
                )
                .arg(
                    arg!(--"stop-words" <PATH>)
                        .required(false)
                        .help("Newline-delimited stop-word list")
                        .default_value(DEFAULT_STOP_WORDS_PATH),
                )
                .arg(
                    arg!(--"dictionary" <PATH>)
                        .required(false)
                        .help("Newline-delimited English word list")
                        .default_value(DEFAULT_DICTIONARY_PATH),
                )
                .arg(
                    arg!(--"top" <COUNT>)
                        .required(false)
                        .help("Number of most common words to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(--"parent-domain" <DOMAIN>)
                        .required(false)
                        .help("Domain whose subdomains are counted")
                        .default_value(DEFAULT_PARENT_DOMAIN),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
