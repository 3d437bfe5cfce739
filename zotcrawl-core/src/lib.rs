use colored::Colorize;

pub mod crawl;
pub mod data;
pub mod error;
pub mod fetchlog;
pub mod lexicon;
pub mod report;

pub use error::{CoreError, Result};

pub fn print_banner() {
    let banner = r#"
                 __                               __
   ____  ____   / /_  _____ _____ ____ _ _      __/ /
  /_  / / __ \ / __/ / ___// ___// __ `/| | /| / / /
   / /_/ /_/ // /_  / /__ / /   / /_/ / | |/ |/ / /
  /___/\____/ \__/  \___//_/    \__,_/  |__/|__/_/
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} {}\n",
        "zotcrawl".bold(),
        format!("v{} - scoped crawler for the UCI ICS web", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
