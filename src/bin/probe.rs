//! probe, the query-injecting half of whippet.

#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(unused)]

#![deny(unsafe_code)]


use std::env;
use std::process::exit;

use log::*;

use whippet::exits;
use whippet::probe::{Options, OptionsResult, Probe, USAGE};


/// Parses the command-line options and hands control to the probe engine.
fn main() {
    match Options::getopts(env::args_os().skip(1)) {
        OptionsResult::Ok(options) => {
            debug!("Running with options -> {:#?}", options);
            exit(Probe::init(options).run());
        }

        OptionsResult::Help => {
            print!("{}", USAGE);
            exit(exits::SUCCESS);
        }

        OptionsResult::InvalidOptionsFormat(oe) => {
            eprintln!("Invalid options: {}", oe);
            print!("{}", USAGE);
            exit(exits::FAILURE);
        }

        OptionsResult::InvalidOptions(why) => {
            eprintln!("{}", why);
            print!("{}", USAGE);
            exit(exits::FAILURE);
        }
    }
}
