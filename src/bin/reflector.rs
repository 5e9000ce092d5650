//! reflector, the stubbed-responder half of whippet.

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
use whippet::reflector::{Options, OptionsResult, Reflector, USAGE};


/// Parses the command-line options and hands control to the serve loop.
fn main() {
    match Options::getopts(env::args_os().skip(1)) {
        OptionsResult::Ok(options) => {
            debug!("Running with options -> {:#?}", options);
            exit(Reflector::init(options).run());
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
