// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

mod cli;

fn main() {
    let opts: cli::Opts = argh::from_env();

    let default_filter = if opts.is_verbose() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    if let Err(e) = cli::run(opts) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
