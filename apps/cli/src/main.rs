// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SceneBake command line.
//!
//! Replays a recorded host scene (JSON) through the export handler and
//! writes the flattened result as `.glb`, `.gltf` + `.bin`, or both.
//!
//! ```text
//! scenebake model.json                       # model.glb
//! scenebake model.json -o out/model --format both --meters
//! RUST_LOG=scenebake_export=debug scenebake model.json
//! ```

use clap::Parser;
use std::process::ExitCode;

mod error;
mod export;

use export::ExportArgs;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info,scenebake_export=debug,scenebake_core=debug";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_target(false)
        .init();

    let args = ExportArgs::parse();
    match export::run(&args) {
        Ok(written) => {
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Export failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn default_filter_enables_crate_debug() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("scenebake_export=debug"));
        assert!(rendered.contains("scenebake_core=debug"));
    }
}
