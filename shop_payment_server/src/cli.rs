use std::{env, env::VarError};

/// The server takes no real command-line arguments. Anything on the command line prints the usage
/// notes and the current (non-secret) environment, then the caller decides whether to bail.
pub fn handle_command_line_args() -> bool {
    if env::args().count() <= 1 {
        return false;
    }
    print_usage();
    print_environment();
    true
}

fn print_usage() {
    println!("\n{}\n", include_str!("./cli-help.txt"));
}

/// Only variables known not to hold secrets. The notification secrets never get printed.
fn print_environment() {
    const SAFE_TO_PRINT: [&str; 5] =
        ["RUST_LOG", "SPG_HOST", "SPG_PORT", "SPG_DATABASE_URL", "SPG_DISABLE_SIGNATURE_CHECK"];
    println!("Environment (secret variables omitted):");
    for name in SAFE_TO_PRINT {
        match env::var(name) {
            Ok(val) => println!("  {name:<30} {val}"),
            Err(VarError::NotPresent) => println!("  {name:<30} (unset)"),
            Err(VarError::NotUnicode(raw)) => println!("  {name:<30} (not unicode: {})", raw.to_string_lossy()),
        }
    }
}
