//! crateforge CLI entry point.

// The panic hook runs when the tracing pipeline may be unusable.
#![allow(clippy::print_stderr)]

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = crateforge::cli::parse();
    std::process::exit(crateforge::run(&cli));
}
