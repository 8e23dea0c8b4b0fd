fn main() {
    if let Err(err) = liftsheet_cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
