fn main() {
    if let Err(err) = plexus_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
