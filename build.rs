fn main() {
    // Generates `built.rs` in OUT_DIR, including the git commit hash when available.
    if let Err(err) = built::write_built_file() {
        panic!("Failed to acquire build-time information: {err}");
    }
}
