fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Stamped into the startup log line
    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=BUILD_DATE={build_date}");
}
