use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=RAYLEIGH_LIB_DIR");

    if env::var_os("CARGO_FEATURE_LIBRAYLEIGH").is_none() {
        return;
    }

    match env::var_os("RAYLEIGH_LIB_DIR") {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            println!("cargo:rustc-link-search=native={}", dir.display());
        }
        None => println!(
            "cargo:warning=RAYLEIGH_LIB_DIR not set, librayleigh must be on the default linker path"
        ),
    }
}
