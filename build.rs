fn main() {
    #[cfg(feature = "hardware")]
    {
        println!("cargo:rustc-link-lib=hackrf");
    }
}
