// build.rs

fn main() -> anyhow::Result<()> {
    // esp-idf linkage only applies to the device build; host builds (and
    // `cargo test`) need nothing from here.
    if std::env::var("TARGET")?.ends_with("-espidf") {
        embuild::espidf::sysenv::output();
    }
    Ok(())
}
// EOF
